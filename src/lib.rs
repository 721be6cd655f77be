pub mod config;
pub mod handoff;
pub mod posture;
pub mod render;
pub mod session;
pub mod snapshot;
pub mod stream;
pub mod telemetry;
