pub mod client;
pub mod mjpeg;

pub use client::{StreamClient, StreamHealth, StreamShared, VideoFrame};
pub use mjpeg::MjpegFrameCodec;
