pub mod fit;
pub mod skeleton;
pub mod window;

pub use fit::{cover_fit, FitRect, FALLBACK_RESOLUTION};
pub use minifb::Key;
pub use window::MinifbRenderer;
