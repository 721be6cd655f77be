pub mod history;
pub mod poller;
pub mod sample;

pub use history::{DetectionHistory, HISTORY_CAPACITY};
pub use poller::{PosturePoller, PostureShared};
pub use sample::{Keypoint, PostureSample};
