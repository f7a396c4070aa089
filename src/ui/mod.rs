pub mod progress;
pub mod progress_message;

pub use progress::ProgressManager;
pub use progress_message::{ProgressMessage, ProgressPhase};
