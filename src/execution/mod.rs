//! Pipeline execution engine

pub mod profiler;
pub mod scheduler;
pub mod verifier;

pub use profiler::{DeviceProfile, Profiler};
pub use scheduler::{LoopOutcome, Scheduler};
pub use verifier::verify;
