//! loopline - a real-time signal-processing pipeline runtime

pub mod cli;
pub mod core;
pub mod device;
pub mod devices;
pub mod error;
pub mod execution;
pub mod pool;

// Re-export commonly used types
pub use core::{FrameHeader, Payload, Pipeline, PipelineState};
pub use device::{Built, Capabilities, Device, Registry, Stage};
pub use error::{DeviceError, EngineError};
pub use execution::{LoopOutcome, Profiler, Scheduler};
