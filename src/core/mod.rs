//! Core domain models
//!
//! The data that flows through the loop: the frame header, the tagged
//! payload, the shared pipeline state, and the configuration that
//! describes the device list.

pub mod config;
pub mod header;
pub mod payload;
pub mod pipeline;
pub mod state;
pub mod tags;

pub use header::{FrameHeader, LogDim, Pitch, Status};
pub use payload::{ByteMatrix, Matrix, Payload};
pub use pipeline::Pipeline;
pub use state::PipelineState;
pub use tags::{PayloadType, Units};
