//! builtin:logger
//!
//! Types and units: `[ANY, ANY] -> [unchanged, unchanged]`
//!
//! Logs a one-line summary of the pipeline state each iteration. Useful
//! while bringing a pipeline up, and as the canonical harmless sink.

use crate::core::state::PipelineState;
use crate::device::{Built, Capabilities, Device};
use crate::error::{DeviceError, EngineError};
use serde_json::Value;
use tracing::info;

struct Logger;

pub fn init(_params: &Value) -> Result<Built, EngineError> {
    Ok(Built {
        caps: Capabilities::transparent(),
        device: Box::new(Logger),
    })
}

impl Device for Logger {
    fn process(&mut self, state: &mut PipelineState) -> Result<(), DeviceError> {
        info!(
            type_tag = %state.header.type_tag,
            units = %state.header.units,
            y = state.header.log_dim.y,
            x = state.header.log_dim.x,
            elements = state.payload.len(),
            "pipeline state"
        );
        Ok(())
    }
}
