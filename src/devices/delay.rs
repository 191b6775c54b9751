//! builtin:delay
//!
//! Types and units: `[ANY, ANY] -> [unchanged, unchanged]`
//!
//! Sleeps once per iteration, to pace a pipeline that would otherwise
//! spin flat out (a simulation source, say).
//!
//! Parameters:
//!   - `s` (integer): seconds, default 0.
//!   - `ns` (integer): additional nanoseconds, default 0.

use crate::core::state::PipelineState;
use crate::device::{Built, Capabilities, Device};
use crate::devices::parse_params;
use crate::error::{DeviceError, EngineError};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Params {
    s: u64,
    ns: u32,
}

struct Delay {
    duration: Duration,
}

pub fn init(params: &Value) -> Result<Built, EngineError> {
    let p: Params = parse_params("delay", params)?;
    Ok(Built {
        caps: Capabilities::transparent(),
        device: Box::new(Delay {
            duration: Duration::new(p.s, p.ns),
        }),
    })
}

impl Device for Delay {
    fn process(&mut self, _state: &mut PipelineState) -> Result<(), DeviceError> {
        std::thread::sleep(self.duration);
        Ok(())
    }
}
