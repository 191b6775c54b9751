//! builtin:stop_after_count
//!
//! Types and units: `[ANY, ANY] -> [unchanged, unchanged]`
//!
//! Sets the done bit after a fixed number of iterations. The usual way
//! to give a test pipeline a finite lifetime.
//!
//! Parameters:
//!   - `count` (integer, required): iterations before the loop stops.

use crate::core::state::PipelineState;
use crate::device::{Built, Capabilities, Device};
use crate::devices::{init_error, parse_params};
use crate::error::{DeviceError, EngineError};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Params {
    count: u64,
}

struct StopAfterCount {
    remaining: u64,
}

pub fn init(params: &Value) -> Result<Built, EngineError> {
    let p: Params = parse_params("stop_after_count", params)?;
    if p.count == 0 {
        return Err(init_error("stop_after_count", "count must be nonzero"));
    }
    Ok(Built {
        caps: Capabilities::transparent(),
        device: Box::new(StopAfterCount { remaining: p.count }),
    })
}

impl Device for StopAfterCount {
    fn process(&mut self, state: &mut PipelineState) -> Result<(), DeviceError> {
        self.remaining -= 1;
        if self.remaining == 0 {
            state.header.set_done();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sets_done_on_nth_iteration() {
        let built = init(&json!({"count": 3})).unwrap();
        let mut device = built.device;
        let mut state = PipelineState::new();

        device.process(&mut state).unwrap();
        device.process(&mut state).unwrap();
        assert!(!state.header.is_done());
        device.process(&mut state).unwrap();
        assert!(state.header.is_done());
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(init(&json!({"count": 0})).is_err());
        assert!(init(&Value::Null).is_err());
    }
}
