//! builtin:clamp
//!
//! Types and units: `[BLOCK|VECTOR|MATRIX|BYTES|BYTE_MATRIX, ANY] ->
//! [unchanged, unchanged]`
//!
//! Clamps every element of the payload into `[min, max]`, in place.
//! Typically sits right before a mirror driver so commands can never
//! leave the actuator range.
//!
//! Parameters:
//!   - `min` (number): lower bound, default -1.0.
//!   - `max` (number): upper bound, default +1.0.

use crate::core::payload::Payload;
use crate::core::state::PipelineState;
use crate::core::tags::{PayloadType, Units};
use crate::device::{Built, Capabilities, Device};
use crate::devices::{init_error, parse_params};
use crate::error::{DeviceError, EngineError};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Params {
    min: f64,
    max: f64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            min: -1.0,
            max: 1.0,
        }
    }
}

struct Clamp {
    min: f64,
    max: f64,
}

pub fn init(params: &Value) -> Result<Built, EngineError> {
    let p: Params = parse_params("clamp", params)?;
    if p.min > p.max {
        return Err(init_error("clamp", "min must not exceed max"));
    }
    Ok(Built {
        caps: Capabilities {
            type_in: PayloadType::BLOCK
                | PayloadType::VECTOR
                | PayloadType::MATRIX
                | PayloadType::BYTES
                | PayloadType::BYTE_MATRIX,
            units_in: Units::ANY,
            type_out: PayloadType::empty(),
            units_out: Units::empty(),
        },
        device: Box::new(Clamp {
            min: p.min,
            max: p.max,
        }),
    })
}

impl Clamp {
    fn clamp_doubles(&self, values: &mut [f64]) {
        for v in values {
            *v = v.clamp(self.min, self.max);
        }
    }

    fn clamp_bytes(&self, values: &mut [u8]) {
        let min = self.min.clamp(0.0, 255.0) as u8;
        let max = self.max.clamp(0.0, 255.0) as u8;
        for v in values {
            *v = (*v).clamp(min, max);
        }
    }
}

impl Device for Clamp {
    fn process(&mut self, state: &mut PipelineState) -> Result<(), DeviceError> {
        // in-place transform: take the payload, clamp, put it back
        let mut payload = state.take_payload();
        match &mut payload {
            Payload::Block(b) => self.clamp_doubles(b),
            Payload::Vector(v) => self.clamp_doubles(v),
            Payload::Matrix(m) => self.clamp_doubles(m.as_mut_slice()),
            Payload::Bytes(b) => self.clamp_bytes(b),
            Payload::ByteMatrix(m) => self.clamp_bytes(m.as_mut_slice()),
            Payload::Empty => {
                return Err(DeviceError::msg("no payload to clamp"));
            }
        }
        let units = state.header.units;
        state.set_payload(payload, units);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clamps_vector_into_range() {
        let built = init(&json!({"min": -0.5, "max": 0.5})).unwrap();
        let mut device = built.device;

        let mut state = PipelineState::new();
        state.set_payload(Payload::Vector(vec![-2.0, 0.25, 2.0]), Units::RADIANS);
        device.process(&mut state).unwrap();

        match &state.payload {
            Payload::Vector(v) => assert_eq!(v, &vec![-0.5, 0.25, 0.5]),
            other => panic!("unexpected payload: {other:?}"),
        }
        // a pass-through stage leaves units alone
        assert_eq!(state.header.units, Units::RADIANS);
    }

    #[test]
    fn defaults_to_unit_range() {
        let built = init(&Value::Null).unwrap();
        let mut device = built.device;

        let mut state = PipelineState::new();
        state.set_payload(Payload::Block(vec![-3.0, 3.0]), Units::NONE);
        device.process(&mut state).unwrap();
        match &state.payload {
            Payload::Block(b) => assert_eq!(b, &vec![-1.0, 1.0]),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(init(&json!({"min": 1.0, "max": -1.0})).is_err());
    }

    #[test]
    fn empty_payload_is_a_process_error() {
        let built = init(&Value::Null).unwrap();
        let mut device = built.device;
        let mut state = PipelineState::new();
        assert!(device.process(&mut state).is_err());
    }
}
