//! builtin:test_source
//!
//! Types and units: `[ANY, ANY] -> [<type>, unchanged]`
//!
//! Synthetic source for exercising a pipeline without hardware. Emits a
//! vector or matrix whose elements all carry the same value: a sine of
//! the iteration count, or a constant.
//!
//! Parameters:
//!   - `type` (string, required): `"vector"` or `"matrix"`.
//!   - `kind` (string, required): `"sine"` or `"constant"`.
//!   - `size1` (integer, required): length, or row count for a matrix.
//!   - `size2` (integer): column count for a matrix.
//!   - `frequency` (number): sine angular step per iteration, default 0.1.
//!   - `value` (number): the constant, default 1.0.

use crate::core::payload::{Matrix, Payload};
use crate::core::state::PipelineState;
use crate::core::tags::{PayloadType, Units};
use crate::device::{Built, Capabilities, Device};
use crate::devices::{init_error, parse_params};
use crate::error::{DeviceError, EngineError};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Params {
    #[serde(rename = "type")]
    type_: String,
    kind: String,
    size1: usize,
    size2: usize,
    frequency: Option<f64>,
    value: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Sine { frequency: f64 },
    Constant { value: f64 },
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Vector(usize),
    Matrix(usize, usize),
}

struct TestSource {
    kind: Kind,
    shape: Shape,
    acc: f64,
}

pub fn init(params: &Value) -> Result<Built, EngineError> {
    let p: Params = parse_params("test_source", params)?;

    let (shape, type_out) = match p.type_.as_str() {
        "vector" if p.size1 > 0 => (Shape::Vector(p.size1), PayloadType::VECTOR),
        "matrix" if p.size1 > 0 && p.size2 > 0 => {
            (Shape::Matrix(p.size1, p.size2), PayloadType::MATRIX)
        }
        "vector" | "matrix" => {
            return Err(init_error("test_source", "size1/size2 must be nonzero"))
        }
        other => {
            return Err(init_error(
                "test_source",
                format!("unrecognized type {other:?}"),
            ))
        }
    };

    // defaults apply only when the key is absent; an explicit zero is a
    // legitimate setting
    let kind = match p.kind.as_str() {
        "sine" => Kind::Sine {
            frequency: p.frequency.unwrap_or(0.1),
        },
        "constant" => Kind::Constant {
            value: p.value.unwrap_or(1.0),
        },
        other => {
            return Err(init_error(
                "test_source",
                format!("unrecognized kind {other:?}"),
            ))
        }
    };

    Ok(Built {
        caps: Capabilities {
            type_in: PayloadType::ANY,
            units_in: Units::ANY,
            type_out,
            units_out: Units::NONE,
        },
        device: Box::new(TestSource {
            kind,
            shape,
            acc: 0.0,
        }),
    })
}

impl Device for TestSource {
    fn process(&mut self, state: &mut PipelineState) -> Result<(), DeviceError> {
        let value = match self.kind {
            Kind::Sine { frequency } => (frequency * self.acc).sin(),
            Kind::Constant { value } => value,
        };
        self.acc += 1.0;

        let payload = match self.shape {
            Shape::Vector(n) => Payload::Vector(vec![value; n]),
            Shape::Matrix(rows, cols) => {
                Payload::Matrix(Matrix::new(rows, cols, vec![value; rows * cols]))
            }
        };
        state.set_payload(payload, Units::NONE);
        Ok(())
    }
}
