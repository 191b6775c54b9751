//! Pipeline verifier - static type/units compatibility pass
//!
//! Runs once before the loop starts. The pipeline is modeled as
//! circular: the first device must accept whatever the last device
//! leaves behind, since the loop wraps, as well as the "no data yet"
//! state of the very first iteration.
//!
//! Compatibility is the strict-subset rule, applied uniformly to both
//! masks: every bit the cursor carries must be present in the device's
//! input mask.

use crate::core::tags::{PayloadType, Units};
use crate::device::Stage;
use crate::error::{EngineError, MaskField};
use tracing::trace;

/// Verify type/units compatibility around the circular pipeline.
///
/// Pure and deterministic: re-running on an unchanged stage list always
/// yields the same verdict.
pub fn verify(stages: &[Stage]) -> Result<(), EngineError> {
    let Some(last) = stages.last() else {
        return Err(EngineError::Config("pipeline has no devices".into()));
    };

    // Seed with the wraparound output union "no data yet", so the first
    // device is checked against both the first iteration and every later
    // one.
    let mut type_cursor = last.caps().type_out | PayloadType::NONE;
    let mut units_cursor = last.caps().units_out | Units::NONE;

    for stage in stages {
        let caps = stage.caps();
        trace!(
            uri = stage.uri(),
            carried = %type_cursor,
            accepts = %caps.type_in,
            produces = %caps.type_out,
            "type check"
        );
        trace!(
            uri = stage.uri(),
            carried = %units_cursor,
            accepts = %caps.units_in,
            produces = %caps.units_out,
            "units check"
        );

        if !caps.type_in.contains(type_cursor) {
            return Err(EngineError::TypeIncompatible {
                uri: stage.uri().to_string(),
                field: MaskField::Type,
                required: caps.type_in.to_string(),
                carried: type_cursor.to_string(),
            });
        }
        if !caps.units_in.contains(units_cursor) {
            return Err(EngineError::TypeIncompatible {
                uri: stage.uri().to_string(),
                field: MaskField::Units,
                required: caps.units_in.to_string(),
                carried: units_cursor.to_string(),
            });
        }

        // An empty output is the "unchanged" sentinel: the device is
        // transparent to propagation of that field.
        if !caps.type_out.is_empty() {
            type_cursor = caps.type_out;
        }
        if !caps.units_out.is_empty() {
            units_cursor = caps.units_out;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Built, Capabilities, Device, Stage};

    struct Inert;
    impl Device for Inert {}

    fn stage(uri: &str, caps: Capabilities) -> Stage {
        Stage::new(
            uri,
            Built {
                caps,
                device: Box::new(Inert),
            },
        )
    }

    fn source_matrix() -> Stage {
        stage(
            "builtin:source",
            Capabilities {
                type_in: PayloadType::ANY,
                units_in: Units::ANY,
                type_out: PayloadType::MATRIX,
                units_out: Units::RADIANS,
            },
        )
    }

    #[test]
    fn accepts_compatible_chain() {
        let stages = vec![
            source_matrix(),
            stage(
                "builtin:transform",
                Capabilities {
                    type_in: PayloadType::MATRIX,
                    units_in: Units::ANY,
                    type_out: PayloadType::VECTOR,
                    units_out: Units::MINMAX,
                },
            ),
            stage("builtin:sink", Capabilities::transparent()),
        ];
        assert!(verify(&stages).is_ok());
    }

    #[test]
    fn rejects_type_mismatch() {
        // device 2 requires Vector but device 1 outputs Matrix only
        let stages = vec![
            source_matrix(),
            stage(
                "builtin:wants_vector",
                Capabilities {
                    type_in: PayloadType::VECTOR,
                    units_in: Units::ANY,
                    type_out: PayloadType::empty(),
                    units_out: Units::empty(),
                },
            ),
        ];
        let err = verify(&stages).unwrap_err();
        match err {
            EngineError::TypeIncompatible { uri, field, .. } => {
                assert_eq!(uri, "builtin:wants_vector");
                assert_eq!(field, MaskField::Type);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn first_device_checked_against_wraparound() {
        // first device tolerates NONE but not the MATRIX the last device
        // leaves behind when the loop wraps
        let stages = vec![
            stage(
                "builtin:narrow_head",
                Capabilities {
                    type_in: PayloadType::NONE,
                    units_in: Units::ANY,
                    type_out: PayloadType::empty(),
                    units_out: Units::empty(),
                },
            ),
            source_matrix(),
        ];
        let err = verify(&stages).unwrap_err();
        assert!(matches!(
            err,
            EngineError::TypeIncompatible { field: MaskField::Type, .. }
        ));
    }

    #[test]
    fn unchanged_output_is_transparent() {
        // the filter declares no output, so the sink still sees MATRIX
        let stages = vec![
            source_matrix(),
            stage(
                "builtin:filter",
                Capabilities {
                    type_in: PayloadType::MATRIX,
                    units_in: Units::ANY,
                    type_out: PayloadType::empty(),
                    units_out: Units::empty(),
                },
            ),
            stage(
                "builtin:matrix_sink",
                Capabilities {
                    type_in: PayloadType::MATRIX,
                    units_in: Units::ANY,
                    type_out: PayloadType::empty(),
                    units_out: Units::empty(),
                },
            ),
        ];
        assert!(verify(&stages).is_ok());
    }

    #[test]
    fn units_violation_names_units_field() {
        let stages = vec![
            source_matrix(),
            stage(
                "builtin:wants_minmax",
                Capabilities {
                    type_in: PayloadType::ANY,
                    units_in: Units::MINMAX,
                    type_out: PayloadType::empty(),
                    units_out: Units::empty(),
                },
            ),
        ];
        let err = verify(&stages).unwrap_err();
        assert!(matches!(
            err,
            EngineError::TypeIncompatible { field: MaskField::Units, .. }
        ));
    }

    #[test]
    fn verdict_is_deterministic() {
        let stages = vec![source_matrix(), stage("builtin:sink", Capabilities::transparent())];
        assert!(verify(&stages).is_ok());
        assert!(verify(&stages).is_ok());

        let bad = vec![
            source_matrix(),
            stage(
                "builtin:wants_vector",
                Capabilities {
                    type_in: PayloadType::VECTOR,
                    units_in: Units::ANY,
                    type_out: PayloadType::empty(),
                    units_out: Units::empty(),
                },
            ),
        ];
        assert!(verify(&bad).is_err());
        assert!(verify(&bad).is_err());
    }

    #[test]
    fn empty_pipeline_is_a_config_error() {
        assert!(matches!(verify(&[]), Err(EngineError::Config(_))));
    }
}
