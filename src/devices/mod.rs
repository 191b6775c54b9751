//! Builtin devices
//!
//! Each module exposes an `init` with the [`crate::device::InitFn`]
//! signature and is listed in the registry's builtin table. The numeric
//! bodies are deliberately small; the interesting part is the lifecycle
//! and capability contract each one implements.

pub mod centroid;
pub mod clamp;
pub mod delay;
pub mod file_sink;
pub mod logger;
pub mod stop_after_count;
pub mod test_source;

use crate::error::EngineError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deserialize a device's params object, defaulting everything when the
/// config omitted `params` entirely.
fn parse_params<P: DeserializeOwned + Default>(
    name: &str,
    params: &Value,
) -> Result<P, EngineError> {
    if params.is_null() {
        return Ok(P::default());
    }
    serde_json::from_value(params.clone()).map_err(|e| EngineError::Init {
        uri: format!("builtin:{name}"),
        reason: format!("bad params: {e}"),
    })
}

fn init_error(name: &str, reason: impl Into<String>) -> EngineError {
    EngineError::Init {
        uri: format!("builtin:{name}"),
        reason: reason.into(),
    }
}
