//! Pipeline configuration from JSON

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Top-level configuration: the ordered device list.
///
/// Shape is immutable after construction; devices may still mutate their
/// own private state during the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Devices in pipeline order.
    pub pipeline: Vec<DeviceConfig>,
}

/// One device entry as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Scheme-qualified device identity, e.g. `builtin:test_source` or
    /// `file:plugins/grabber.so`.
    pub uri: String,

    /// Opaque stage-specific parameters, handed to the device's init
    /// function untouched.
    #[serde(default)]
    pub params: Value,
}

impl PipelineConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let config: PipelineConfig = serde_json::from_str(text)
            .map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Reject malformed device lists before any device is touched.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.pipeline.is_empty() {
            return Err(EngineError::Config("pipeline has no devices".into()));
        }
        for (idx, device) in self.pipeline.iter().enumerate() {
            if device.uri.is_empty() {
                return Err(EngineError::Config(format!(
                    "device {idx} has no uri"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_devices_in_order() {
        let json = r#"{
            "pipeline": [
                {"uri": "builtin:test_source",
                 "params": {"type": "vector", "kind": "sine", "size1": 8}},
                {"uri": "builtin:logger"}
            ]
        }"#;

        let config = PipelineConfig::from_json(json).unwrap();
        assert_eq!(config.pipeline.len(), 2);
        assert_eq!(config.pipeline[0].uri, "builtin:test_source");
        assert_eq!(config.pipeline[0].params["size1"], 8);
        // params defaults to null when absent
        assert!(config.pipeline[1].params.is_null());
    }

    #[test]
    fn rejects_empty_pipeline() {
        let err = PipelineConfig::from_json(r#"{"pipeline": []}"#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn rejects_missing_uri() {
        let err =
            PipelineConfig::from_json(r#"{"pipeline": [{"uri": ""}]}"#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
