//! Pipeline construction and teardown

use crate::core::config::PipelineConfig;
use crate::device::{Registry, Stage};
use crate::error::EngineError;
use tracing::error;

/// The ordered, logically circular device list.
///
/// Shape is fixed once construction succeeds; devices may still mutate
/// their own private state every iteration.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Resolve and initialize every device in order.
    ///
    /// On failure, the devices initialized so far are closed in forward
    /// order before the error propagates; devices never constructed are
    /// never closed.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let mut stages: Vec<Stage> = Vec::with_capacity(config.pipeline.len());
        for device_config in &config.pipeline {
            match Registry::resolve(device_config) {
                Ok(stage) => stages.push(stage),
                Err(e) => {
                    error!(uri = %device_config.uri, "could not initialize device");
                    for stage in &mut stages {
                        stage.close();
                    }
                    return Err(e);
                }
            }
        }
        Ok(Pipeline { stages })
    }

    /// Build a pipeline from already-constructed stages. Test seam and
    /// entry point for embedders that assemble devices programmatically.
    pub fn from_stages(stages: Vec<Stage>) -> Self {
        Pipeline { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut [Stage] {
        &mut self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Close every device in forward order. Each device is closed at
    /// most once, so this is safe to call again during teardown paths
    /// that overlap.
    pub fn close_all(&mut self) {
        for stage in &mut self.stages {
            stage.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DeviceConfig;
    use serde_json::json;

    #[test]
    fn builds_devices_in_order() {
        let config = PipelineConfig {
            pipeline: vec![
                DeviceConfig {
                    uri: "builtin:test_source".into(),
                    params: json!({"type": "vector", "kind": "sine", "size1": 4}),
                },
                DeviceConfig {
                    uri: "builtin:stop_after_count".into(),
                    params: json!({"count": 1}),
                },
            ],
        };
        let pipeline = Pipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.stages()[0].uri(), "builtin:test_source");
    }

    #[test]
    fn init_failure_aborts_construction() {
        let config = PipelineConfig {
            pipeline: vec![
                DeviceConfig {
                    uri: "builtin:logger".into(),
                    params: serde_json::Value::Null,
                },
                DeviceConfig {
                    uri: "builtin:no_such_device".into(),
                    params: serde_json::Value::Null,
                },
            ],
        };
        let err = Pipeline::from_config(&config).unwrap_err();
        assert!(matches!(err, EngineError::DeviceNotFound { .. }));
    }
}
