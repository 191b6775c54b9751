//! Device abstraction - the contract every pipeline stage implements

pub mod plugin;
pub mod registry;

pub use registry::Registry;

use crate::core::state::PipelineState;
use crate::core::tags::{PayloadType, Units};
use crate::error::{DeviceError, EngineError};
use libloading::Library;
use tracing::trace;

/// One pipeline stage.
///
/// Construction plays the role of `init`: a device that fails to build
/// aborts pipeline construction. The default `process` does nothing every
/// iteration, for devices that only exist for their init/close effects.
pub trait Device: Send {
    /// Called once per iteration when it is the device's turn. Mutates
    /// the shared state in place, typically by replacing the payload,
    /// and must leave the header tags matching the payload on return.
    fn process(&mut self, state: &mut PipelineState) -> Result<(), DeviceError> {
        let _ = state;
        Ok(())
    }

    /// Deterministically release private state. Called exactly once per
    /// successfully initialized device.
    fn close(&mut self) {}
}

/// Declared type/units capabilities of a device.
///
/// Inputs are masks (several acceptable bits may be set); outputs are the
/// single concrete tag the stage produces, or the empty "unchanged"
/// sentinel meaning the field passes through unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub type_in: PayloadType,
    pub units_in: Units,
    pub type_out: PayloadType,
    pub units_out: Units,
}

impl Capabilities {
    /// A fully transparent device: accepts anything, changes nothing.
    pub fn transparent() -> Self {
        Capabilities {
            type_in: PayloadType::ANY,
            units_in: Units::ANY,
            type_out: PayloadType::empty(),
            units_out: Units::empty(),
        }
    }

    /// Whether this device is expected to change the payload's kind.
    /// Drives the scheduler's fatal-vs-recoverable classification: a
    /// failed transform leaves the pipeline carrying a stale payload,
    /// while a failed pass-through stage (a network sink, say) does not.
    pub fn transforms_type(&self) -> bool {
        !self.type_out.is_empty() && self.type_out != self.type_in
    }
}

/// What a device init function hands back on success.
pub struct Built {
    pub caps: Capabilities,
    pub device: Box<dyn Device>,
}

impl std::fmt::Debug for Built {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Built")
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}


/// Signature of every device init function, builtin or plugin.
pub type InitFn = fn(&serde_json::Value) -> Result<Built, EngineError>;

/// A resolved, initialized pipeline stage.
pub struct Stage {
    uri: String,
    caps: Capabilities,
    device: Box<dyn Device>,
    closed: bool,
    // Keeps a dynamically loaded module alive for the device's lifetime.
    _plugin: Option<Library>,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("uri", &self.uri)
            .field("caps", &self.caps)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Stage {
    pub fn new(uri: impl Into<String>, built: Built) -> Self {
        Stage {
            uri: uri.into(),
            caps: built.caps,
            device: built.device,
            closed: false,
            _plugin: None,
        }
    }

    pub fn with_plugin(uri: impl Into<String>, built: Built, library: Library) -> Self {
        Stage {
            _plugin: Some(library),
            ..Stage::new(uri, built)
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn caps(&self) -> Capabilities {
        self.caps
    }

    pub fn process(&mut self, state: &mut PipelineState) -> Result<(), DeviceError> {
        self.device.process(state)
    }

    /// Close the device, at most once.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.device.close();
            trace!(uri = %self.uri, "closed device");
        }
    }
}

/// Scheme-qualified device identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceUri {
    /// `builtin:<name>` - compiled-in device from the registry table.
    Builtin(String),
    /// `file:<path>` - dynamically loaded shared module.
    File(String),
}

impl DeviceUri {
    pub fn parse(uri: &str) -> Result<Self, EngineError> {
        match uri.split_once(':') {
            Some(("builtin", name)) if !name.is_empty() => {
                Ok(DeviceUri::Builtin(name.to_string()))
            }
            Some(("file", path)) if !path.is_empty() => {
                Ok(DeviceUri::File(path.to_string()))
            }
            _ => Err(EngineError::Config(format!(
                "device uri {uri:?} has an unsupported scheme"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_builtin_and_file_uris() {
        assert_eq!(
            DeviceUri::parse("builtin:logger").unwrap(),
            DeviceUri::Builtin("logger".into())
        );
        assert_eq!(
            DeviceUri::parse("file:plugins/foo.so").unwrap(),
            DeviceUri::File("plugins/foo.so".into())
        );
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(DeviceUri::parse("http:whatever").is_err());
        assert!(DeviceUri::parse("no-scheme").is_err());
        assert!(DeviceUri::parse("builtin:").is_err());
    }

    #[test]
    fn transform_classification() {
        let transform = Capabilities {
            type_in: PayloadType::MATRIX,
            units_in: Units::ANY,
            type_out: PayloadType::VECTOR,
            units_out: Units::MINMAX,
        };
        assert!(transform.transforms_type());

        let sink = Capabilities::transparent();
        assert!(!sink.transforms_type());

        // declares an output equal to its sole input: no transition
        let filter = Capabilities {
            type_in: PayloadType::VECTOR,
            units_in: Units::ANY,
            type_out: PayloadType::VECTOR,
            units_out: Units::empty(),
        };
        assert!(!filter.transforms_type());
    }
}
