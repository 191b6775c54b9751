//! Engine error taxonomy

use thiserror::Error;

/// Fatal errors raised by pipeline construction, verification, or the loop.
///
/// Only the scheduler and the construction path decide what is fatal;
/// individual devices report failures through [`DeviceError`] and every
/// nonzero return is classified exactly once.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("device {uri} failed to initialize: {reason}")]
    Init { uri: String, reason: String },

    #[error("could not load plugin {uri}: {reason}")]
    PluginLoad { uri: String, reason: String },

    #[error("no such device: {uri}")]
    DeviceNotFound { uri: String },

    #[error(
        "device {uri} with input {field} {required} is incompatible \
         with carried {field} {carried}"
    )]
    TypeIncompatible {
        uri: String,
        field: MaskField,
        required: String,
        carried: String,
    },

    #[error("device {uri} failed while transforming the payload: {source}")]
    ProcessFatal {
        uri: String,
        #[source]
        source: DeviceError,
    },

    #[error("worker thread error: {reason}")]
    Thread { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Which capability mask a verifier violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskField {
    Type,
    Units,
}

impl std::fmt::Display for MaskField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaskField::Type => write!(f, "type"),
            MaskField::Units => write!(f, "units"),
        }
    }
}

/// Nonzero status returned by a device's `process` call.
///
/// The scheduler classifies it as fatal or recoverable depending on
/// whether the device declared a type transition.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("{0}")]
    Process(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DeviceError {
    pub fn msg(text: impl Into<String>) -> Self {
        DeviceError::Process(text.into())
    }
}
