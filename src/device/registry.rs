//! Device resolution - builtin table plus the plugin loader

use crate::core::config::DeviceConfig;
use crate::device::{plugin, DeviceUri, InitFn, Stage};
use crate::devices;
use crate::error::EngineError;
use tracing::{debug, info};

/// Compiled-in devices, by literal name.
static BUILTINS: &[(&str, InitFn)] = &[
    ("centroid", devices::centroid::init),
    ("clamp", devices::clamp::init),
    ("delay", devices::delay::init),
    ("file_sink", devices::file_sink::init),
    ("logger", devices::logger::init),
    ("stop_after_count", devices::stop_after_count::init),
    ("test_source", devices::test_source::init),
];

/// Resolves scheme-qualified uris to initialized stages.
pub struct Registry;

impl Registry {
    /// Look up a builtin init function by name.
    pub fn builtin(name: &str) -> Option<InitFn> {
        BUILTINS
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, init)| *init)
    }

    /// Names of every compiled-in device, for diagnostics.
    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        BUILTINS.iter().map(|(name, _)| *name)
    }

    /// Resolve and initialize one device. Any failure here aborts
    /// pipeline construction.
    pub fn resolve(config: &DeviceConfig) -> Result<Stage, EngineError> {
        let stage = match DeviceUri::parse(&config.uri)? {
            DeviceUri::Builtin(name) => {
                let init = Self::builtin(&name).ok_or_else(|| {
                    EngineError::DeviceNotFound {
                        uri: config.uri.clone(),
                    }
                })?;
                debug!(uri = %config.uri, "initializing builtin device");
                Stage::new(&config.uri, init(&config.params)?)
            }
            DeviceUri::File(path) => {
                debug!(uri = %config.uri, "loading plugin device");
                let (built, library) = plugin::load(&path, &config.params)?;
                Stage::with_plugin(&config.uri, built, library)
            }
        };
        info!(uri = %config.uri, "initialized device");
        Ok(stage)
    }
}
