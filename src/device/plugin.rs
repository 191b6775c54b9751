//! Dynamic device loading - the one unsafe boundary in the crate
//!
//! A `file:<path>` uri names a shared module on disk. The init symbol is
//! derived from the path: strip the directory and extension, append
//! `_init`. So `plugins/grabber.so` resolves `grabber_init`, which must
//! have the [`InitFn`] signature and be built against the same crate
//! version as the host.

use crate::device::{Built, InitFn};
use crate::error::EngineError;
use libloading::{Library, Symbol};
use std::path::Path;

/// Suffix appended to the module's file stem to form the init symbol.
const INIT_SUFFIX: &str = "_init";

/// Derive the init symbol name from the module path. The extension is
/// everything from the first dot, so `grabber.so.1` still maps to
/// `grabber_init`.
pub fn init_symbol(path: &str) -> Result<String, EngineError> {
    let name = Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && !s.starts_with('.'))
        .ok_or_else(|| EngineError::PluginLoad {
            uri: format!("file:{path}"),
            reason: "path has no file name".into(),
        })?;
    let stem = name.split_once('.').map_or(name, |(stem, _)| stem);
    Ok(format!("{stem}{INIT_SUFFIX}"))
}

/// Load the module at `path`, resolve its init symbol, and run it.
///
/// Returns the library alongside the built device; the caller must keep
/// the library alive for as long as the device exists.
pub fn load(path: &str, params: &serde_json::Value) -> Result<(Built, Library), EngineError> {
    let uri = format!("file:{path}");
    let symbol_name = init_symbol(path)?;

    // SAFETY: loading a module runs its initializers, and the resolved
    // symbol is trusted to have the InitFn signature. This is the
    // documented plugin contract; nothing else in the crate touches
    // foreign symbols.
    let library = unsafe { Library::new(path) }.map_err(|e| EngineError::PluginLoad {
        uri: uri.clone(),
        reason: e.to_string(),
    })?;

    let init: InitFn = unsafe {
        let symbol: Symbol<InitFn> =
            library
                .get(symbol_name.as_bytes())
                .map_err(|e| EngineError::PluginLoad {
                    uri: uri.clone(),
                    reason: format!("no symbol {symbol_name}: {e}"),
                })?;
        *symbol
    };

    let built = init(params)?;
    Ok((built, library))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_name_strips_directory_and_extension() {
        assert_eq!(init_symbol("plugins/foo.so").unwrap(), "foo_init");
        assert_eq!(init_symbol("/opt/lib/grabber.so.1").unwrap(), "grabber_init");
        assert_eq!(init_symbol("bare").unwrap(), "bare_init");
    }

    #[test]
    fn missing_module_is_a_plugin_load_error() {
        let err = load("plugins/does_not_exist.so", &serde_json::Value::Null)
            .unwrap_err();
        assert!(matches!(err, EngineError::PluginLoad { .. }));
    }
}
