//! builtin:file_sink
//!
//! Types and units: `[ANY, ANY] -> [unchanged, unchanged]`
//!
//! Appends one record per iteration to a file: the 40-byte frame header
//! followed by the payload bytes in row-major order. The header carries
//! everything a reader needs to interpret the body, so a capture file is
//! just a concatenation of records.
//!
//! Parameters:
//!   - `filename` (string, required): output path, truncated on init.

use crate::core::state::PipelineState;
use crate::device::{Built, Capabilities, Device};
use crate::devices::{init_error, parse_params};
use crate::error::{DeviceError, EngineError};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Params {
    filename: String,
}

struct FileSink {
    writer: Option<BufWriter<File>>,
}

pub fn init(params: &Value) -> Result<Built, EngineError> {
    let p: Params = parse_params("file_sink", params)?;
    if p.filename.is_empty() {
        return Err(init_error("file_sink", "missing filename parameter"));
    }
    let file = File::create(&p.filename)
        .map_err(|e| init_error("file_sink", format!("could not open {}: {e}", p.filename)))?;
    Ok(Built {
        caps: Capabilities::transparent(),
        device: Box::new(FileSink {
            writer: Some(BufWriter::new(file)),
        }),
    })
}

impl Device for FileSink {
    fn process(&mut self, state: &mut PipelineState) -> Result<(), DeviceError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| DeviceError::msg("sink already closed"))?;
        writer.write_all(&state.header.encode())?;
        writer.write_all(&state.payload.contiguous_bytes())?;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::header::{FrameHeader, ENCODED_LEN};
    use crate::core::payload::Payload;
    use crate::core::tags::{PayloadType, Units};
    use serde_json::json;

    #[test]
    fn writes_header_then_payload_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.bin");
        let built = init(&json!({"filename": path.to_str().unwrap()})).unwrap();
        let mut device = built.device;

        let mut state = PipelineState::new();
        state.set_payload(Payload::Vector(vec![1.5, -2.5]), Units::MINMAX);
        device.process(&mut state).unwrap();
        device.close();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), ENCODED_LEN + 16);

        let header = FrameHeader::decode(&bytes).unwrap();
        assert_eq!(header.type_tag, PayloadType::VECTOR);
        assert_eq!(header.units, Units::MINMAX);
        assert_eq!(header.log_dim.y, 2);
        assert_eq!(&bytes[ENCODED_LEN..ENCODED_LEN + 8], &1.5_f64.to_le_bytes());
    }

    #[test]
    fn missing_filename_is_an_init_error() {
        assert!(init(&Value::Null).is_err());
    }
}
