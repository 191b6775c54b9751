//! Pipeline state - the single mutable object threaded through every iteration

use crate::core::header::FrameHeader;
use crate::core::payload::Payload;
use crate::core::tags::Units;

/// State of the system.
///
/// Written to and read from by devices in pipeline order; only the
/// scheduler thread ever touches it, so it needs no locking.
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Header: loop status plus a description of the current payload.
    pub header: FrameHeader,

    /// The data currently in the pipeline.
    pub payload: Payload,
}

impl PipelineState {
    /// Fresh state: valid header, no data yet.
    pub fn new() -> Self {
        PipelineState {
            header: FrameHeader::new(),
            payload: Payload::Empty,
        }
    }

    /// Replace the payload, keeping the header tags and logical
    /// dimensions consistent with it. Pitch is left to the producing
    /// device, which is the only thing that knows the physical geometry.
    pub fn set_payload(&mut self, payload: Payload, units: Units) {
        self.header.type_tag = payload.type_tag();
        self.header.units = units;
        self.header.log_dim = payload.log_dim();
        self.payload = payload;
    }

    /// Take the payload out, leaving `Empty` behind. Used by devices that
    /// transform in place via their own scratch buffer.
    pub fn take_payload(&mut self) -> Payload {
        std::mem::replace(&mut self.payload, Payload::Empty)
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
