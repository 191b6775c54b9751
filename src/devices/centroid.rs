//! builtin:centroid
//!
//! Types and units: `[BYTE_MATRIX, ANY] -> [VECTOR, MINMAX]`
//!
//! Splits an image into fixed-size regions and computes each region's
//! center of mass, scaled to [-1, +1] per axis. With one region this
//! recenters a beam on a camera; with many regions it turns a
//! wavefront-sensor frame into a vector of error signals.
//!
//! The device owns a task queue and worker pool for its whole lifetime:
//! one task per region is dispatched every iteration and the batch is
//! awaited before the result vector is published. Output is interleaved
//! `[y1, x1, y2, x2, ...]`, regions in row-major order.
//!
//! Parameters:
//!   - `region_height` (integer, required): rows per region.
//!   - `region_width` (integer, required): columns per region.
//!   - `thread_count` (integer): workers, default 1.

use crate::core::payload::{ByteMatrix, Payload};
use crate::core::state::PipelineState;
use crate::core::tags::{PayloadType, Units};
use crate::device::{Built, Capabilities, Device};
use crate::devices::{init_error, parse_params};
use crate::error::{DeviceError, EngineError};
use crate::pool::{TaskQueue, WorkerPool};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Params {
    region_height: usize,
    region_width: usize,
    thread_count: usize,
}

struct Centroid {
    region_height: usize,
    region_width: usize,
    queue: Arc<TaskQueue>,
    pool: Option<WorkerPool>,
    // per-iteration scratch, resized only when the frame shape grows
    frame: Arc<ByteMatrix>,
    slots: Arc<Vec<AtomicU64>>,
}

pub fn init(params: &Value) -> Result<Built, EngineError> {
    let p: Params = parse_params("centroid", params)?;
    if p.region_height == 0 || p.region_width == 0 {
        return Err(init_error(
            "centroid",
            "region_height and region_width must be nonzero",
        ));
    }
    let thread_count = if p.thread_count == 0 {
        1
    } else {
        p.thread_count
    };

    let queue = Arc::new(TaskQueue::new());
    let pool = WorkerPool::spawn(thread_count, Arc::clone(&queue))?;
    info!(thread_count, "started centroid workers");

    Ok(Built {
        caps: Capabilities {
            type_in: PayloadType::BYTE_MATRIX,
            units_in: Units::ANY,
            type_out: PayloadType::VECTOR,
            units_out: Units::MINMAX,
        },
        device: Box::new(Centroid {
            region_height: p.region_height,
            region_width: p.region_width,
            queue,
            pool: Some(pool),
            frame: Arc::new(ByteMatrix::zeros(0, 0)),
            slots: Arc::new(Vec::new()),
        }),
    })
}

/// Center of mass of one region, scaled so 0 means centered and the
/// edges map to -1 and +1. An all-dark region reports its center.
fn region_center_of_mass(
    frame: &ByteMatrix,
    top: usize,
    left: usize,
    height: usize,
    width: usize,
) -> (f64, f64) {
    let mut y = 0.0;
    let mut x = 0.0;
    let mut sum = 0.0;
    for i in 0..height {
        for j in 0..width {
            let el = frame.get(top + i, left + j) as f64;
            y += i as f64 * el;
            x += j as f64 * el;
            sum += el;
        }
    }
    if sum == 0.0 {
        return (0.0, 0.0);
    }
    (
        -1.0 + 2.0 * y / (sum * (height - 1).max(1) as f64),
        -1.0 + 2.0 * x / (sum * (width - 1).max(1) as f64),
    )
}

impl Centroid {
    /// Copy the incoming frame into the shared scratch, reallocating
    /// only when the shape changes.
    fn stage_frame(&mut self, input: &ByteMatrix) {
        match Arc::get_mut(&mut self.frame) {
            Some(frame) if frame.rows() == input.rows() && frame.cols() == input.cols() => {
                frame.as_mut_slice().copy_from_slice(input.as_slice());
            }
            _ => {
                self.frame = Arc::new(input.clone());
            }
        }
    }

    fn ensure_slots(&mut self, count: usize) {
        if self.slots.len() < count {
            self.slots = Arc::new((0..count).map(|_| AtomicU64::new(0)).collect());
        }
    }
}

impl Device for Centroid {
    fn process(&mut self, state: &mut PipelineState) -> Result<(), DeviceError> {
        let Payload::ByteMatrix(input) = &state.payload else {
            return Err(DeviceError::msg("expected a byte matrix payload"));
        };

        let region_count_y = input.rows() / self.region_height;
        let region_count_x = input.cols() / self.region_width;
        let region_count = region_count_y * region_count_x;
        if region_count == 0 {
            return Err(DeviceError::msg("frame smaller than one region"));
        }

        self.stage_frame(input);
        self.ensure_slots(2 * region_count);

        // one task per region; each writes its own pair of slots
        let (height, width) = (self.region_height, self.region_width);
        let mut region = 0;
        for i in 0..region_count_y {
            for j in 0..region_count_x {
                let frame = Arc::clone(&self.frame);
                let slots = Arc::clone(&self.slots);
                let (top, left) = (i * height, j * width);
                let slot = 2 * region;
                self.queue.enqueue(move || {
                    let (y, x) = region_center_of_mass(&frame, top, left, height, width);
                    slots[slot].store(y.to_bits(), Ordering::Release);
                    slots[slot + 1].store(x.to_bits(), Ordering::Release);
                });
                region += 1;
            }
        }
        self.queue.wait_idle();

        let com: Vec<f64> = self.slots[..2 * region_count]
            .iter()
            .map(|slot| f64::from_bits(slot.load(Ordering::Acquire)))
            .collect();
        state.set_payload(Payload::Vector(com), Units::MINMAX);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut pool) = self.pool.take() {
            if let Err(e) = pool.shutdown() {
                warn!(error = %e, "centroid worker shutdown failed");
            }
        }
    }
}
