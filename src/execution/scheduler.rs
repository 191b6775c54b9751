//! Main loop - single-threaded cooperative scheduling of device calls

use crate::core::pipeline::Pipeline;
use crate::core::state::PipelineState;
use crate::error::EngineError;
use crate::execution::profiler::Profiler;
use crate::execution::verifier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, trace, warn};

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Some device set the done bit.
    Done { iterations: u64 },
    /// External cancellation was observed at an iteration or device
    /// boundary.
    Cancelled { iterations: u64 },
}

impl LoopOutcome {
    pub fn iterations(&self) -> u64 {
        match self {
            LoopOutcome::Done { iterations } | LoopOutcome::Cancelled { iterations } => {
                *iterations
            }
        }
    }
}

/// Drives one `process` call per device per iteration over the shared
/// state, until the done bit or cancellation fires.
///
/// Exactly one thread runs this loop; devices execute strictly
/// sequentially within an iteration, and a device call always runs to
/// completion once started. Cancellation is checked only at iteration
/// and per-device boundaries.
pub struct Scheduler {
    pipeline: Pipeline,
    cancel: Arc<AtomicBool>,
    profiler: Option<Profiler>,
    max_iterations: Option<u64>,
}

impl Scheduler {
    pub fn new(pipeline: Pipeline, cancel: Arc<AtomicBool>) -> Self {
        Scheduler {
            pipeline,
            cancel,
            profiler: None,
            max_iterations: None,
        }
    }

    /// Wrap every device call with wall-clock timing. Costs one branch
    /// per device call when not enabled.
    pub fn with_profiler(mut self) -> Self {
        self.profiler = Some(Profiler::new(self.pipeline.len()));
        self
    }

    /// Stop after at most `limit` full iterations, as if done had been
    /// set. Mostly useful for validation runs.
    pub fn with_max_iterations(mut self, limit: u64) -> Self {
        self.max_iterations = Some(limit);
        self
    }

    pub fn profiler(&self) -> Option<&Profiler> {
        self.profiler.as_ref()
    }

    /// Verify the pipeline, then run it to completion.
    ///
    /// A nonzero device status is fatal when the device declared a type
    /// transition (the payload can no longer be trusted downstream) and
    /// recoverable otherwise; recoverable failures are logged and the
    /// loop continues. On any exit path every initialized device is
    /// closed in forward order, exactly once.
    pub fn run(&mut self, state: &mut PipelineState) -> Result<LoopOutcome, EngineError> {
        if let Err(e) = verifier::verify(self.pipeline.stages()) {
            self.pipeline.close_all();
            return Err(e);
        }

        let mut iterations: u64 = 0;
        let outcome = 'outer: loop {
            if state.header.is_done() {
                info!("done bit set; cleaning up");
                break LoopOutcome::Done { iterations };
            }
            if self.cancelled() {
                break LoopOutcome::Cancelled { iterations };
            }
            if let Some(limit) = self.max_iterations {
                if iterations >= limit {
                    info!(limit, "iteration limit reached");
                    break LoopOutcome::Done { iterations };
                }
            }

            for idx in 0..self.pipeline.len() {
                if self.cancelled() {
                    break 'outer LoopOutcome::Cancelled { iterations };
                }

                if let Some(p) = self.profiler.as_mut() {
                    p.begin(idx);
                }
                let result = self.pipeline.stages_mut()[idx].process(state);
                if let Some(p) = self.profiler.as_mut() {
                    p.end(idx);
                }

                let stage = &self.pipeline.stages()[idx];
                match result {
                    Ok(()) => trace!(uri = stage.uri(), "processed"),
                    Err(e) if stage.caps().transforms_type() => {
                        error!(uri = stage.uri(), error = %e, "transform failed; stopping loop");
                        let uri = stage.uri().to_string();
                        self.pipeline.close_all();
                        return Err(EngineError::ProcessFatal { uri, source: e });
                    }
                    Err(e) => {
                        warn!(uri = stage.uri(), error = %e, "device failed; continuing");
                    }
                }
            }
            iterations += 1;
        };

        if let LoopOutcome::Cancelled { .. } = outcome {
            info!("cancellation observed; cleaning up");
        }
        self.pipeline.close_all();
        if let Some(profiler) = &self.profiler {
            profiler.summary(self.pipeline.stages().iter().map(|s| s.uri()));
        }
        Ok(outcome)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}
