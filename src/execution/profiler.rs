//! Per-device timing around the scheduler's process calls

use std::time::Instant;
use tracing::info;

/// Aggregated timing for one device, in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct DeviceProfile {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub sample_count: u64,
}

impl DeviceProfile {
    fn new() -> Self {
        DeviceProfile {
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            sample_count: 0,
        }
    }

    fn record(&mut self, sample_ms: f64) {
        self.sample_count += 1;
        // first sample seeds the extrema, so an unsampled profile reads
        // as all zeros rather than a sentinel
        if self.sample_count == 1 || sample_ms < self.min {
            self.min = sample_ms;
        }
        if sample_ms > self.max {
            self.max = sample_ms;
        }
        // incremental online mean
        self.mean += (sample_ms - self.mean) / self.sample_count as f64;
    }
}

/// Wall-clock wrapper for each device invocation.
///
/// Wraps the scheduler's per-device calls without altering its control
/// flow; when profiling is off the scheduler skips these calls behind a
/// single branch.
pub struct Profiler {
    profiles: Vec<DeviceProfile>,
    started: Option<(usize, Instant)>,
}

impl Profiler {
    pub fn new(device_count: usize) -> Self {
        Profiler {
            profiles: vec![DeviceProfile::new(); device_count],
            started: None,
        }
    }

    pub fn begin(&mut self, device_idx: usize) {
        self.started = Some((device_idx, Instant::now()));
    }

    pub fn end(&mut self, device_idx: usize) {
        let Some((begun_idx, start)) = self.started.take() else {
            return;
        };
        debug_assert_eq!(begun_idx, device_idx);
        let sample_ms = start.elapsed().as_secs_f64() * 1e3;
        self.profiles[device_idx].record(sample_ms);
    }

    pub fn profiles(&self) -> &[DeviceProfile] {
        &self.profiles
    }

    /// Log one row per device at shutdown.
    pub fn summary<'a>(&self, uris: impl Iterator<Item = &'a str>) {
        let uris: Vec<&str> = uris.collect();
        let width = uris.iter().map(|u| u.len()).max().unwrap_or(0) + 1;

        info!(
            "{:>width$} | {:>11} | {:>11} | {:>11}",
            "uri", "mean", "min", "max",
        );
        for (uri, profile) in uris.iter().zip(&self.profiles) {
            info!(
                "{:<width$} | {:>8.4} ms | {:>8.4} ms | {:>8.4} ms",
                uri, profile.mean, profile.min, profile.max,
            );
        }
    }
}
