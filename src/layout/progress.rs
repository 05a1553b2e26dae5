//! Iteration rate tracking for continuous runs.

use crate::types::ProgressReport;
use std::time::Instant;

/// Converts Progress messages into iterations-per-second.
///
/// Each report covers exactly `report_interval` steps, so the rate is the
/// interval divided by the time since the previous report (or since the
/// Start, for the first report of a run).
#[derive(Debug, Clone)]
pub struct ProgressMeter {
    report_interval: u32,
    last: Option<Instant>,
}

impl ProgressMeter {
    pub fn new(report_interval: u32) -> Self {
        Self {
            report_interval,
            last: None,
        }
    }

    /// Mark the beginning of a run.
    pub fn reset(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// Record a report received at `now`.
    ///
    /// A zero elapsed time, or a report with no preceding reset, yields a
    /// speed of 0.
    pub fn record(&mut self, iteration_count: u64, now: Instant) -> ProgressReport {
        let speed = match self.last {
            Some(last) => {
                let secs = now.saturating_duration_since(last).as_secs_f64();
                if secs > 0.0 {
                    self.report_interval as f64 / secs
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        self.last = Some(now);

        ProgressReport {
            iteration_count,
            speed,
        }
    }
}
