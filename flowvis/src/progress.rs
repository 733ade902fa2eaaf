//! # Progress reporting

use log::info;
use std::fmt;

/// Pipeline stage a progress value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Colourising frame pairs, and in streaming mode writing them as well.
    Processing,
    /// Writing buffered frames to the output.
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Processing => f.write_str("Processing"),
            Self::Writing => f.write_str("Writing"),
        }
    }
}

/// Receives progress updates from the pipeline.
///
/// Percentages are in `[0, 100]` and never decrease within a stage.
pub trait ProgressObserver {
    fn on_progress(&mut self, stage: Stage, percent: f32);
}

impl<F: FnMut(Stage, f32)> ProgressObserver for F {
    fn on_progress(&mut self, stage: Stage, percent: f32) {
        self(stage, percent)
    }
}

/// Discards all progress updates.
#[derive(Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _: Stage, _: f32) {}
}

/// Logs progress whenever it crosses a whole percent.
#[derive(Default)]
pub struct LogProgress {
    last: Option<(Stage, u32)>,
}

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, stage: Stage, percent: f32) {
        let whole = percent as u32;
        if self.last != Some((stage, whole)) {
            self.last = Some((stage, whole));
            info!("{stage}: {percent:.2}%");
        }
    }
}

/// Turns a running frame count into a bounded, monotonic percentage.
///
/// The total is only a hint. An absent or zero total reports 0 until the stage finishes, and
/// totals that turn out too small are clamped at 100.
#[derive(Clone, Debug)]
pub struct ProgressTracker {
    total: Option<u64>,
    last: f32,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|&t| t > 0),
            last: 0.0,
        }
    }

    /// Record `done` units of work and return the new percentage.
    pub fn update(&mut self, done: u64) -> f32 {
        if let Some(total) = self.total {
            let percent = (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0) as f32;
            self.last = self.last.max(percent);
        }
        self.last
    }

    /// Mark the stage complete.
    pub fn finish(&mut self) -> f32 {
        self.last = 100.0;
        self.last
    }
}
