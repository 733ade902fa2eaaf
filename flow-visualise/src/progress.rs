//! Console progress bar.

use flowvis::prelude::v1::{ProgressObserver, Stage};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg:>10} [{elapsed_precise}] [{bar:50.cyan/blue}] {pos:>3}% ({eta})";

/// Draws one progress bar per pipeline stage on stderr.
///
/// The bar of a stage is finished when the next stage starts, or when the observer is dropped.
#[derive(Default)]
pub struct ConsoleProgress {
    hidden: bool,
    bar: Option<(Stage, ProgressBar)>,
}

impl ConsoleProgress {
    /// Observer that tracks progress without drawing anything.
    #[cfg(test)]
    fn hidden() -> Self {
        Self {
            hidden: true,
            bar: None,
        }
    }

    fn new_bar(&self, stage: Stage) -> ProgressBar {
        let bar = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(100)
        };

        bar.set_length(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##>-"),
        );
        bar.set_message(stage.to_string());

        bar
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&mut self, stage: Stage, percent: f32) {
        match &self.bar {
            Some((current, _)) if *current == stage => {}
            _ => {
                if let Some((_, bar)) = self.bar.take() {
                    bar.finish();
                }
                self.bar = Some((stage, self.new_bar(stage)));
            }
        }

        if let Some((_, bar)) = &self.bar {
            bar.set_position(percent.clamp(0.0, 100.0) as u64);
        }
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        if let Some((_, bar)) = self.bar.take() {
            bar.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current(progress: &ConsoleProgress) -> &ProgressBar {
        &progress.bar.as_ref().unwrap().1
    }

    #[test]
    fn tracks_whole_percent() {
        let mut progress = ConsoleProgress::hidden();
        progress.on_progress(Stage::Processing, 42.5);
        assert_eq!(current(&progress).position(), 42);
        assert_eq!(current(&progress).length(), Some(100));

        progress.on_progress(Stage::Processing, 150.0);
        assert_eq!(current(&progress).position(), 100);
    }

    #[test]
    fn new_stage_finishes_previous_bar() {
        let mut progress = ConsoleProgress::hidden();
        progress.on_progress(Stage::Processing, 100.0);
        let processing = current(&progress).clone();

        progress.on_progress(Stage::Writing, 10.0);
        assert!(processing.is_finished());
        assert!(!current(&progress).is_finished());
        assert_eq!(current(&progress).position(), 10);
        assert_eq!(current(&progress).message(), "Writing");
    }
}
