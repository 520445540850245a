/// Phases of a conversion or reconciliation run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Preparing,
    CreatingStyles,
    DetectingComponents,
    CreatingNodes,
    Diffing,
    ApplyingDiff,
    Finalizing,
}

impl Phase {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Phase::Preparing => "preparing",
            Phase::CreatingStyles => "creating-styles",
            Phase::DetectingComponents => "detecting-components",
            Phase::CreatingNodes => "creating-nodes",
            Phase::Diffing => "diffing",
            Phase::ApplyingDiff => "applying-diff",
            Phase::Finalizing => "finalizing",
        }
    }
}

/// Monotonic progress reporter
///
/// Wraps a host callback taking a non-decreasing fraction in `0.0..=1.0` and
/// a human-readable phase label. The fraction is clamped against the last
/// reported value so jitter in per-phase accounting can never move the bar
/// backwards.
pub struct ProgressReporter {
    callback: Option<Box<dyn FnMut(f64, &str) + Send>>,
    last_fraction: f64,
    phase: Phase,
}

impl ProgressReporter {
    /// Reporter that discards all updates
    #[must_use]
    pub fn silent() -> Self {
        Self {
            callback: None,
            last_fraction: 0.0,
            phase: Phase::Preparing,
        }
    }

    /// Reporter forwarding to a host callback
    pub fn new(callback: impl FnMut(f64, &str) + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            last_fraction: 0.0,
            phase: Phase::Preparing,
        }
    }

    /// Enter a phase; re-emits the current fraction under the new label
    pub fn phase(&mut self, phase: Phase) {
        self.phase = phase;
        let fraction = self.last_fraction;
        self.emit(fraction);
    }

    /// Report node progress against a precomputed total
    pub fn nodes(&mut self, processed: usize, total: usize) {
        let fraction = if total == 0 {
            1.0
        } else {
            processed as f64 / total as f64
        };
        self.emit(fraction);
    }

    /// Report completion
    pub fn finish(&mut self) {
        self.phase = Phase::Finalizing;
        self.emit(1.0);
    }

    fn emit(&mut self, fraction: f64) {
        let clamped = fraction.clamp(self.last_fraction, 1.0);
        self.last_fraction = clamped;
        if let Some(callback) = self.callback.as_mut() {
            callback(clamped, self.phase.label());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn fractions_never_decrease() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut progress = ProgressReporter::new(move |fraction, _| {
            sink.lock().unwrap().push(fraction);
        });

        progress.nodes(5, 10);
        progress.nodes(3, 10); // late, lower report
        progress.nodes(8, 10);
        progress.finish();

        let seen = seen.lock().unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
        assert_eq!(*seen.last().unwrap(), 1.0);
    }

    #[test]
    fn phase_changes_reuse_current_fraction() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut progress = ProgressReporter::new(move |fraction, label: &str| {
            sink.lock().unwrap().push((fraction, label.to_string()));
        });

        progress.nodes(1, 2);
        progress.phase(Phase::Diffing);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.last().unwrap(), &(0.5, "diffing".to_string()));
    }

    #[test]
    fn empty_tree_reports_complete() {
        let mut progress = ProgressReporter::silent();
        progress.nodes(0, 0);
        assert_eq!(progress.last_fraction, 1.0);
    }
}
