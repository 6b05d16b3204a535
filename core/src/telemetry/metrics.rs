use crate::scanning::ChannelOutcome;

/// Outcome counters for a scan run.
#[derive(Debug, Default)]
pub struct ScanMetrics {
    counts: Counts,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub probed: usize,
    pub no_signal: usize,
    pub no_sync: usize,
    pub recorded: usize,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: ChannelOutcome) {
        self.counts.probed += 1;
        match outcome {
            ChannelOutcome::NoSignal => self.counts.no_signal += 1,
            ChannelOutcome::NoSync => self.counts.no_sync += 1,
            ChannelOutcome::Recorded => self.counts.recorded += 1,
        }
    }

    pub fn reset(&mut self) {
        self.counts = Counts::default();
    }

    pub fn snapshot(&self) -> Counts {
        self.counts
    }
}
