use dabscancore::prelude::{CoreResult, InputDevice, ScanError};
use std::ops::RangeInclusive;

/// Tuning range of a typical RTL2832U/R820T front end.
pub const DEFAULT_TUNING_RANGE: RangeInclusive<u32> = 24_000_000..=1_766_000_000;

/// Front end that only remembers where it is tuned.
#[derive(Debug, Clone)]
pub struct SimulatedInput {
    frequency: u32,
    range: RangeInclusive<u32>,
    retunes: usize,
    resets: usize,
}

impl SimulatedInput {
    pub fn new() -> Self {
        Self::with_range(DEFAULT_TUNING_RANGE)
    }

    pub fn with_range(range: RangeInclusive<u32>) -> Self {
        Self {
            frequency: 0,
            range,
            retunes: 0,
            resets: 0,
        }
    }

    pub fn retunes(&self) -> usize {
        self.retunes
    }

    pub fn resets(&self) -> usize {
        self.resets
    }
}

impl Default for SimulatedInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDevice for SimulatedInput {
    fn set_frequency(&mut self, frequency_hz: u32) -> CoreResult<()> {
        if !self.range.contains(&frequency_hz) {
            return Err(ScanError::Input(format!(
                "{} Hz outside tuner range {}..={} Hz",
                frequency_hz,
                self.range.start(),
                self.range.end()
            )));
        }
        self.frequency = frequency_hz;
        self.retunes += 1;
        Ok(())
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn frequency(&self) -> u32 {
        self.frequency
    }
}
