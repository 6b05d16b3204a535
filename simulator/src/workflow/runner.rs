use crate::generator::engine::SimulatedEngineFactory;
use crate::generator::input::SimulatedInput;
use crate::workflow::config::ScenarioConfig;
use anyhow::Context;
use dabscancore::prelude::{ChannelTable, ScanTiming};
use dabscancore::report::ScanReport;
use dabscancore::telemetry::{Counts, ProgressLog};
use dabscancore::{ChannelScanner, ScanResult};
use std::io::Write;

pub struct ScanRun {
    pub results: Vec<ScanResult>,
    pub counts: Counts,
    pub channels_scanned: usize,
    pub retunes: usize,
    pub resets: usize,
}

impl ScanRun {
    pub fn report(&self) -> ScanReport<'_> {
        ScanReport::new(self.channels_scanned, &self.results)
    }

    pub fn write_report(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        self.report().write_to(out).context("writing scan report")
    }
}

#[derive(Clone)]
pub struct Runner {
    scenario: ScenarioConfig,
    timing: ScanTiming,
}

impl Runner {
    pub fn new(scenario: ScenarioConfig, timing: ScanTiming) -> Self {
        Self { scenario, timing }
    }

    pub fn execute(&self, table: &dyn ChannelTable, progress: ProgressLog) -> anyhow::Result<ScanRun> {
        let profiles = self
            .scenario
            .profiles_by_frequency(table)
            .context("placing scenario channels")?;
        let factory = SimulatedEngineFactory::new(profiles);
        let mut input = SimulatedInput::new();

        let mut scanner = ChannelScanner::new(factory, self.timing).with_progress(progress);
        scanner
            .run(&mut input, table)
            .context("scanning channel table")?;
        Ok(ScanRun {
            results: scanner.results().to_vec(),
            counts: scanner.metrics(),
            channels_scanned: scanner.channels_scanned(),
            retunes: input.retunes(),
            resets: input.resets(),
        })
    }
}
