use anyhow::{anyhow, Context};
use clap::Parser;
use dabscancore::channels::{Band, DabChannels};
use dabscancore::prelude::ChannelTable;
use dabscancore::telemetry::ProgressLog;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use workflow::config::ScenarioConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Scan a simulated DAB band and report the ensembles found")]
struct Args {
    /// Scenario describing the simulated transmitters (YAML); built-in demo when absent
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Seconds to wait for sync on a channel where a signal was detected
    #[arg(long)]
    sync_timeout: Option<u64>,
    /// Part of the allocation to scan: all, band3 or lband
    #[arg(long, default_value = "all")]
    band: Band,
    /// Comma-separated channel names to restrict the scan to
    #[arg(long, value_delimiter = ',')]
    channels: Vec<String>,
    #[arg(long)]
    settle_ms: Option<u64>,
    #[arg(long)]
    presence_timeout_ms: Option<u64>,
    #[arg(long)]
    grace_period_ms: Option<u64>,
    /// Write the JSON report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Suppress per-channel status lines
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let scenario = if let Some(path) = &args.scenario {
        ScenarioConfig::load(path)?
    } else {
        ScenarioConfig::demo()
    };

    let mut timing = scenario.timing.to_scan_timing();
    if let Some(secs) = args.sync_timeout {
        timing = timing.with_sync_timeout(Duration::from_secs(secs));
    }
    if let Some(ms) = args.settle_ms {
        timing = timing.with_settle(Duration::from_millis(ms));
    }
    if let Some(ms) = args.presence_timeout_ms {
        timing = timing.with_presence_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = args.grace_period_ms {
        timing = timing.with_grace_period(Duration::from_millis(ms));
    }

    let mut table = DabChannels::new(args.band);
    if !args.channels.is_empty() {
        table = table
            .restrict_to(&args.channels)
            .map_err(|name| anyhow!("unknown channel {} for band {:?}", name, args.band))?;
    }
    log::info!(
        "scanning {} channels (sync timeout {:?})",
        table.channel_count(),
        timing.sync_timeout
    );

    let progress = if args.quiet {
        ProgressLog::silent()
    } else {
        ProgressLog::stderr()
    };
    let run = Runner::new(scenario, timing).execute(&table, progress)?;

    eprintln!(
        "Scan complete -> channels {}, ensembles {}, no signal {}, no sync {}",
        run.channels_scanned, run.counts.recorded, run.counts.no_signal, run.counts.no_sync
    );
    log::debug!(
        "input retuned {} times, {} buffer resets",
        run.retunes,
        run.resets
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating report {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            run.write_report(&mut writer)?;
            writer
                .flush()
                .with_context(|| format!("flushing report {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            run.write_report(&mut lock)?;
        }
    }

    Ok(())
}
