use std::io::Write;
use std::sync::Arc;
use std::thread;

use log::debug;

use crate::interface::{trim_label, RadioEvents, ScanResult, ServiceInfo};
use crate::prelude::{
    ChannelTable, CoreResult, DecoderEngine, EngineFactory, InputDevice, ScanError, ScanTiming,
};
use crate::report::ScanReport;
use crate::scanning::monitor::ScanMonitor;
use crate::scanning::session::EngineSession;
use crate::telemetry::{Counts, ProgressLog, ScanMetrics};

/// Terminal state of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// Presence deadline passed in scan mode.
    NoSignal,
    /// Presence seen, but the full-mode engine never synced.
    NoSync,
    /// Synced; a [`ScanResult`] was appended.
    Recorded,
}

/// Walks a channel table, probing each channel once and keeping a result for
/// every channel that reached sync.
pub struct ChannelScanner<F: EngineFactory> {
    factory: F,
    timing: ScanTiming,
    monitor: Arc<ScanMonitor>,
    progress: ProgressLog,
    metrics: ScanMetrics,
    results: Vec<ScanResult>,
    channels_scanned: usize,
}

impl<F: EngineFactory> ChannelScanner<F> {
    pub fn new(factory: F, timing: ScanTiming) -> Self {
        Self {
            factory,
            timing,
            monitor: Arc::new(ScanMonitor::new()),
            progress: ProgressLog::default(),
            metrics: ScanMetrics::new(),
            results: Vec::new(),
            channels_scanned: 0,
        }
    }

    pub fn with_progress(mut self, progress: ProgressLog) -> Self {
        self.progress = progress;
        self
    }

    pub fn timing(&self) -> ScanTiming {
        self.timing
    }

    /// Results in scan order.
    pub fn results(&self) -> &[ScanResult] {
        &self.results
    }

    pub fn metrics(&self) -> Counts {
        self.metrics.snapshot()
    }

    /// Number of channels in the table passed to the last [`run`](Self::run).
    pub fn channels_scanned(&self) -> usize {
        self.channels_scanned
    }

    /// Scans every channel of `table`, in order, exactly once.
    ///
    /// Channels without signal or sync are skipped; input or engine failures
    /// abort the scan with the results gathered so far kept.
    pub fn run(&mut self, input: &mut dyn InputDevice, table: &dyn ChannelTable) -> CoreResult<()> {
        self.results.clear();
        self.metrics.reset();
        self.channels_scanned = table.channel_count();

        let mut current = table.first_channel().map(str::to_string);
        let mut index = 0;
        while let Some(name) = current {
            index += 1;
            let frequency_hz = table
                .frequency_of(&name)
                .ok_or_else(|| ScanError::UnknownChannel(name.clone()))?;
            self.progress
                .begin_channel(index, self.channels_scanned, &name, frequency_hz);

            let outcome = self.scan_channel(input, &name, frequency_hz)?;
            self.metrics.record(outcome);

            current = table.next_channel(&name).map(str::to_string);
        }

        Ok(())
    }

    /// Renders the aggregated results as the JSON report.
    pub fn write_report(&self, out: &mut dyn Write) -> CoreResult<()> {
        ScanReport::new(self.channels_scanned, &self.results).write_to(out)
    }

    fn events(&self) -> Arc<dyn RadioEvents> {
        self.monitor.clone()
    }

    fn scan_channel(
        &mut self,
        input: &mut dyn InputDevice,
        name: &str,
        frequency_hz: u32,
    ) -> CoreResult<ChannelOutcome> {
        self.monitor.reset();

        input.set_frequency(frequency_hz)?;
        input.reset();
        thread::sleep(self.timing.settle);

        if !self.probe_presence(input)? {
            self.progress.no_signal(name);
            return Ok(ChannelOutcome::NoSignal);
        }

        self.monitor.clear_sync();
        input.reset();
        debug!("{}: waiting for sync", name);
        let events = self.events();
        let session = EngineSession::start(self.factory.create(&*input, events)?, false);

        if !self.monitor.wait_for_sync(self.timing.sync_timeout) {
            self.progress.no_sync(name);
            session.stop();
            return Ok(ChannelOutcome::NoSync);
        }

        // No completion event exists for the service list; give it time to fill.
        debug!("{}: synced, collecting services", name);
        thread::sleep(self.timing.grace_period);

        let result = self.snapshot(&*session, name, frequency_hz);
        self.progress.found(
            name,
            &result.ensemble_label,
            result.services.len(),
            result.snr_db,
        );
        self.results.push(result);
        session.stop();

        Ok(ChannelOutcome::Recorded)
    }

    /// Runs the engine in scan mode and reports whether presence was seen.
    fn probe_presence(&mut self, input: &mut dyn InputDevice) -> CoreResult<bool> {
        let events = self.events();
        let session = EngineSession::start(self.factory.create(&*input, events)?, true);
        let present = self.monitor.wait_for_signal(self.timing.presence_timeout);
        session.stop();
        Ok(present)
    }

    fn snapshot<E: DecoderEngine>(&self, engine: &E, name: &str, frequency_hz: u32) -> ScanResult {
        let mut result = self.monitor.with_state(|state| ScanResult {
            channel_name: name.to_string(),
            frequency_hz,
            ensemble_id: state.ensemble_id,
            ensemble_label: trim_label(&state.ensemble_label),
            snr_db: state.snr_db,
            services: Vec::new(),
        });

        result.services = engine
            .service_list()
            .iter()
            .map(|service| ServiceInfo {
                service_id: service.service_id,
                label: trim_label(&service.label),
                bitrate_kbps: engine
                    .components_of(service)
                    .iter()
                    .map(|component| engine.subchannel_of(component))
                    .find(|subchannel| subchannel.is_valid())
                    .map_or(0, |subchannel| subchannel.bitrate_kbps),
            })
            .collect();

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::DabChannels;
    use crate::interface::{Service, ServiceComponent, Subchannel};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread::JoinHandle;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Script {
        present: bool,
        synced: bool,
        ensemble_id: u16,
        label: String,
        snr_db: f32,
        services: Vec<(Service, Vec<Subchannel>)>,
        /// Drops sync again this long after reporting it.
        sync_lost_after: Option<Duration>,
    }

    #[derive(Clone, Default)]
    struct Counters {
        created: Arc<AtomicUsize>,
        stopped: Arc<AtomicUsize>,
    }

    struct ScriptedFactory {
        scripts: HashMap<u32, Script>,
        counters: Counters,
    }

    struct ScriptedEngine {
        script: Script,
        events: Arc<dyn RadioEvents>,
        counters: Counters,
        worker: Option<JoinHandle<()>>,
    }

    impl EngineFactory for ScriptedFactory {
        type Engine = ScriptedEngine;

        fn create(
            &mut self,
            input: &dyn InputDevice,
            events: Arc<dyn RadioEvents>,
        ) -> CoreResult<ScriptedEngine> {
            self.counters.created.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptedEngine {
                script: self
                    .scripts
                    .get(&input.frequency())
                    .cloned()
                    .unwrap_or_default(),
                events,
                counters: self.counters.clone(),
                worker: None,
            })
        }
    }

    impl DecoderEngine for ScriptedEngine {
        fn restart(&mut self, scan_mode: bool) {
            let script = self.script.clone();
            let events = self.events.clone();
            self.worker = Some(thread::spawn(move || {
                thread::sleep(Duration::from_millis(5));
                if scan_mode {
                    if script.present {
                        events.on_signal_presence(true);
                    }
                    return;
                }
                events.on_snr(script.snr_db);
                events.on_new_ensemble(script.ensemble_id);
                events.on_ensemble_label(&script.label);
                for (service, _) in &script.services {
                    events.on_service_detected(service.service_id);
                }
                events.on_date_time_update(Default::default());
                if script.synced {
                    events.on_sync_change(true);
                    if let Some(delay) = script.sync_lost_after {
                        thread::sleep(delay);
                        events.on_sync_change(false);
                    }
                }
            }));
        }

        fn stop(&mut self) {
            if let Some(worker) = self.worker.take() {
                worker.join().unwrap();
            }
            self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        }

        fn service_list(&self) -> Vec<Service> {
            self.script
                .services
                .iter()
                .map(|(service, _)| service.clone())
                .collect()
        }

        fn components_of(&self, service: &Service) -> Vec<ServiceComponent> {
            self.script
                .services
                .iter()
                .filter(|(s, _)| s.service_id == service.service_id)
                .flat_map(|(s, subchannels)| {
                    subchannels
                        .iter()
                        .enumerate()
                        .map(move |(idx, sub)| ServiceComponent {
                            service_id: s.service_id,
                            component_index: idx as u8,
                            subchannel_id: sub.id,
                        })
                })
                .collect()
        }

        fn subchannel_of(&self, component: &ServiceComponent) -> Subchannel {
            self.script
                .services
                .iter()
                .find(|(s, _)| s.service_id == component.service_id)
                .and_then(|(_, subchannels)| {
                    subchannels.get(component.component_index as usize).copied()
                })
                .unwrap_or_default()
        }
    }

    #[derive(Default)]
    struct TestInput {
        frequency: u32,
        tuned: Vec<u32>,
        resets: usize,
    }

    impl InputDevice for TestInput {
        fn set_frequency(&mut self, frequency_hz: u32) -> CoreResult<()> {
            self.frequency = frequency_hz;
            self.tuned.push(frequency_hz);
            Ok(())
        }

        fn reset(&mut self) {
            self.resets += 1;
        }

        fn frequency(&self) -> u32 {
            self.frequency
        }
    }

    struct BrokenInput;

    impl InputDevice for BrokenInput {
        fn set_frequency(&mut self, _frequency_hz: u32) -> CoreResult<()> {
            Err(ScanError::Input("tuner unplugged".into()))
        }

        fn reset(&mut self) {}

        fn frequency(&self) -> u32 {
            0
        }
    }

    fn fast_timing() -> ScanTiming {
        ScanTiming::default()
            .with_settle(Duration::from_millis(1))
            .with_presence_timeout(Duration::from_millis(150))
            .with_sync_timeout(Duration::from_millis(300))
            .with_grace_period(Duration::from_millis(10))
    }

    fn sub(id: Option<u8>, bitrate_kbps: u32) -> Subchannel {
        Subchannel { id, bitrate_kbps }
    }

    fn two_channel_table() -> DabChannels {
        DabChannels::from_entries([("5A", 174_928_000), ("5B", 176_640_000)])
    }

    fn radio_x_script() -> Script {
        Script {
            present: true,
            synced: true,
            ensemble_id: 0x10AB,
            label: "Test Mux   ".into(),
            snr_db: 14.5,
            services: vec![(Service::new(0xA001, "Radio X  "), vec![sub(Some(1), 128)])],
            sync_lost_after: None,
        }
    }

    fn scanner_with(
        scripts: Vec<(u32, Script)>,
    ) -> (ChannelScanner<ScriptedFactory>, Counters) {
        let counters = Counters::default();
        let factory = ScriptedFactory {
            scripts: scripts.into_iter().collect(),
            counters: counters.clone(),
        };
        let scanner =
            ChannelScanner::new(factory, fast_timing()).with_progress(ProgressLog::silent());
        (scanner, counters)
    }

    #[test]
    fn silent_channel_is_skipped_and_synced_channel_recorded() {
        let (mut scanner, _) = scanner_with(vec![(176_640_000, radio_x_script())]);
        let mut input = TestInput::default();

        scanner.run(&mut input, &two_channel_table()).unwrap();

        assert_eq!(input.tuned, vec![174_928_000, 176_640_000]);
        assert_eq!(scanner.channels_scanned(), 2);
        let results = scanner.results();
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.channel_name, "5B");
        assert_eq!(result.frequency_hz, 176_640_000);
        assert_eq!(result.ensemble_id, 0x10AB);
        assert_eq!(result.ensemble_label, "Test Mux");
        assert_eq!(result.snr_db, 14.5);
        assert_eq!(
            result.services,
            vec![ServiceInfo {
                service_id: 0xA001,
                label: "Radio X".into(),
                bitrate_kbps: 128,
            }]
        );

        let metrics = scanner.metrics();
        assert_eq!(metrics.probed, 2);
        assert_eq!(metrics.no_signal, 1);
        assert_eq!(metrics.recorded, 1);
    }

    #[test]
    fn presence_without_sync_records_nothing() {
        let script = Script {
            synced: false,
            ..radio_x_script()
        };
        let (mut scanner, counters) = scanner_with(vec![(174_928_000, script)]);
        let table = DabChannels::from_entries([("5A", 174_928_000)]);

        scanner.run(&mut TestInput::default(), &table).unwrap();

        assert!(scanner.results().is_empty());
        assert_eq!(scanner.metrics().no_sync, 1);
        assert_eq!(counters.created.load(Ordering::SeqCst), 2);
        assert_eq!(counters.stopped.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn every_engine_is_stopped_on_every_path() {
        let presence_only = Script {
            synced: false,
            ..radio_x_script()
        };
        let table = DabChannels::from_entries([
            ("5A", 174_928_000),
            ("5B", 176_640_000),
            ("5C", 178_352_000),
        ]);
        let (mut scanner, counters) = scanner_with(vec![
            (176_640_000, presence_only),
            (178_352_000, radio_x_script()),
        ]);

        scanner.run(&mut TestInput::default(), &table).unwrap();

        // One probe engine for 5A, probe plus full engine for 5B and 5C.
        assert_eq!(counters.created.load(Ordering::SeqCst), 5);
        assert_eq!(counters.stopped.load(Ordering::SeqCst), 5);
        assert_eq!(scanner.results().len(), 1);
        assert_eq!(scanner.results()[0].channel_name, "5C");
    }

    #[test]
    fn sync_lost_during_grace_period_is_still_recorded() {
        let script = Script {
            sync_lost_after: Some(Duration::from_millis(20)),
            ..radio_x_script()
        };
        let counters = Counters::default();
        let factory = ScriptedFactory {
            scripts: HashMap::from([(174_928_000, script)]),
            counters: counters.clone(),
        };
        let timing = fast_timing().with_grace_period(Duration::from_millis(100));
        let mut scanner = ChannelScanner::new(factory, timing).with_progress(ProgressLog::silent());
        let table = DabChannels::from_entries([("5A", 174_928_000)]);

        scanner.run(&mut TestInput::default(), &table).unwrap();

        assert_eq!(scanner.results().len(), 1);
        assert_eq!(scanner.results()[0].ensemble_label, "Test Mux");
        assert!(!scanner.monitor.snapshot().synced);
        assert_eq!(scanner.metrics().recorded, 1);
    }

    #[test]
    fn bitrate_comes_from_first_valid_subchannel() {
        let script = Script {
            services: vec![
                (
                    Service::new(0xA001, "Skips invalid"),
                    vec![sub(None, 64), sub(Some(4), 96), sub(Some(5), 192)],
                ),
                (Service::new(0xA002, "No subchannel"), vec![sub(None, 80)]),
                (Service::new(0xA003, "No components"), vec![]),
            ],
            ..radio_x_script()
        };
        let (mut scanner, _) = scanner_with(vec![(174_928_000, script)]);
        let table = DabChannels::from_entries([("5A", 174_928_000)]);

        scanner.run(&mut TestInput::default(), &table).unwrap();

        let bitrates: Vec<_> = scanner.results()[0]
            .services
            .iter()
            .map(|service| service.bitrate_kbps)
            .collect();
        assert_eq!(bitrates, vec![96, 0, 0]);
    }

    #[test]
    fn labels_lose_trailing_whitespace_only() {
        let script = Script {
            label: "  Padded Mux \t ".into(),
            services: vec![(Service::new(0xC0DE, " Lead  "), vec![sub(Some(2), 48)])],
            ..radio_x_script()
        };
        let (mut scanner, _) = scanner_with(vec![(174_928_000, script)]);
        let table = DabChannels::from_entries([("5A", 174_928_000)]);

        scanner.run(&mut TestInput::default(), &table).unwrap();

        let result = &scanner.results()[0];
        assert_eq!(result.ensemble_label, "  Padded Mux");
        assert_eq!(result.services[0].label, " Lead");
    }

    #[test]
    fn service_count_matches_detected_ids() {
        let script = Script {
            services: vec![
                (Service::new(1, "One"), vec![sub(Some(1), 64)]),
                (Service::new(2, "Two"), vec![sub(Some(2), 64)]),
                (Service::new(3, "Three"), vec![sub(Some(3), 64)]),
            ],
            ..radio_x_script()
        };
        let (mut scanner, _) = scanner_with(vec![(174_928_000, script)]);
        let table = DabChannels::from_entries([("5A", 174_928_000)]);

        scanner.run(&mut TestInput::default(), &table).unwrap();

        let detected = scanner.monitor.snapshot().detected_service_ids.len();
        assert_eq!(detected, 3);
        assert_eq!(scanner.results()[0].services.len(), detected);
    }

    #[test]
    fn input_failure_aborts_the_scan() {
        let (mut scanner, counters) = scanner_with(vec![]);
        let err = scanner
            .run(&mut BrokenInput, &two_channel_table())
            .unwrap_err();
        assert!(matches!(err, ScanError::Input(_)));
        assert_eq!(counters.created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn progress_reports_each_channel_outcome() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (scanner, _) = scanner_with(vec![(176_640_000, radio_x_script())]);
        let mut scanner = scanner.with_progress(ProgressLog::buffered(buffer.clone()));

        scanner.run(&mut TestInput::default(), &two_channel_table()).unwrap();

        let text = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[1/2] 5A  (174.928 MHz)"));
        assert!(lines[0].ends_with("no signal"));
        assert!(lines[1].ends_with("found: Test Mux (1 services, SNR 14.5 dB)"));
    }

    #[test]
    fn report_lists_recorded_ensemble() {
        let (mut scanner, _) = scanner_with(vec![(176_640_000, radio_x_script())]);
        scanner.run(&mut TestInput::default(), &two_channel_table()).unwrap();

        let mut out = Vec::new();
        scanner.write_report(&mut out).unwrap();
        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(report["scan"]["channels_scanned"], 2);
        assert_eq!(report["scan"]["ensembles_found"], 1);
        assert_eq!(report["results"][0]["channel"], "5B");
        assert_eq!(report["results"][0]["ensemble"]["id"], "0x10AB");
        assert_eq!(
            report["results"][0]["services"][0],
            serde_json::json!({"bitrate_kbps": 128, "label": "Radio X", "sid": "0xA001"})
        );
    }
}
