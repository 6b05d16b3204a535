use crate::generator::profile::{ChannelProfile, ComponentProfile, ServiceProfile};
use anyhow::{bail, Context};
use dabscancore::prelude::{ChannelTable, ScanTiming};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Scan timing in milliseconds, as written in scenario files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub settle_ms: u64,
    pub presence_timeout_ms: u64,
    pub sync_timeout_ms: u64,
    pub grace_period_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let timing = ScanTiming::default();
        Self {
            settle_ms: timing.settle.as_millis() as u64,
            presence_timeout_ms: timing.presence_timeout.as_millis() as u64,
            sync_timeout_ms: timing.sync_timeout.as_millis() as u64,
            grace_period_ms: timing.grace_period.as_millis() as u64,
        }
    }
}

impl TimingConfig {
    pub fn to_scan_timing(&self) -> ScanTiming {
        ScanTiming {
            settle: Duration::from_millis(self.settle_ms),
            presence_timeout: Duration::from_millis(self.presence_timeout_ms),
            sync_timeout: Duration::from_millis(self.sync_timeout_ms),
            grace_period: Duration::from_millis(self.grace_period_ms),
        }
    }
}

/// Simulated RF environment: which channels carry an ensemble and how it
/// behaves. Channels not listed are silent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub timing: TimingConfig,
    pub channels: BTreeMap<String, ChannelProfile>,
}

impl ScenarioConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario {}", path_ref.display()))?;
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path_ref.display()))?;
        Ok(config)
    }

    /// Small built-in scenario: two ensembles, one channel that never syncs.
    pub fn demo() -> Self {
        let component = |subchannel, bitrate_kbps| ComponentProfile {
            subchannel: Some(subchannel),
            bitrate_kbps,
        };
        let service = |sid, label: &str, components| ServiceProfile {
            sid,
            label: label.to_string(),
            components,
        };

        let mut channels = BTreeMap::new();
        channels.insert(
            "5C".to_string(),
            ChannelProfile {
                snr_db: 14.0,
                ensemble_id: 0x10BC,
                ensemble_label: "DR Deutschland  ".into(),
                services: vec![
                    service(0xD210, "Deutschlandfunk ", vec![component(1, 96)]),
                    service(0xD220, "DLF Kultur      ", vec![component(2, 96)]),
                    service(0xD230, "Dlf Nova        ", vec![component(3, 72)]),
                ],
                seed: 5,
                ..Default::default()
            },
        );
        channels.insert(
            "11D".to_string(),
            ChannelProfile {
                presence: true,
                sync: false,
                snr_db: 2.5,
                seed: 11,
                ..Default::default()
            },
        );
        channels.insert(
            "12C".to_string(),
            ChannelProfile {
                snr_db: 9.5,
                ensemble_id: 0x1001,
                ensemble_label: "City Mux".into(),
                services: vec![
                    service(0xA001, "Radio X  ", vec![component(4, 128)]),
                    service(
                        0xA002,
                        "Radio Y",
                        vec![
                            ComponentProfile {
                                subchannel: None,
                                bitrate_kbps: 48,
                            },
                            component(5, 64),
                        ],
                    ),
                ],
                seed: 12,
                ..Default::default()
            },
        );

        Self {
            timing: TimingConfig::default(),
            channels,
        }
    }

    /// Resolves channel names to the frequencies the engine will be tuned to.
    pub fn profiles_by_frequency(
        &self,
        table: &dyn ChannelTable,
    ) -> anyhow::Result<HashMap<u32, ChannelProfile>> {
        let mut profiles = HashMap::with_capacity(self.channels.len());
        for (name, profile) in &self.channels {
            let Some(frequency) = table.frequency_of(name) else {
                bail!("scenario names channel {} which is not in the channel table", name);
            };
            profiles.insert(frequency, profile.clone());
        }
        Ok(profiles)
    }
}
