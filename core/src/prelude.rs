use std::sync::Arc;
use std::time::Duration;

use crate::interface::{RadioEvents, Service, ServiceComponent, Subchannel};

/// Tuning constants that bound every blocking step of a channel scan.
///
/// The defaults come from hardware behaviour rather than the broadcast
/// protocol; change them only when the receiver is known to differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTiming {
    /// Pause after retuning so the AGC can settle before detection starts.
    pub settle: Duration,
    /// How long the scan-mode engine may take to report signal presence.
    pub presence_timeout: Duration,
    /// How long the full-mode engine may take to reach sync.
    pub sync_timeout: Duration,
    /// Time given to service discovery once sync is held.
    pub grace_period: Duration,
}

impl ScanTiming {
    pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);
    pub const DEFAULT_PRESENCE_TIMEOUT: Duration = Duration::from_secs(3);
    pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

    pub fn with_sync_timeout(mut self, sync_timeout: Duration) -> Self {
        self.sync_timeout = sync_timeout;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_presence_timeout(mut self, presence_timeout: Duration) -> Self {
        self.presence_timeout = presence_timeout;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}

impl Default for ScanTiming {
    fn default() -> Self {
        Self {
            settle: Self::DEFAULT_SETTLE,
            presence_timeout: Self::DEFAULT_PRESENCE_TIMEOUT,
            sync_timeout: Self::DEFAULT_SYNC_TIMEOUT,
            grace_period: Self::DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Errors that abort a scan. Channels without signal or sync are not errors.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
    #[error("input device failure: {0}")]
    Input(String),
    #[error("decoder engine failure: {0}")]
    Engine(String),
    #[error("report output failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, ScanError>;

/// Control surface of a running decoder. Notifications flow back through
/// the [`RadioEvents`] sink the engine was created with.
pub trait DecoderEngine {
    /// (Re)starts decoding. `scan_mode` asks for a quick presence verdict
    /// instead of full synchronisation.
    fn restart(&mut self, scan_mode: bool);
    fn stop(&mut self);
    fn service_list(&self) -> Vec<Service>;
    fn components_of(&self, service: &Service) -> Vec<ServiceComponent>;
    fn subchannel_of(&self, component: &ServiceComponent) -> Subchannel;
}

/// Builds one engine per scan phase.
pub trait EngineFactory {
    type Engine: DecoderEngine;

    fn create(
        &mut self,
        input: &dyn InputDevice,
        events: Arc<dyn RadioEvents>,
    ) -> CoreResult<Self::Engine>;
}

/// Tunable front end feeding the decoder.
pub trait InputDevice {
    fn set_frequency(&mut self, frequency_hz: u32) -> CoreResult<()>;
    /// Drops buffered samples from the previous tuning.
    fn reset(&mut self);
    fn frequency(&self) -> u32;
}

/// Ordered table of named channels.
pub trait ChannelTable {
    fn first_channel(&self) -> Option<&str>;
    fn next_channel(&self, current: &str) -> Option<&str>;
    fn frequency_of(&self, name: &str) -> Option<u32>;
    fn channel_count(&self) -> usize;
}
