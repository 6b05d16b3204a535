//! Orchestration core for scanning a DAB band.
//!
//! A [`ChannelScanner`] retunes an [`InputDevice`] channel by channel, drives a
//! decoder built by an [`EngineFactory`] through a quick presence probe and a
//! full sync phase, and keeps one [`ScanResult`] per ensemble it could lock.
//! Results render to a stable JSON report through [`report::ScanReport`].

pub mod channels;
pub mod interface;
pub mod math;
pub mod prelude;
pub mod report;
pub mod scanning;
pub mod telemetry;

pub use channels::{Band, DabChannels};
pub use interface::{RadioEvents, ScanResult, ServiceInfo};
pub use prelude::{
    ChannelTable, CoreResult, DecoderEngine, EngineFactory, InputDevice, ScanError, ScanTiming,
};
pub use scanning::{ChannelOutcome, ChannelScanner};
