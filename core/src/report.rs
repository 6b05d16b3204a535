//! JSON rendering of scan results.
//!
//! Keys inside every object are declared in lexicographic order so the
//! output is byte-stable for a given result list and timestamp.

use std::io::Write;

use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::interface::{ScanResult, ServiceInfo};
use crate::prelude::CoreResult;

#[derive(Debug, Clone, Serialize)]
struct ReportDocument<'a> {
    results: Vec<ResultEntry<'a>>,
    scan: ScanSummary,
}

#[derive(Debug, Clone, Serialize)]
struct ScanSummary {
    channels_scanned: usize,
    ensembles_found: usize,
    timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
struct ResultEntry<'a> {
    channel: &'a str,
    ensemble: EnsembleEntry<'a>,
    frequency_hz: u32,
    services: Vec<ServiceEntry<'a>>,
    snr_db: f32,
}

#[derive(Debug, Clone, Serialize)]
struct EnsembleEntry<'a> {
    id: String,
    label: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceEntry<'a> {
    bitrate_kbps: u32,
    label: &'a str,
    sid: String,
}

impl<'a> From<&'a ServiceInfo> for ServiceEntry<'a> {
    fn from(service: &'a ServiceInfo) -> Self {
        Self {
            bitrate_kbps: service.bitrate_kbps,
            label: &service.label,
            sid: hex_id(service.service_id),
        }
    }
}

impl<'a> From<&'a ScanResult> for ResultEntry<'a> {
    fn from(result: &'a ScanResult) -> Self {
        Self {
            channel: &result.channel_name,
            ensemble: EnsembleEntry {
                id: hex_id(u32::from(result.ensemble_id)),
                label: &result.ensemble_label,
            },
            frequency_hz: result.frequency_hz,
            services: result.services.iter().map(ServiceEntry::from).collect(),
            snr_db: result.snr_db,
        }
    }
}

/// `0x`-prefixed, upper-case, zero-padded to at least four digits.
pub fn hex_id(value: u32) -> String {
    format!("0x{:04X}", value)
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn utc_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0)
        .unwrap_or(now)
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// Report over an ordered list of scan results.
pub struct ScanReport<'a> {
    timestamp: String,
    channels_scanned: usize,
    results: &'a [ScanResult],
}

impl<'a> ScanReport<'a> {
    pub fn new(channels_scanned: usize, results: &'a [ScanResult]) -> Self {
        Self {
            timestamp: utc_timestamp(),
            channels_scanned,
            results,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Writes the report as 2-space indented JSON followed by a newline.
    pub fn write_to(&self, out: &mut dyn Write) -> CoreResult<()> {
        let document = ReportDocument {
            results: self.results.iter().map(ResultEntry::from).collect(),
            scan: ScanSummary {
                channels_scanned: self.channels_scanned,
                ensembles_found: self.results.len(),
                timestamp: self.timestamp.clone(),
            },
        };

        serde_json::to_writer_pretty(&mut *out, &document)?;
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn render(&self) -> CoreResult<String> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
