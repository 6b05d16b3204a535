/// Service summary stored with a recorded ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInfo {
    pub service_id: u32,
    pub label: String,
    /// Bitrate of the first valid subchannel, 0 when none is known yet.
    pub bitrate_kbps: u32,
}

/// Snapshot of one channel that reached sync. Never mutated once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub channel_name: String,
    pub frequency_hz: u32,
    pub ensemble_id: u16,
    pub ensemble_label: String,
    pub snr_db: f32,
    pub services: Vec<ServiceInfo>,
}

/// Removes trailing whitespace only; leading padding is part of the label.
pub fn trim_label(raw: &str) -> String {
    raw.trim_end().to_string()
}
