use num_complex::Complex32;
use serde::{Deserialize, Serialize};

/// Broadcast date and time carried in the FIC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DabDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub milliseconds: u16,
    pub utc_offset_minutes: i16,
}

/// Transmitter identification measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TiiMeasurement {
    pub comb: u8,
    pub pattern: u8,
    pub delay_samples: i32,
    pub error: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageLevel {
    Information,
    Error,
}

/// Notifications a decoder engine raises from its own threads.
///
/// Only the handlers the scanner consumes need overriding; everything else
/// defaults to a no-op so any sink satisfies the whole interface.
pub trait RadioEvents: Send + Sync {
    fn on_snr(&self, _snr_db: f32) {}
    fn on_sync_change(&self, _synced: bool) {}
    fn on_signal_presence(&self, _present: bool) {}
    fn on_service_detected(&self, _service_id: u32) {}
    fn on_new_ensemble(&self, _ensemble_id: u16) {}
    fn on_ensemble_label(&self, _label: &str) {}

    fn on_frequency_corrector_change(&self, _fine: i32, _coarse: i32) {}
    fn on_date_time_update(&self, _date_time: DabDateTime) {}
    fn on_fib_decode_success(&self, _crc_ok: bool, _fib: &[u8]) {}
    fn on_new_impulse_response(&self, _impulse_response: Vec<f32>) {}
    fn on_constellation_points(&self, _points: Vec<Complex32>) {}
    fn on_new_null_symbol(&self, _samples: Vec<Complex32>) {}
    fn on_tii_measurement(&self, _measurement: TiiMeasurement) {}
    fn on_message(&self, _level: MessageLevel, _text: &str, _detail: &str) {}
}
