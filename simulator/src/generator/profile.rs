use crate::generator::template::sine_wave;
use dabscancore::math::{FftHelper, StatsHelper};
use dabscancore::interface::TiiMeasurement;
use num_complex::Complex32;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MEASUREMENT_LENGTH: usize = 4096;
const NULL_SYMBOL_LENGTH: usize = 256;
const CONSTELLATION_POINTS: usize = 64;

/// What a simulated transmitter on one channel looks like to the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelProfile {
    /// Whether the scan-mode probe sees energy on the channel.
    pub presence: bool,
    /// Whether the full receiver manages to lock.
    pub sync: bool,
    pub presence_delay_ms: u64,
    pub sync_delay_ms: u64,
    /// Gap between two services appearing in the FIC.
    pub service_interval_ms: u64,
    pub snr_db: f32,
    pub ensemble_id: u16,
    pub ensemble_label: String,
    pub services: Vec<ServiceProfile>,
    pub seed: u64,
}

impl Default for ChannelProfile {
    fn default() -> Self {
        Self {
            presence: true,
            sync: true,
            presence_delay_ms: 300,
            sync_delay_ms: 1500,
            service_interval_ms: 200,
            snr_db: 12.0,
            ensemble_id: 0,
            ensemble_label: String::new(),
            services: Vec::new(),
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProfile {
    pub sid: u32,
    pub label: String,
    #[serde(default)]
    pub components: Vec<ComponentProfile>,
}

/// Service component; `subchannel` stays empty while it is not signalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentProfile {
    #[serde(default)]
    pub subchannel: Option<u8>,
    #[serde(default)]
    pub bitrate_kbps: u32,
}

impl ChannelProfile {
    pub fn presence_delay(&self) -> Duration {
        Duration::from_millis(self.presence_delay_ms)
    }

    pub fn sync_delay(&self) -> Duration {
        Duration::from_millis(self.sync_delay_ms)
    }

    pub fn service_interval(&self) -> Duration {
        Duration::from_millis(self.service_interval_ms)
    }

    pub fn service(&self, sid: u32) -> Option<&ServiceProfile> {
        self.services.iter().find(|service| service.sid == sid)
    }

    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ u64::from(self.ensemble_id))
    }
}

/// Synthetic receiver measurements derived from a profile.
pub struct SignalModel {
    profile: ChannelProfile,
    rng: StdRng,
}

impl SignalModel {
    pub fn new(profile: &ChannelProfile) -> Self {
        Self {
            rng: profile.rng(),
            profile: profile.clone(),
        }
    }

    fn noise(&mut self, length: usize) -> Vec<f32> {
        // Uniform noise on [-sqrt(3), sqrt(3)] has unit RMS.
        let bound = 3.0_f32.sqrt();
        (0..length)
            .map(|_| self.rng.gen_range(-bound..bound))
            .collect()
    }

    /// SNR as the receiver would estimate it from a tone buried in noise.
    pub fn measured_snr(&mut self) -> f32 {
        let amplitude = 10.0_f32.powf(self.profile.snr_db / 20.0) * 2.0_f32.sqrt();
        let tone: Vec<f32> = sine_wave(MEASUREMENT_LENGTH, 37.0)
            .into_iter()
            .map(|v| v * amplitude)
            .collect();
        let noise = self.noise(MEASUREMENT_LENGTH);
        StatsHelper::snr_db(&tone, &noise)
    }

    /// Null symbol with a direct path and one weaker echo.
    pub fn null_symbol(&mut self) -> Vec<Complex32> {
        let floor = 10.0_f32.powf(-self.profile.snr_db / 20.0);
        let mut samples: Vec<Complex32> = self
            .noise(NULL_SYMBOL_LENGTH * 2)
            .chunks(2)
            .map(|pair| Complex32::new(pair[0] * floor, pair[1] * floor))
            .collect();
        samples[0] += Complex32::new(1.0, 0.0);
        samples[NULL_SYMBOL_LENGTH / 8] += Complex32::new(0.3, 0.1);
        samples
    }

    pub fn impulse_response(&mut self) -> Vec<f32> {
        let null_symbol = self.null_symbol();
        FftHelper::new(NULL_SYMBOL_LENGTH).impulse_response(&null_symbol)
    }

    /// QPSK points spread by the channel noise.
    pub fn constellation(&mut self) -> Vec<Complex32> {
        let spread = 10.0_f32.powf(-self.profile.snr_db / 20.0);
        (0..CONSTELLATION_POINTS)
            .map(|idx| {
                let re = if idx % 2 == 0 { 1.0 } else { -1.0 };
                let im = if (idx / 2) % 2 == 0 { 1.0 } else { -1.0 };
                let jitter_re = self.rng.gen_range(-1.0..1.0) * spread;
                let jitter_im = self.rng.gen_range(-1.0..1.0) * spread;
                Complex32::new(re + jitter_re, im + jitter_im)
            })
            .collect()
    }

    pub fn frequency_offset(&mut self) -> (i32, i32) {
        (self.rng.gen_range(-200..200), self.rng.gen_range(-2..=2))
    }

    pub fn tii(&mut self) -> TiiMeasurement {
        TiiMeasurement {
            comb: self.rng.gen_range(1..=23),
            pattern: self.rng.gen_range(1..=69),
            delay_samples: self.rng.gen_range(0..64),
            error: self.rng.gen_range(0.0..0.2),
        }
    }
}
