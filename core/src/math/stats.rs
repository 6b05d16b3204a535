pub struct StatsHelper;

impl StatsHelper {
    pub fn rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = samples.iter().map(|&v| v * v).sum();
        (sum_sq / samples.len() as f32).sqrt()
    }

    /// Ratio of two RMS levels in dB. Zero noise yields `f32::INFINITY`.
    pub fn snr_db(signal: &[f32], noise: &[f32]) -> f32 {
        let noise_rms = Self::rms(noise);
        if noise_rms == 0.0 {
            return f32::INFINITY;
        }
        20.0 * (Self::rms(signal) / noise_rms).log10()
    }
}
