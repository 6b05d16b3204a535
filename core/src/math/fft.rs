use num_complex::Complex32;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Forward FFT of a fixed size, planned once and reused per symbol.
pub struct FftHelper {
    fft: Arc<dyn Fft<f32>>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(size.max(1));
        Self {
            fft,
            size: size.max(1),
        }
    }

    /// Transforms `input`, zero-padding or truncating it to the planned size.
    pub fn forward(&self, input: &[Complex32]) -> Vec<Complex32> {
        let mut buffer: Vec<Complex32> = input.iter().take(self.size).copied().collect();
        buffer.resize(self.size, Complex32::zero());
        self.fft.process(&mut buffer);
        buffer
    }

    /// Magnitude of the spectrum in dB, normalised to the strongest bin.
    pub fn impulse_response(&self, input: &[Complex32]) -> Vec<f32> {
        let spectrum = self.forward(input);
        let peak = spectrum.iter().map(|bin| bin.norm()).fold(0.0_f32, f32::max);
        if peak <= 0.0 {
            return vec![f32::NEG_INFINITY; spectrum.len()];
        }
        spectrum
            .iter()
            .map(|bin| 20.0 * (bin.norm() / peak).log10())
            .collect()
    }
}
