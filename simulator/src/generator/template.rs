use std::f32::consts::PI;

/// Real tone of `cycles` periods spread over `length` samples.
pub fn sine_wave(length: usize, cycles: f32) -> Vec<f32> {
    (0..length)
        .map(|i| ((i as f32 * cycles) / length as f32 * 2.0 * PI).sin())
        .collect()
}
