//! Sidechain ducking: vocals drive an envelope that pulls the backing bus
//! down by up to 3 dB, so the vocal sits on top without needing to be loud.
//!
//! The amount of ducking is proportional to vocal presence, derived from a
//! 200 Hz highpass of the vocals bus rather than (as a literal port would)
//! a highpass of the whole finished mix — the stems are already split by
//! this point in the pipeline, so there's no reason to re-detect vocal
//! presence from a signal that already has backing bleeding into it.

use mashup_analysis::biquad::{Biquad, FilterType};

use crate::filtfilt::filtfilt;

const HIGHPASS_HZ: f64 = 200.0;
const SAVGOL_WINDOW: usize = 21;
const SAVGOL_HALF_WIDTH: isize = (SAVGOL_WINDOW / 2) as isize;
const DUCKING_DB: f64 = -3.0;

/// Closed-form quadratic/cubic Savitzky-Golay smoothing coefficients for a
/// `2*half_width + 1`-point window (quadratic and cubic fits coincide, so
/// one formula covers the `(21, 3)` window this pipeline always uses).
fn savgol_coefficients(half_width: isize) -> Vec<f64> {
    let m = f64::from(half_width as i32);
    let denominator = (2.0 * m + 3.0) * (2.0 * m + 1.0) * (2.0 * m - 1.0);
    (-half_width..=half_width)
        .map(|i| {
            let i = f64::from(i as i32);
            3.0 * (3.0 * m * m + 3.0 * m - 1.0 - 5.0 * i * i) / denominator
        })
        .collect()
}

fn savgol_smooth(samples: &[f64]) -> Vec<f64> {
    if samples.len() <= SAVGOL_WINDOW {
        return samples.to_vec();
    }
    let coefficients = savgol_coefficients(SAVGOL_HALF_WIDTH);
    let n = samples.len() as isize;
    (0..n)
        .map(|center| {
            coefficients
                .iter()
                .enumerate()
                .map(|(offset, coefficient)| {
                    let index = (center + offset as isize - SAVGOL_HALF_WIDTH).clamp(0, n - 1);
                    coefficient * samples[index as usize]
                })
                .sum()
        })
        .collect()
}

#[must_use]
pub fn apply_sidechain_ducking(vocals: &[f64], backing: &[f64], sample_rate: f64) -> Vec<f64> {
    let highpass = Biquad::design(FilterType::Highpass, sample_rate, HIGHPASS_HZ, 0.707, 0.0);
    let vocal_band = filtfilt(&[highpass], vocals);
    let envelope = savgol_smooth(&vocal_band.iter().map(|s| s.abs()).collect::<Vec<_>>());

    let ducking_factor = 10f64.powf(DUCKING_DB / 20.0);
    let len = backing.len().max(vocals.len());
    let mut out = vec![0.0; len];
    for i in 0..len {
        let envelope_value = envelope.get(i).copied().unwrap_or(0.0);
        let backing_value = backing.get(i).copied().unwrap_or(0.0);
        let vocal_value = vocals.get(i).copied().unwrap_or(0.0);
        out[i] = backing_value * (1.0 - envelope_value * (1.0 - ducking_factor)) + vocal_value;
    }
    out
}
