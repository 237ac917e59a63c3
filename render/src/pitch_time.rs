//! Pitch/time transform: an STFT phase-vocoder time-stretch followed by a
//! resample, so tempo and pitch move independently of each other.
//!
//! Modeled as a trait rather than a free function so the renderer can swap
//! in a different engine later without touching the orchestration in
//! `lib.rs` — mirrors how the loudness meter is a swappable capability in
//! `mashup-analysis`.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex64;

use crate::errors::{RenderError, RenderResult};

const WINDOW_LENGTH: usize = 2048;
const HOP_ANALYSIS: usize = WINDOW_LENGTH / 4;

pub trait PitchTimeTransform {
    /// Stretch `samples` by `stretch` and shift by `semitone_shift`
    /// semitones, independently.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TransformFailure`] if the resampler backing
    /// the pitch-correction step cannot be constructed or run.
    fn transform(&self, samples: &[f32], stretch: f64, semitone_shift: i32) -> RenderResult<Vec<f32>>;
}

/// Time-stretches the whole combined ratio via phase vocoder, then resamples
/// by the inverse of the pitch factor to undo the portion of that stretch
/// that was supposed to land as a pitch shift rather than a duration change.
pub struct PhaseVocoderTransform;

impl PitchTimeTransform for PhaseVocoderTransform {
    fn transform(&self, samples: &[f32], stretch: f64, semitone_shift: i32) -> RenderResult<Vec<f32>> {
        if samples.len() < WINDOW_LENGTH {
            return Ok(samples.to_vec());
        }

        let pitch_factor = 2f64.powf(f64::from(semitone_shift) / 12.0);
        let combined_ratio = stretch * pitch_factor;
        let stretched = phase_vocoder_stretch(samples, combined_ratio);
        let stretched: Vec<f32> = stretched.into_iter().map(|sample| sample as f32).collect();

        if (pitch_factor - 1.0).abs() < 1e-9 {
            return Ok(stretched);
        }

        // TODO: correct the spectral envelope (e.g. cepstral liftering) before
        // this resample so that vocal formants don't shift along with pitch.
        let mut resampler = FastFixedIn::<f32>::new(1.0 / pitch_factor, 1.0, PolynomialDegree::Cubic, stretched.len(), 1)
            .map_err(|error| RenderError::TransformFailure(error.to_string()))?;
        let output = resampler.process(&[&stretched], None).map_err(|error| RenderError::TransformFailure(error.to_string()))?;
        Ok(output.into_iter().next().unwrap_or_default())
    }
}

fn hann_window(length: usize) -> Vec<f64> {
    (0..length).map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / (length - 1) as f64).cos()).collect()
}

/// Time-stretch `samples` by `ratio` (output duration ≈ input duration ×
/// `ratio`) while preserving pitch, via STFT phase-vocoder resynthesis.
fn phase_vocoder_stretch(samples: &[f32], ratio: f64) -> Vec<f64> {
    let window = hann_window(WINDOW_LENGTH);
    let hop_synthesis = ((HOP_ANALYSIS as f64) * ratio).round().max(1.0) as usize;
    let n_frames = (samples.len() - WINDOW_LENGTH) / HOP_ANALYSIS + 1;
    let output_len = n_frames.saturating_sub(1) * hop_synthesis + WINDOW_LENGTH;

    let mut output = vec![0.0_f64; output_len];
    let mut window_energy = vec![0.0_f64; output_len];

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(WINDOW_LENGTH);
    let ifft = planner.plan_fft_inverse(WINDOW_LENGTH);

    let n_bins = WINDOW_LENGTH / 2 + 1;
    let mut last_phase = vec![0.0_f64; n_bins];
    let mut accumulated_phase = vec![0.0_f64; n_bins];
    let expected_advance: Vec<f64> = (0..n_bins).map(|bin| 2.0 * std::f64::consts::PI * bin as f64 * HOP_ANALYSIS as f64 / WINDOW_LENGTH as f64).collect();

    for frame in 0..n_frames {
        let start = frame * HOP_ANALYSIS;
        let mut spectrum: Vec<Complex64> = (0..WINDOW_LENGTH).map(|i| Complex64::new(f64::from(samples[start + i]) * window[i], 0.0)).collect();
        fft.process(&mut spectrum);

        let mut resynthesis = vec![Complex64::new(0.0, 0.0); WINDOW_LENGTH];
        for bin in 0..n_bins {
            let (magnitude, phase) = spectrum[bin].to_polar();
            let mut phase_delta = phase - last_phase[bin] - expected_advance[bin];
            phase_delta -= 2.0 * std::f64::consts::PI * (phase_delta / (2.0 * std::f64::consts::PI)).round();
            let true_frequency = expected_advance[bin] + phase_delta;
            last_phase[bin] = phase;
            accumulated_phase[bin] += true_frequency * (hop_synthesis as f64 / HOP_ANALYSIS as f64);
            resynthesis[bin] = Complex64::from_polar(magnitude, accumulated_phase[bin]);
            if bin > 0 && bin < WINDOW_LENGTH / 2 {
                resynthesis[WINDOW_LENGTH - bin] = resynthesis[bin].conj();
            }
        }
        ifft.process(&mut resynthesis);

        let out_start = frame * hop_synthesis;
        for i in 0..WINDOW_LENGTH {
            output[out_start + i] += resynthesis[i].re / WINDOW_LENGTH as f64 * window[i];
            window_energy[out_start + i] += window[i] * window[i];
        }
    }

    for (sample, energy) in output.iter_mut().zip(window_energy.iter()) {
        if *energy > 1e-8 {
            *sample /= energy;
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n).map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin()).collect()
    }

    #[test]
    fn identity_transform_roughly_preserves_length() {
        let samples = sine(440.0, 1.0, 44_100);
        let out = PhaseVocoderTransform.transform(&samples, 1.0, 0).unwrap();
        let ratio = out.len() as f64 / samples.len() as f64;
        assert!((ratio - 1.0).abs() < 0.05, "ratio was {ratio}");
    }

    #[test]
    fn time_stretch_changes_duration_proportionally() {
        let samples = sine(440.0, 1.0, 44_100);
        let out = PhaseVocoderTransform.transform(&samples, 1.5, 0).unwrap();
        let ratio = out.len() as f64 / samples.len() as f64;
        assert!((ratio - 1.5).abs() < 0.1, "ratio was {ratio}");
    }

    #[test]
    fn short_input_is_returned_unchanged() {
        let samples = vec![0.0_f32; 10];
        let out = PhaseVocoderTransform.transform(&samples, 1.2, 2).unwrap();
        assert_eq!(out.len(), samples.len());
    }

    #[test]
    fn pitch_shift_output_is_finite() {
        let samples = sine(220.0, 0.5, 44_100);
        let out = PhaseVocoderTransform.transform(&samples, 0.8, -3).unwrap();
        assert!(!out.is_empty());
        assert!(out.iter().all(|sample| sample.is_finite()));
    }
}
