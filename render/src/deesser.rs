//! De-esser: a 5 kHz highpass drives sibilance detection, and samples where
//! sibilance exceeds the threshold are reduced by 6 dB. Runs on the
//! finished mix, after ducking, since sibilance isn't a per-stem property.

use mashup_analysis::biquad::{Biquad, FilterType};

use crate::filtfilt::filtfilt;

const SIBILANCE_HZ: f64 = 5000.0;
const SIBILANCE_THRESHOLD: f64 = 0.1;
const REDUCTION_DB: f64 = -6.0;

#[must_use]
pub fn apply_deesser(mix: &[f64], sample_rate: f64) -> Vec<f64> {
    let highpass = Biquad::design(FilterType::Highpass, sample_rate, SIBILANCE_HZ, 0.707, 0.0);
    let sibilance_band = filtfilt(&[highpass], mix);
    let reduction_factor = 10f64.powf(REDUCTION_DB / 20.0);

    mix.iter()
        .zip(&sibilance_band)
        .map(|(sample, sibilance)| if sibilance.abs() > SIBILANCE_THRESHOLD { sample * reduction_factor } else { *sample })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deesser_preserves_length() {
        let mix = vec![0.2; 4096];
        let out = apply_deesser(&mix, 44_100.0);
        assert_eq!(out.len(), mix.len());
    }

    #[test]
    fn a_loud_high_frequency_tone_is_attenuated() {
        let sample_rate = 44_100.0;
        let n = 8192;
        let tone: Vec<f64> = (0..n).map(|i| (2.0 * std::f64::consts::PI * 8000.0 * i as f64 / sample_rate).sin()).collect();
        let out = apply_deesser(&tone, sample_rate);
        let input_peak = tone.iter().cloned().fold(0.0_f64, |a, b| a.max(b.abs()));
        let output_peak = out.iter().cloned().fold(0.0_f64, |a, b| a.max(b.abs()));
        assert!(output_peak < input_peak * 0.9, "input_peak={input_peak} output_peak={output_peak}");
    }

    #[test]
    fn a_quiet_signal_under_the_threshold_passes_through() {
        let mix = vec![0.01; 4096];
        let out = apply_deesser(&mix, 44_100.0);
        assert_eq!(out, mix);
    }
}
