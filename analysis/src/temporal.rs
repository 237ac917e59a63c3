//! Beat and downbeat tracking.
//!
//! Onset-strength envelope -> tempo estimate via autocorrelation -> dynamic
//! programming beat tracker (Ellis, "Beat Tracking by Dynamic Programming"),
//! and downbeats picked as the loudest beat in each run of four.

use crate::utils::stft;

pub const HOP_LENGTH: usize = 512;
pub const WINDOW_LENGTH: usize = 2048;

const MIN_BPM: f64 = 60.0;
const MAX_BPM: f64 = 180.0;
const TIGHTNESS: f64 = 100.0;

/// Tempogram window, in onset-envelope frames (~4.5s at `HOP_LENGTH`/44.1kHz).
const TEMPOGRAM_WINDOW_FRAMES: usize = 384;

/// Frame-wise onset strength: positive spectral flux of the magnitude STFT,
/// summed across frequency bins, mean-centered.
#[must_use]
pub fn onset_strength(samples: &[f32], sample_rate: u32) -> Vec<f64> {
    let _ = sample_rate;
    let spectrogram = stft(samples, WINDOW_LENGTH, HOP_LENGTH);
    let n_frames = spectrogram.ncols();
    if n_frames < 2 {
        return vec![0.0; n_frames];
    }

    let mut envelope = vec![0.0_f64; n_frames];
    for frame in 1..n_frames {
        let mut flux = 0.0_f64;
        for bin in 0..spectrogram.nrows() {
            let diff = spectrogram[[bin, frame]] - spectrogram[[bin, frame - 1]];
            if diff > 0.0 {
                flux += diff;
            }
        }
        envelope[frame] = flux;
    }
    envelope[0] = envelope.get(1).copied().unwrap_or(0.0);

    let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;
    envelope.iter_mut().for_each(|v| *v -= mean);
    envelope
}

/// Dominant tempo in BPM: the autocorrelation lag of the onset envelope
/// with the largest response inside `[MIN_BPM, MAX_BPM]`.
#[must_use]
pub fn estimate_tempo(onset_env: &[f64], sample_rate: u32) -> f64 {
    let frame_rate = f64::from(sample_rate) / HOP_LENGTH as f64;
    let min_lag = (60.0 * frame_rate / MAX_BPM).floor().max(1.0) as usize;
    let max_lag = (60.0 * frame_rate / MIN_BPM).ceil() as usize;
    let max_lag = max_lag.min(onset_env.len().saturating_sub(1));

    if onset_env.len() < 2 || min_lag >= max_lag {
        return 120.0;
    }

    let mut best_lag = min_lag;
    let mut best_score = f64::MIN;
    for lag in min_lag..=max_lag {
        let mut score = 0.0;
        for i in 0..(onset_env.len() - lag) {
            score += onset_env[i] * onset_env[i + lag];
        }
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }

    60.0 * frame_rate / best_lag as f64
}

/// Frame-wise autocorrelation tempogram: column `i` is the local, mean-
/// centered autocorrelation of the onset envelope over a
/// [`TEMPOGRAM_WINDOW_FRAMES`]-frame neighborhood centered on frame `i`,
/// at lags `0..window`.
#[must_use]
pub fn tempogram(onset_env: &[f64]) -> Vec<Vec<f64>> {
    let n = onset_env.len();
    if n == 0 {
        return Vec::new();
    }
    let window = TEMPOGRAM_WINDOW_FRAMES.min(n);
    let half = window / 2;

    (0..n)
        .map(|center| {
            let start = center.saturating_sub(half);
            let end = (center + half).min(n);
            let frame = &onset_env[start..end];
            let mean = frame.iter().sum::<f64>() / frame.len() as f64;

            (0..window)
                .map(|lag| {
                    if lag >= frame.len() {
                        return 0.0;
                    }
                    (0..frame.len() - lag)
                        .map(|i| (frame[i] - mean) * (frame[i + lag] - mean))
                        .sum::<f64>()
                })
                .collect()
        })
        .collect()
}

/// Refine a coarse tempo estimate by taking the frame-wise mean of the
/// tempogram across its tempo (lag) axis and returning the BPM of its
/// argmax bin, restricted to `[MIN_BPM, MAX_BPM]`.
#[must_use]
fn refine_tempo_from_tempogram(onset_env: &[f64], sample_rate: u32) -> Option<f64> {
    let gram = tempogram(onset_env);
    let window = gram.first()?.len();
    if window == 0 {
        return None;
    }

    let mut mean_by_lag = vec![0.0_f64; window];
    for column in &gram {
        for (lag, &value) in column.iter().enumerate() {
            mean_by_lag[lag] += value;
        }
    }
    for value in &mut mean_by_lag {
        *value /= gram.len() as f64;
    }

    let frame_rate = f64::from(sample_rate) / HOP_LENGTH as f64;
    let min_lag = (60.0 * frame_rate / MAX_BPM).floor().max(1.0) as usize;
    let max_lag = ((60.0 * frame_rate / MIN_BPM).ceil() as usize).min(window - 1);
    if min_lag >= max_lag {
        return None;
    }

    let (best_lag, _) = (min_lag..=max_lag)
        .map(|lag| (lag, mean_by_lag[lag]))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    Some(60.0 * frame_rate / best_lag as f64)
}

/// Backtrack the DP beat tracker from its highest-scoring endpoint,
/// returning beat positions as frame indices.
fn dp_beat_track(onset_env: &[f64], period_frames: f64) -> Vec<usize> {
    let n = onset_env.len();
    if n == 0 {
        return Vec::new();
    }

    let mut cum_score = vec![0.0_f64; n];
    let mut backlink = vec![-1_i64; n];

    let search_start = (period_frames / 2.0).floor().max(1.0) as i64;
    let search_end = (period_frames * 2.0).ceil() as i64;

    for i in 0..n {
        let mut best_score = f64::MIN;
        let mut best_tau = -1_i64;
        for delta in search_start..=search_end {
            let tau = i as i64 - delta;
            if tau < 0 {
                continue;
            }
            let log_ratio = (delta as f64 / period_frames).ln();
            let penalty = -TIGHTNESS * log_ratio * log_ratio;
            let score = cum_score[tau as usize] + penalty;
            if score > best_score {
                best_score = score;
                best_tau = tau;
            }
        }

        cum_score[i] = if best_tau >= 0 {
            onset_env[i] + best_score
        } else {
            onset_env[i]
        };
        backlink[i] = best_tau;
    }

    let mut tail = (0..n)
        .max_by(|&a, &b| cum_score[a].total_cmp(&cum_score[b]))
        .unwrap_or(0);

    let mut beats = Vec::new();
    loop {
        beats.push(tail);
        let prev = backlink[tail];
        if prev < 0 {
            break;
        }
        tail = prev as usize;
    }
    beats.reverse();
    beats
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BeatTrack {
    pub bpm: f64,
    pub beats_s: Vec<f64>,
    pub downbeats_s: Vec<f64>,
}

/// Run the full beat-tracking pipeline against a mono PCM buffer.
#[must_use]
pub fn track_beats(samples: &[f32], sample_rate: u32) -> BeatTrack {
    let onset_env = onset_strength(samples, sample_rate);
    if onset_env.len() < 4 {
        return BeatTrack::default();
    }

    let coarse_tempo = estimate_tempo(&onset_env, sample_rate);
    let frame_rate = f64::from(sample_rate) / HOP_LENGTH as f64;
    let period_frames = 60.0 * frame_rate / coarse_tempo;

    let beat_frames = dp_beat_track(&onset_env, period_frames);
    let beats_s: Vec<f64> = beat_frames
        .iter()
        .map(|&f| f as f64 * HOP_LENGTH as f64 / f64::from(sample_rate))
        .collect();

    let downbeats_s = pick_downbeats(&beat_frames, &onset_env, &beats_s);

    let tempo = refine_tempo_from_tempogram(&onset_env, sample_rate).unwrap_or(coarse_tempo);

    BeatTrack {
        bpm: tempo,
        beats_s,
        downbeats_s,
    }
}

/// Every run of (up to) four beats contributes its loudest onset as a
/// downbeat candidate.
fn pick_downbeats(beat_frames: &[usize], onset_env: &[f64], beats_s: &[f64]) -> Vec<f64> {
    beat_frames
        .chunks(4)
        .enumerate()
        .filter_map(|(chunk_index, chunk)| {
            let (offset, _) = chunk
                .iter()
                .enumerate()
                .max_by(|(_, &a), (_, &b)| onset_env[a].total_cmp(&onset_env[b]))?;
            beats_s.get(chunk_index * 4 + offset).copied()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Synthetic click track: short decaying tone bursts at a fixed period,
    /// so the STFT-based onset detector has a clear transient to grab onto.
    fn click_track(bpm: f64, sample_rate: u32, n_beats: usize) -> Vec<f32> {
        let period_s = 60.0 / bpm;
        let period_samples = (period_s * f64::from(sample_rate)) as usize;
        let mut samples = vec![0.0_f32; period_samples * n_beats + sample_rate as usize];
        for beat in 0..n_beats {
            let start = beat * period_samples;
            let end = (start + 800).min(samples.len());
            for (i, sample) in samples[start..end].iter_mut().enumerate() {
                let t = i as f32 / sample_rate as f32;
                *sample = (1.0 - i as f32 / 800.0) * (2.0 * std::f32::consts::PI * 2000.0 * t).sin();
            }
        }
        samples
    }

    #[test]
    fn estimated_tempo_is_close_to_the_click_track_bpm_or_an_octave_of_it() {
        let sample_rate = 44_100;
        let samples = click_track(120.0, sample_rate, 40);
        let track = track_beats(&samples, sample_rate);
        assert!(
            (track.bpm - 120.0).abs() < 6.0
                || (track.bpm * 2.0 - 120.0).abs() < 6.0
                || (track.bpm - 120.0 * 2.0).abs() < 6.0,
            "expected ~120bpm (or an octave of it), got {}",
            track.bpm
        );
    }

    #[test]
    fn beats_are_monotonically_increasing() {
        let sample_rate = 44_100;
        let samples = click_track(100.0, sample_rate, 32);
        let track = track_beats(&samples, sample_rate);
        assert!(track.beats_s.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn downbeats_are_a_subset_of_beats() {
        let sample_rate = 44_100;
        let samples = click_track(128.0, sample_rate, 48);
        let track = track_beats(&samples, sample_rate);
        for db in &track.downbeats_s {
            assert!(track.beats_s.iter().any(|b| (b - db).abs() < 1e-9));
        }
    }

    #[test]
    fn empty_signal_yields_empty_track() {
        let track = track_beats(&[], 44_100);
        assert_eq!(track, BeatTrack::default());
    }

    #[test]
    fn tempogram_refinement_agrees_with_the_coarse_estimate_on_a_click_track() {
        let sample_rate = 44_100;
        let samples = click_track(120.0, sample_rate, 60);
        let onset_env = onset_strength(&samples, sample_rate);
        let coarse = estimate_tempo(&onset_env, sample_rate);
        let refined = refine_tempo_from_tempogram(&onset_env, sample_rate).unwrap();
        assert!(
            (refined - coarse).abs() < 6.0 || (refined * 2.0 - coarse).abs() < 6.0 || (refined - coarse * 2.0).abs() < 6.0,
            "expected refined tempo {refined} to be close to coarse {coarse} (or an octave of it)"
        );
    }

    #[test]
    fn tempogram_of_empty_envelope_is_empty() {
        assert!(tempogram(&[]).is_empty());
    }
}
