//! Tempo alignment: pick a shared target BPM and each track's stretch ratio.

use mashup_core::domain::{StretchMap, StretchQuality};

const MIN_STRETCH: f64 = 0.5;
const MAX_STRETCH: f64 = 2.0;
const HIGH_QUALITY_STRETCH_CEILING: f64 = 1.5;

/// `target_bpm` is the faster of the two tracks; each stretch ratio is
/// `target_bpm / bpm`, clamped to `[0.5, 2.0]`.
#[must_use]
pub fn align_tempo(bpm_a: f64, bpm_b: f64) -> StretchMap {
    let target_bpm = bpm_a.max(bpm_b);
    let stretch_a = (target_bpm / bpm_a).clamp(MIN_STRETCH, MAX_STRETCH);
    let stretch_b = (target_bpm / bpm_b).clamp(MIN_STRETCH, MAX_STRETCH);
    let quality = if stretch_a.max(stretch_b) < HIGH_QUALITY_STRETCH_CEILING {
        StretchQuality::High
    } else {
        StretchQuality::Medium
    };
    StretchMap { target_bpm, stretch_a, stretch_b, quality }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn target_bpm_is_the_faster_track() {
        let stretch = align_tempo(120.0, 140.0);
        assert_eq!(stretch.target_bpm, 140.0);
    }

    #[test]
    fn identical_tempos_need_no_stretch() {
        let stretch = align_tempo(128.0, 128.0);
        assert_eq!(stretch.stretch_a, 1.0);
        assert_eq!(stretch.stretch_b, 1.0);
        assert_eq!(stretch.quality, StretchQuality::High);
    }

    #[test]
    fn extreme_ratios_clamp_to_the_stretch_bounds() {
        let stretch = align_tempo(60.0, 240.0);
        assert!(stretch.stretch_a <= 2.0);
        assert_eq!(stretch.stretch_a, 2.0);
    }

    #[test]
    fn max_stretch_is_nondecreasing_as_the_tempo_gap_widens() {
        let mut previous = 0.0;
        for bpm_b in [125.0, 140.0, 180.0, 240.0] {
            let stretch = align_tempo(120.0, bpm_b);
            let max_stretch = stretch.stretch_a.max(stretch.stretch_b);
            assert!(max_stretch >= previous, "{max_stretch} should be >= {previous} at bpm_b={bpm_b}");
            previous = max_stretch;
        }
    }
}
