//! Human-readable quality hints, keyed off the compatibility scores,
//! stretch quality, and section-pairing count. Order is stable.

use mashup_core::domain::{Compatibility, SectionPair, StretchMap, StretchQuality};

use crate::target_key::MANUAL_ADJUSTMENT_HINT;

const GOOD_SECTION_PAIR_COUNT: usize = 3;

#[must_use]
pub fn quality_hints(compatibility: &Compatibility, stretch: &StretchMap, pairs: &[SectionPair], needs_manual_key_adjustment: bool) -> Vec<String> {
    let mut hints = Vec::with_capacity(5);

    hints.push(
        if compatibility.key_score <= 1 {
            "Excellent key compatibility"
        } else if compatibility.key_score <= 2 {
            "Good key compatibility"
        } else {
            "Consider key adjustment for better harmony"
        }
        .to_string(),
    );

    hints.push(if compatibility.tempo_score <= 1 { "Tempo alignment looks good" } else { "Significant tempo adjustment needed" }.to_string());

    hints.push(
        match stretch.quality {
            StretchQuality::High => "Minimal tempo stretching required",
            StretchQuality::Medium => "Moderate tempo stretching - check audio quality",
        }
        .to_string(),
    );

    hints.push(if pairs.len() >= GOOD_SECTION_PAIR_COUNT { "Good structural alignment found" } else { "Limited structural overlap - consider manual alignment" }.to_string());

    if needs_manual_key_adjustment {
        hints.push(MANUAL_ADJUSTMENT_HINT.to_string());
    }

    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compat(key_score: u8, tempo_score: u8) -> Compatibility {
        Compatibility { key_score, tempo_score, structure_score: 0, overall: 0.0 }
    }

    fn stretch(quality: StretchQuality) -> StretchMap {
        StretchMap { target_bpm: 120.0, stretch_a: 1.0, stretch_b: 1.0, quality }
    }

    #[test]
    fn hints_are_emitted_in_a_stable_order() {
        let hints = quality_hints(&compat(0, 0), &stretch(StretchQuality::High), &[], false);
        assert_eq!(hints.len(), 4);
        assert_eq!(hints[0], "Excellent key compatibility");
        assert_eq!(hints[1], "Tempo alignment looks good");
        assert_eq!(hints[2], "Minimal tempo stretching required");
        assert_eq!(hints[3], "Limited structural overlap - consider manual alignment");
    }

    #[test]
    fn manual_key_adjustment_hint_is_appended_last_when_flagged() {
        let hints = quality_hints(&compat(5, 0), &stretch(StretchQuality::Medium), &[], true);
        assert_eq!(hints.last().unwrap(), MANUAL_ADJUSTMENT_HINT);
    }
}
