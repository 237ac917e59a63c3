//! Section pairing by dynamic time warping over `(duration, label, position)`
//! feature vectors.

use mashup_core::domain::{Section, SectionLabel, SectionPair};

/// Confidence is a fixed placeholder (design notes, open question 1's
/// sibling for section pairing: a real confidence would come from the DTW
/// cost itself, not a constant).
const PAIR_CONFIDENCE: f64 = 0.8;

fn label_id(label: SectionLabel) -> f64 {
    match label {
        SectionLabel::Verse => 0.0,
        SectionLabel::Chorus => 1.0,
        SectionLabel::Bridge => 2.0,
    }
}

fn feature(section: &Section, last_beat: f64) -> [f64; 3] {
    let duration = section.end - section.start;
    let normalized_start = if last_beat > 0.0 { section.start / last_beat } else { 0.0 };
    [duration, label_id(section.label), normalized_start]
}

fn euclidean(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

/// Standard DTW with unit step weights; backtrack from `(m, n)` preferring
/// the diagonal predecessor on ties.
#[must_use]
pub fn pair_sections(sections_a: &[Section], sections_b: &[Section], beats_a: &[f64], beats_b: &[f64]) -> Vec<SectionPair> {
    if sections_a.is_empty() || sections_b.is_empty() {
        return Vec::new();
    }

    let last_beat_a = beats_a.last().copied().unwrap_or(0.0);
    let last_beat_b = beats_b.last().copied().unwrap_or(0.0);
    let features_a: Vec<[f64; 3]> = sections_a.iter().map(|s| feature(s, last_beat_a)).collect();
    let features_b: Vec<[f64; 3]> = sections_b.iter().map(|s| feature(s, last_beat_b)).collect();

    let (m, n) = (features_a.len(), features_b.len());
    let mut distance = vec![vec![0.0; n]; m];
    for (i, fa) in features_a.iter().enumerate() {
        for (j, fb) in features_b.iter().enumerate() {
            distance[i][j] = euclidean(fa, fb);
        }
    }

    let mut dtw = vec![vec![f64::INFINITY; n + 1]; m + 1];
    dtw[0][0] = 0.0;
    for i in 1..=m {
        for j in 1..=n {
            let step = dtw[i - 1][j].min(dtw[i][j - 1]).min(dtw[i - 1][j - 1]);
            dtw[i][j] = distance[i - 1][j - 1] + step;
        }
    }

    let mut trace = Vec::new();
    let (mut i, mut j) = (m, n);
    while i > 0 && j > 0 {
        trace.push((i - 1, j - 1));
        let (diag, up, left) = (dtw[i - 1][j - 1], dtw[i - 1][j], dtw[i][j - 1]);
        if diag <= up && diag <= left {
            i -= 1;
            j -= 1;
        } else if up <= left {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    trace.reverse();

    trace
        .into_iter()
        .map(|(a, b)| SectionPair { section_index_a: a, section_index_b: b, confidence: PAIR_CONFIDENCE })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn section(start: f64, end: f64, label: SectionLabel) -> Section {
        Section { start, end, label }
    }

    #[test]
    fn empty_inputs_pair_to_nothing() {
        assert!(pair_sections(&[], &[], &[], &[]).is_empty());
        let a = vec![section(0.0, 1.0, SectionLabel::Verse)];
        assert!(pair_sections(&a, &[], &[1.0], &[]).is_empty());
    }

    #[test]
    fn identical_structures_pair_index_for_index() {
        let sections = vec![
            section(0.0, 10.0, SectionLabel::Verse),
            section(10.0, 20.0, SectionLabel::Chorus),
            section(20.0, 30.0, SectionLabel::Verse),
        ];
        let beats = vec![0.0, 30.0];
        let pairs = pair_sections(&sections, &sections, &beats, &beats);
        assert_eq!(pairs.len(), 3);
        for (index, pair) in pairs.iter().enumerate() {
            assert_eq!(pair.section_index_a, index);
            assert_eq!(pair.section_index_b, index);
        }
    }

    #[test]
    fn pairing_is_monotonic_in_both_indices() {
        let sections_a = vec![
            section(0.0, 10.0, SectionLabel::Verse),
            section(10.0, 20.0, SectionLabel::Chorus),
            section(20.0, 35.0, SectionLabel::Bridge),
        ];
        let sections_b = vec![
            section(0.0, 12.0, SectionLabel::Verse),
            section(12.0, 18.0, SectionLabel::Chorus),
        ];
        let beats_a = vec![0.0, 35.0];
        let beats_b = vec![0.0, 18.0];
        let pairs = pair_sections(&sections_a, &sections_b, &beats_a, &beats_b);
        assert!(!pairs.is_empty());
        for window in pairs.windows(2) {
            assert!(window[1].section_index_a >= window[0].section_index_a);
            assert!(window[1].section_index_b >= window[0].section_index_b);
        }
        assert_eq!(pairs.last().unwrap().section_index_a, sections_a.len() - 1);
        assert_eq!(pairs.last().unwrap().section_index_b, sections_b.len() - 1);
    }
}
