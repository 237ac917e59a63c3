//! Compatibility scoring between two tracks: key, tempo, and structure.
//!
//! All three scores are small non-negative integers, 0 best; `overall` is
//! their arithmetic mean, kept as a float.

use std::collections::HashMap;

use mashup_core::domain::{Analysis, Camelot, Compatibility, Section, SectionLabel};

fn bucket_key_distance(distance: u8) -> u8 {
    match distance {
        0 => 0,
        1 => 1,
        2 => 2,
        3 | 4 => 3,
        5 | 6 => 4,
        _ => 5,
    }
}

#[must_use]
pub fn key_compatibility(a: &Camelot, b: &Camelot) -> u8 {
    bucket_key_distance(a.ring_distance(b))
}

/// Tempo ratio buckets, widest-acceptable-range last: a ratio inside the
/// excellent band is also inside the good and acceptable ones, so check
/// narrowest first.
#[must_use]
pub fn tempo_compatibility(bpm_a: f64, bpm_b: f64) -> u8 {
    let ratio = bpm_a / bpm_b;
    if (0.8..=1.25).contains(&ratio) {
        0
    } else if (0.7..=1.4).contains(&ratio) {
        1
    } else if (0.6..=1.6).contains(&ratio) {
        2
    } else {
        3
    }
}

fn label_counts(sections: &[Section]) -> HashMap<SectionLabel, usize> {
    let mut counts = HashMap::new();
    for section in sections {
        *counts.entry(section.label).or_insert(0) += 1;
    }
    counts
}

/// Jaccard similarity over the multisets of section labels, bucketed.
#[must_use]
pub fn structure_compatibility(sections_a: &[Section], sections_b: &[Section]) -> u8 {
    let counts_a = label_counts(sections_a);
    let counts_b = label_counts(sections_b);

    let all_labels = [SectionLabel::Verse, SectionLabel::Chorus, SectionLabel::Bridge];
    let intersection: usize = all_labels
        .iter()
        .map(|label| counts_a.get(label).copied().unwrap_or(0).min(counts_b.get(label).copied().unwrap_or(0)))
        .sum();
    let union: usize = all_labels
        .iter()
        .map(|label| counts_a.get(label).copied().unwrap_or(0).max(counts_b.get(label).copied().unwrap_or(0)))
        .sum();

    if union == 0 {
        return 0;
    }
    let similarity = intersection as f64 / union as f64;
    if similarity >= 0.8 {
        0
    } else if similarity >= 0.6 {
        1
    } else if similarity >= 0.4 {
        2
    } else {
        3
    }
}

#[must_use]
pub fn compatibility(a: &Analysis, b: &Analysis) -> Compatibility {
    let key_score = key_compatibility(&a.camelot, &b.camelot);
    let tempo_score = tempo_compatibility(a.bpm, b.bpm);
    let structure_score = structure_compatibility(&a.sections, &b.sections);
    let overall = f64::from(u32::from(key_score) + u32::from(tempo_score) + u32::from(structure_score)) / 3.0;
    Compatibility { key_score, tempo_score, structure_score, overall }
}
