//! Compatibility scoring, target-key selection, tempo alignment, and
//! section pairing for a two-track mashup.
//!
//! Planning is pure given two analyses and a recipe: no I/O, no shared
//! state, and the same inputs always produce the same plan.

#![deny(clippy::missing_inline_in_public_items)]

pub mod compatibility;
pub mod errors;
pub mod quality_hints;
pub mod section_pairing;
pub mod target_key;
pub mod tempo;

use std::str::FromStr;

use errors::{PlannerError, PlannerResult};
use log::{debug, info};
use mashup_core::domain::{Analysis, Plan, Recipe};

/// Build a plan from two analyses and a recipe. Recipe selection cannot
/// fail here since `Recipe` is already a closed, typed enum; see
/// [`plan_from_recipe_name`] for the string boundary where an unrecognized
/// recipe name is possible.
#[must_use]
#[allow(clippy::missing_inline_in_public_items)]
pub fn plan(analysis_a: &Analysis, analysis_b: &Analysis, recipe: Recipe) -> Plan {
    debug!("planning {recipe} for tracks at {} and {} bpm", analysis_a.bpm, analysis_b.bpm);
    let compatibility = compatibility::compatibility(analysis_a, analysis_b);

    let target_key = target_key::choose_target_key(&analysis_a.camelot, &analysis_b.camelot);
    let shift_a = target_key::shift_for(&analysis_a.camelot, &target_key);
    let shift_b = target_key::shift_for(&analysis_b.camelot, &target_key);

    let stretch = tempo::align_tempo(analysis_a.bpm, analysis_b.bpm);

    let section_pairs = section_pairing::pair_sections(&analysis_a.sections, &analysis_b.sections, &analysis_a.beats, &analysis_b.beats);

    let needs_manual_key_adjustment = shift_a.needs_manual_adjustment_hint || shift_b.needs_manual_adjustment_hint;
    let quality_hints = quality_hints::quality_hints(&compatibility, &stretch, &section_pairs, needs_manual_key_adjustment);

    info!("planned {recipe} -> target key {target_key}, overall compatibility {}", compatibility.overall);
    Plan {
        recipe,
        target_key,
        shift_a: shift_a.semitones,
        shift_b: shift_b.semitones,
        stretch,
        section_pairs,
        quality_hints,
        compatibility,
    }
}

/// Parse `recipe` by name and build a plan.
///
/// # Errors
///
/// Returns [`PlannerError::UnknownRecipe`] if `recipe` does not name one of
/// the fixed recipes (`AoverB`, `BoverA`, `HybridDrums`).
#[allow(clippy::missing_inline_in_public_items)]
pub fn plan_from_recipe_name(analysis_a: &Analysis, analysis_b: &Analysis, recipe: &str) -> PlannerResult<Plan> {
    let parsed = Recipe::from_str(recipe).map_err(|()| PlannerError::UnknownRecipe(recipe.to_string()))?;
    Ok(plan(analysis_a, analysis_b, parsed))
}
