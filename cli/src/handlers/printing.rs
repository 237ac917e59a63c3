//! Handles displaying job progress and the resulting plan in a human-readable
//! format.

use mashup_core::domain::Job;

/// A single advisory progress line, e.g. `[ 45%] planning`.
#[must_use]
pub fn progress_line(job: &Job) -> String {
    format!("[{:>3}%] {}", (job.progress * 100.0).round() as i64, job.message)
}

/// A short summary of the chosen plan, once the planner has produced one.
#[must_use]
pub fn plan_summary(job: &Job) -> Option<String> {
    let plan = job.plan.as_ref()?;
    Some(format!(
        "recipe={} target_key={} shift_a={:+} shift_b={:+} stretch_a={:.3} stretch_b={:.3} overall={:.0}%",
        plan.recipe,
        plan.target_key,
        plan.shift_a,
        plan.shift_b,
        plan.stretch.stretch_a,
        plan.stretch.stretch_b,
        plan.compatibility.overall * 100.0,
    ))
}
