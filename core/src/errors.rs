//! The error taxonomy shared across the pipeline.
//!
//! Each crate defines its own `thiserror` error enum for the failures it can
//! produce (see `mashup_analysis::errors::AnalysisError`,
//! `mashup_planner::errors::PlannerError`, `mashup_render::errors::RenderError`,
//! `mashup_daemon::errors::OrchestratorError`) and converts into this taxonomy
//! at the CLI/orchestrator boundary, where only the category and exit code
//! matter.

use thiserror::Error;

/// The directory lookup failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("could not determine the data directory")]
    Data,
    #[error("could not determine the config directory")]
    Config,
}

/// The stage-tagged error categories from the error handling design, bounded
/// and user-facing. No file paths or internal details leak into `Display`.
#[derive(Error, Debug)]
pub enum MashupError {
    #[error("invalid audio input")]
    InvalidAudio,
    #[error("input too short to analyze")]
    TooShort,
    #[error("unknown recipe")]
    UnknownRecipe,
    #[error("stem transform failed, falling back to identity")]
    TransformFailure,
    #[error("loudness meter unavailable, using RMS fallback")]
    LoudnessMeterUnavailable,
    #[error("artifact I/O failed")]
    ArtifactIo,
    #[error("job cancelled")]
    Cancelled,
    #[error("internal DSP failure")]
    InternalDsp,
}

impl MashupError {
    /// The process exit code this error should surface as (see the exit
    /// conditions table): 1 for user error, 2 for DSP/internal failure, 3 for
    /// I/O failure. `Cancelled` and the two locally-recovered variants never
    /// reach the CLI boundary as a hard failure and have no meaningful code.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidAudio | Self::TooShort | Self::UnknownRecipe => 1,
            Self::InternalDsp | Self::TransformFailure | Self::LoudnessMeterUnavailable => 2,
            Self::ArtifactIo => 3,
            Self::Cancelled => 130,
        }
    }

    /// Whether this category is recovered locally by the stage that raised it
    /// (the pipeline continues, with a quality hint recorded) rather than
    /// aborting the job.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::TransformFailure | Self::LoudnessMeterUnavailable)
    }
}
