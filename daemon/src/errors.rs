//! The orchestrator's error taxonomy: stem fetch/artifact-store I/O,
//! cancellation, and pass-through from the analysis/planner/render stages
//! (§7 error handling design).

use mashup_analysis::errors::AnalysisError;
use mashup_core::errors::MashupError;
use mashup_planner::errors::PlannerError;
use mashup_render::errors::RenderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("failed to fetch stem artifact {uri}: {source}")]
    ArtifactFetch { uri: String, source: std::io::Error },
    #[error("failed to publish artifact {key}: {source}")]
    ArtifactPublish { key: String, source: std::io::Error },
    #[error("job was cancelled")]
    Cancelled,
    #[error("missing stem input: {0}")]
    MissingStemUri(String),
    #[error("scratch directory error: {0}")]
    Scratch(#[from] std::io::Error),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl OrchestratorError {
    /// Whether this failure is worth retrying (transient I/O), as opposed
    /// to a deterministic failure that will recur on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ArtifactFetch { .. } | Self::ArtifactPublish { .. })
    }
}

impl From<OrchestratorError> for MashupError {
    #[inline]
    fn from(error: OrchestratorError) -> Self {
        match error {
            OrchestratorError::ArtifactFetch { .. } | OrchestratorError::ArtifactPublish { .. } | OrchestratorError::Scratch(_) => Self::ArtifactIo,
            OrchestratorError::Cancelled => Self::Cancelled,
            OrchestratorError::MissingStemUri(_) => Self::InvalidAudio,
            OrchestratorError::Analysis(inner) => inner.into(),
            OrchestratorError::Planner(inner) => inner.into(),
            OrchestratorError::Render(inner) => inner.into(),
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
