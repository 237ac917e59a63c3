//! Error types for the render pipeline.

use mashup_core::errors::MashupError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("missing stem: {0}")]
    MissingStem(String),

    #[error("pitch/time transform failed: {0}")]
    TransformFailure(String),

    #[error("dsp stage failed: {0}")]
    InternalDsp(String),

    #[error("wav output failed: {0}")]
    Wav(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<hound::Error> for RenderError {
    #[inline]
    fn from(error: hound::Error) -> Self {
        Self::Wav(error.to_string())
    }
}

impl From<RenderError> for MashupError {
    #[inline]
    fn from(error: RenderError) -> Self {
        match error {
            RenderError::MissingStem(_) => Self::InvalidAudio,
            RenderError::TransformFailure(_) => Self::TransformFailure,
            RenderError::InternalDsp(_) => Self::InternalDsp,
            RenderError::Wav(_) | RenderError::Io(_) => Self::ArtifactIo,
        }
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
