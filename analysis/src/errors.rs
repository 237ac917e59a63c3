use mashup_core::errors::MashupError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to open file: {0}")]
    FileOpen(#[from] std::io::Error),
    #[error("failed to decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("failed to resample audio: {0}")]
    Resample(#[from] rubato::ResampleError),
    #[error("failed to construct resampler: {0}")]
    ResamplerConstruction(#[from] rubato::ResamplerConstructionError),
    #[error("audio source duration is unknown or infinite")]
    IndeterminateDuration,
    #[error("input is shorter than the minimum analysis window")]
    TooShort,
    #[error("internal DSP failure: {0}")]
    Internal(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl From<AnalysisError> for MashupError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::TooShort => Self::TooShort,
            AnalysisError::FileOpen(_) | AnalysisError::Decode(_) => Self::InvalidAudio,
            AnalysisError::Resample(_) | AnalysisError::ResamplerConstruction(_) => {
                Self::InvalidAudio
            }
            AnalysisError::IndeterminateDuration | AnalysisError::Internal(_) => Self::InternalDsp,
        }
    }
}
