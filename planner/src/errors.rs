//! The planner's error taxonomy.

use mashup_core::errors::MashupError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("unknown recipe: {0}")]
    UnknownRecipe(String),
}

impl From<PlannerError> for MashupError {
    fn from(error: PlannerError) -> Self {
        match error {
            PlannerError::UnknownRecipe(_) => Self::UnknownRecipe,
        }
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
