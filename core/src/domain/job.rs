//! The job value object the orchestrator manages (data model §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{mix::MixParams, plan::Plan, recipe::Recipe};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobInputs {
    pub stem_a_uris: std::collections::BTreeMap<String, String>,
    pub stem_b_uris: std::collections::BTreeMap<String, String>,
    pub recipe: Recipe,
    pub mix: MixParams,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOutputs {
    pub mashup_uri: Option<String>,
    pub project_uri: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    /// Advisory progress in `[0, 1]`, not an exact measure.
    pub progress: f64,
    pub message: String,
    pub inputs: JobInputs,
    pub plan: Option<Plan>,
    pub outputs: JobOutputs,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    #[must_use]
    pub fn new(inputs: JobInputs, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            progress: 0.0,
            message: "queued".to_string(),
            inputs,
            plan: None,
            outputs: JobOutputs::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
