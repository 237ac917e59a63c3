//! The job registry: a single-writer (the orchestrator), multi-reader
//! (progress queries) in-memory map keyed by job id (§4.4).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use mashup_core::domain::{Job, JobOutputs, JobStatus, Plan};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.id, job);
    }

    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&id).cloned()
    }

    pub async fn set_progress(&self, id: Uuid, progress: f64, message: impl Into<String>) {
        if let Some(job) = self.jobs.write().await.get_mut(&id) {
            job.progress = progress;
            job.message = message.into();
            job.updated_at = Utc::now();
        }
    }

    pub async fn set_plan(&self, id: Uuid, plan: Plan) {
        if let Some(job) = self.jobs.write().await.get_mut(&id) {
            job.plan = Some(plan);
            job.updated_at = Utc::now();
        }
    }

    pub async fn set_processing(&self, id: Uuid) {
        if let Some(job) = self.jobs.write().await.get_mut(&id) {
            job.status = JobStatus::Processing;
            job.updated_at = Utc::now();
        }
    }

    pub async fn set_completed(&self, id: Uuid, outputs: JobOutputs) {
        if let Some(job) = self.jobs.write().await.get_mut(&id) {
            job.status = JobStatus::Completed;
            job.progress = 1.0;
            job.message = "completed".to_string();
            job.outputs = outputs;
            job.updated_at = Utc::now();
        }
    }

    pub async fn set_failed(&self, id: Uuid, message: impl Into<String>) {
        if let Some(job) = self.jobs.write().await.get_mut(&id) {
            job.status = JobStatus::Failed;
            job.message = message.into();
            job.updated_at = Utc::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mashup_core::domain::{JobInputs, MixParams, Recipe};
    use pretty_assertions::assert_eq;

    fn inputs() -> JobInputs {
        JobInputs { stem_a_uris: std::collections::BTreeMap::new(), stem_b_uris: std::collections::BTreeMap::new(), recipe: Recipe::AoverB, mix: MixParams::default() }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let registry = JobRegistry::new();
        let job = Job::new(inputs(), Utc::now());
        let id = job.id;
        registry.insert(job).await;

        let fetched = registry.get(id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn set_completed_updates_status_and_progress() {
        let registry = JobRegistry::new();
        let job = Job::new(inputs(), Utc::now());
        let id = job.id;
        registry.insert(job).await;

        registry.set_completed(id, JobOutputs { mashup_uri: Some("file:///a".to_string()), project_uri: Some("file:///b".to_string()) }).await;

        let fetched = registry.get(id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
        assert_eq!(fetched.progress, 1.0);
        assert_eq!(fetched.outputs.mashup_uri.as_deref(), Some("file:///a"));
    }

    #[tokio::test]
    async fn get_on_an_unknown_id_returns_none() {
        let registry = JobRegistry::new();
        assert!(registry.get(Uuid::new_v4()).await.is_none());
    }
}
