//! The job orchestrator: accepts a render request, fetches and decodes its
//! stems, runs analysis → planning → rendering on a bounded worker pool,
//! and publishes the resulting artifacts (§4.4, §5).
//!
//! Per-job state lives in three places: the [`JobRegistry`] (status,
//! progress, the chosen plan, outputs), a per-job [`CancelToken`] (checked
//! at the stage boundaries below), and a per-job scratch directory created
//! with [`tempfile::Builder::tempdir_in`] — its `Drop` impl removes the
//! directory on every exit path (success, failure, or cancellation).

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use mashup_analysis::decoder::{Decoder as _, PcmDecoder};
use mashup_core::domain::{Job, JobInputs, JobOutputs, StemKind};
use tokio::sync::{RwLock, Semaphore};
use uuid::Uuid;

use crate::artifact_store::ArtifactStore;
use crate::cancellation::{CancelHandle, CancelToken, cancellation_pair};
use crate::errors::{OrchestratorError, OrchestratorResult};
use crate::registry::JobRegistry;
use crate::retry::with_retry;

/// `core::config::RenderSettings`'s fields, restated here so this crate
/// doesn't need to depend on `config`/`serde` just to read three numbers.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub sample_rate: u32,
    pub target_lufs: f64,
    pub headroom_db: f64,
}

async fn run_blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    match tokio::task::spawn_blocking(f).await {
        Ok(value) => value,
        Err(join_error) => std::panic::resume_unwind(join_error.into_panic()),
    }
}

fn sum_stem_set(stems: &mashup_render::mixing::StemSet) -> Vec<f32> {
    let len = [stems.vocals.len(), stems.drums.len(), stems.bass.len(), stems.other.len()].into_iter().max().unwrap_or(0);
    let mut mixed = vec![0.0_f32; len];
    for stem in [&stems.vocals, &stems.drums, &stems.bass, &stems.other] {
        for (out, sample) in mixed.iter_mut().zip(stem.iter()) {
            *out += *sample;
        }
    }
    mixed
}

async fn fetch_stem_set(store: &Arc<dyn ArtifactStore>, job_dir: &Path, track_label: &str, uris: &BTreeMap<String, String>) -> OrchestratorResult<mashup_render::mixing::StemSet> {
    let mut set = mashup_render::mixing::StemSet::default();
    for stem in StemKind::ALL {
        let name = stem.as_str();
        let uri = uris.get(name).ok_or_else(|| OrchestratorError::MissingStemUri(format!("{track_label} {name}")))?.clone();

        let store = Arc::clone(store);
        let bytes = with_retry(&format!("fetch {track_label} {name}"), || {
            let store = Arc::clone(&store);
            let uri = uri.clone();
            async move { run_blocking(move || store.get(&uri)).await }
        })
        .await?;

        let scratch_path = job_dir.join(format!("{track_label}_{name}.wav"));
        std::fs::write(&scratch_path, &bytes)?;

        let samples = run_blocking(move || PcmDecoder::decode(&scratch_path)).await?.samples;

        match stem {
            StemKind::Vocals => set.vocals = samples,
            StemKind::Drums => set.drums = samples,
            StemKind::Bass => set.bass = samples,
            StemKind::Other => set.other = samples,
        }
    }
    Ok(set)
}

async fn publish(store: &Arc<dyn ArtifactStore>, key: &str, bytes: Vec<u8>) -> OrchestratorResult<String> {
    let store = Arc::clone(store);
    let key = key.to_string();
    with_retry("publish artifact", || {
        let store = Arc::clone(&store);
        let key = key.clone();
        let bytes = bytes.clone();
        async move { run_blocking(move || store.put(&key, &bytes)).await }
    })
    .await
}

#[allow(clippy::too_many_arguments)]
async fn run_job(id: Uuid, inputs: &JobInputs, store: &Arc<dyn ArtifactStore>, settings: RenderSettings, temp_root: &Path, cancel: &CancelToken, registry: &JobRegistry) -> OrchestratorResult<JobOutputs> {
    std::fs::create_dir_all(temp_root)?;
    let job_dir = tempfile::Builder::new().prefix(&format!("mashup-{id}-")).tempdir_in(temp_root)?;

    registry.set_progress(id, 0.05, "fetching stems").await;
    let stems_a = fetch_stem_set(store, job_dir.path(), "a", &inputs.stem_a_uris).await?;
    let stems_b = fetch_stem_set(store, job_dir.path(), "b", &inputs.stem_b_uris).await?;
    if cancel.is_cancelled() {
        return Err(OrchestratorError::Cancelled);
    }

    registry.set_progress(id, 0.25, "analyzing tracks").await;
    let sample_rate = settings.sample_rate;
    // The separation model only hands us four stems per track, never the
    // original full mix, so a synthesized mono sum stands in for the
    // whole-track signal analysis needs (beat/key/structure detection
    // doesn't care which bus a given frequency came from).
    let track_a_mono = sum_stem_set(&stems_a);
    let track_b_mono = sum_stem_set(&stems_b);
    let (analysis_a, analysis_b) = run_blocking(move || (mashup_analysis::analyze(&track_a_mono, sample_rate), mashup_analysis::analyze(&track_b_mono, sample_rate))).await;
    let analysis_a = analysis_a?;
    let analysis_b = analysis_b?;
    if cancel.is_cancelled() {
        return Err(OrchestratorError::Cancelled);
    }

    registry.set_progress(id, 0.45, "planning").await;
    let plan = mashup_planner::plan(&analysis_a, &analysis_b, inputs.recipe);
    registry.set_plan(id, plan.clone()).await;
    if cancel.is_cancelled() {
        return Err(OrchestratorError::Cancelled);
    }

    registry.set_progress(id, 0.6, "rendering").await;
    let mix = inputs.mix;
    let render_settings = mashup_render::RenderSettings { sample_rate: settings.sample_rate, target_lufs: settings.target_lufs, headroom_db: settings.headroom_db };
    let plan_for_render = plan.clone();
    let output = run_blocking(move || {
        let transform = mashup_render::pitch_time::PhaseVocoderTransform;
        let render_inputs = mashup_render::RenderInputs { stems_a, stems_b };
        mashup_render::render(&plan_for_render, &mix, render_inputs, &render_settings, &transform)
    })
    .await?;
    if cancel.is_cancelled() {
        return Err(OrchestratorError::Cancelled);
    }
    if !output.quality_hints.is_empty() {
        debug!("job {id} quality hints: {:?}", output.quality_hints);
    }

    registry.set_progress(id, 0.9, "publishing artifacts").await;
    let mut wav_bytes = Vec::new();
    {
        let mut cursor = std::io::Cursor::new(&mut wav_bytes);
        let samples_f64: Vec<f64> = output.samples.iter().map(|s| f64::from(*s)).collect();
        mashup_render::wav::write_wav(&mut cursor, &samples_f64, output.sample_rate)?;
    }
    let project_json = serde_json::to_vec_pretty(&output.project).expect("project descriptor is always serializable");

    let mashup_uri = publish(store, &format!("{id}/mashup.wav"), wav_bytes).await?;
    let project_uri = publish(store, &format!("{id}/project.json"), project_json).await?;

    Ok(JobOutputs { mashup_uri: Some(mashup_uri), project_uri: Some(project_uri) })
}

/// Runs submitted jobs on a bounded worker pool (§5: one dedicated worker
/// per job, at most `worker_pool_size` running at once).
pub struct Orchestrator {
    registry: JobRegistry,
    store: Arc<dyn ArtifactStore>,
    semaphore: Arc<Semaphore>,
    settings: RenderSettings,
    temp_root: PathBuf,
    cancel_handles: Arc<RwLock<HashMap<Uuid, CancelHandle>>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(store: Arc<dyn ArtifactStore>, worker_pool_size: NonZeroUsize, settings: RenderSettings, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            registry: JobRegistry::new(),
            store,
            semaphore: Arc::new(Semaphore::new(worker_pool_size.get())),
            settings,
            temp_root: temp_root.into(),
            cancel_handles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Queue a job and spawn its worker task once a pool slot is free.
    /// Returns the job id immediately; the caller polls [`Self::registry`]
    /// for progress.
    pub async fn submit(&self, inputs: JobInputs) -> Uuid {
        let job = Job::new(inputs, Utc::now());
        let id = job.id;
        let job_inputs = job.inputs.clone();
        self.registry.insert(job).await;

        let (handle, token) = cancellation_pair();
        self.cancel_handles.write().await.insert(id, handle);

        let registry = self.registry.clone();
        let store = Arc::clone(&self.store);
        let semaphore = Arc::clone(&self.semaphore);
        let settings = self.settings;
        let temp_root = self.temp_root.clone();

        tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("worker pool semaphore should never be closed");
            registry.set_processing(id).await;
            info!("job {id} started");

            match run_job(id, &job_inputs, &store, settings, &temp_root, &token, &registry).await {
                Ok(outputs) => {
                    info!("job {id} completed");
                    registry.set_completed(id, outputs).await;
                }
                Err(OrchestratorError::Cancelled) => {
                    warn!("job {id} cancelled");
                    registry.set_failed(id, "cancelled").await;
                }
                Err(error) => {
                    warn!("job {id} failed: {error}");
                    registry.set_failed(id, error.to_string()).await;
                }
            }
        });

        id
    }

    /// Request cancellation of `id`. Takes effect at the next stage
    /// boundary (§5); in-flight DSP within the current stage still runs
    /// to completion.
    pub async fn cancel(&self, id: Uuid) {
        if let Some(handle) = self.cancel_handles.read().await.get(&id) {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact_store::LocalFilesystemStore;
    use mashup_core::domain::{MixParams, Recipe};
    use std::time::Duration;

    fn settings() -> RenderSettings {
        RenderSettings { sample_rate: 44_100, target_lufs: -14.0, headroom_db: 1.0 }
    }

    fn write_stem_wav(store: &LocalFilesystemStore, key: &str, seconds: f64, freq: f64) -> String {
        let sample_rate = 44_100_u32;
        let n = (seconds * f64::from(sample_rate)) as usize;
        let samples: Vec<f64> = (0..n).map(|i| 0.2 * (2.0 * std::f64::consts::PI * freq * i as f64 / f64::from(sample_rate)).sin()).collect();
        let mut buffer = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut buffer);
            mashup_render::wav::write_wav(&mut cursor, &samples, sample_rate).unwrap();
        }
        store.put(key, &buffer).unwrap()
    }

    fn job_inputs(store: &LocalFilesystemStore) -> JobInputs {
        let mut stem_a_uris = BTreeMap::new();
        stem_a_uris.insert("vocals".to_string(), write_stem_wav(store, "in/a_vocals.wav", 3.0, 440.0));
        stem_a_uris.insert("drums".to_string(), write_stem_wav(store, "in/a_drums.wav", 3.0, 90.0));
        stem_a_uris.insert("bass".to_string(), write_stem_wav(store, "in/a_bass.wav", 3.0, 110.0));
        stem_a_uris.insert("other".to_string(), write_stem_wav(store, "in/a_other.wav", 3.0, 220.0));

        let mut stem_b_uris = BTreeMap::new();
        stem_b_uris.insert("vocals".to_string(), write_stem_wav(store, "in/b_vocals.wav", 3.0, 450.0));
        stem_b_uris.insert("drums".to_string(), write_stem_wav(store, "in/b_drums.wav", 3.0, 95.0));
        stem_b_uris.insert("bass".to_string(), write_stem_wav(store, "in/b_bass.wav", 3.0, 115.0));
        stem_b_uris.insert("other".to_string(), write_stem_wav(store, "in/b_other.wav", 3.0, 230.0));

        JobInputs { stem_a_uris, stem_b_uris, recipe: Recipe::AoverB, mix: MixParams::default() }
    }

    #[tokio::test]
    async fn submitting_a_job_with_missing_stems_fails_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalFilesystemStore::new(dir.path().join("artifacts")).unwrap());
        let orchestrator = Orchestrator::new(store, NonZeroUsize::new(1).unwrap(), settings(), dir.path().join("scratch"));

        let inputs = JobInputs { stem_a_uris: BTreeMap::new(), stem_b_uris: BTreeMap::new(), recipe: Recipe::AoverB, mix: MixParams::default() };
        let id = orchestrator.submit(inputs).await;

        for _ in 0..50 {
            let job = orchestrator.registry().get(id).await.unwrap();
            if job.status.is_terminal() {
                assert_eq!(job.status, mashup_core::domain::JobStatus::Failed);
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job never reached a terminal state");
    }

    #[tokio::test]
    async fn cancelling_a_job_before_it_starts_still_lets_it_terminate_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalFilesystemStore::new(dir.path().join("artifacts")).unwrap());
        let orchestrator = Orchestrator::new(store.clone(), NonZeroUsize::new(1).unwrap(), settings(), dir.path().join("scratch"));

        let id = orchestrator.submit(job_inputs(&store)).await;
        orchestrator.cancel(id).await;

        for _ in 0..200 {
            let job = orchestrator.registry().get(id).await.unwrap();
            if job.status.is_terminal() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job never reached a terminal state");
    }
}
