//! Handling for `mashup render ...`: registers local stem files into a
//! throwaway artifact store, runs a render job in-process through
//! [`mashup_daemon::Orchestrator`], and writes the published artifacts to
//! disk.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mashup_core::domain::{Job, JobInputs, JobStatus, StemKind};
use mashup_daemon::{ArtifactStore, LocalFilesystemStore, Orchestrator, RenderSettings};
use uuid::Uuid;

use super::{RenderArgs, printing};

const POLL_INTERVAL: Duration = Duration::from_millis(150);

fn register_track(store: &LocalFilesystemStore, track: &str, stems: [(&str, &Path); 4]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut uris = BTreeMap::new();
    for (name, path) in stems {
        let bytes = std::fs::read(path).map_err(|e| anyhow::anyhow!("could not read {track} {name} stem at {}: {e}", path.display()))?;
        let uri = store.put(&format!("input/{track}/{name}.wav"), &bytes)?;
        uris.insert(name.to_string(), uri);
    }
    Ok(uris)
}

impl RenderArgs {
    pub async fn handle(&self, settings: &mashup_core::config::Settings) -> i32 {
        match self.run(settings).await {
            Ok(code) => code,
            Err(error) => {
                eprintln!("{error}");
                1
            }
        }
    }

    async fn run(&self, settings: &mashup_core::config::Settings) -> anyhow::Result<i32> {
        let workdir = tempfile::Builder::new().prefix("mashup-cli-").tempdir()?;
        let store = Arc::new(LocalFilesystemStore::new(workdir.path().join("artifacts"))?);

        let stem_a_uris = register_track(
            &store,
            "a",
            [
                (StemKind::Vocals.as_str(), self.a.vocals.as_path()),
                (StemKind::Drums.as_str(), self.a.drums.as_path()),
                (StemKind::Bass.as_str(), self.a.bass.as_path()),
                (StemKind::Other.as_str(), self.a.other.as_path()),
            ],
        )?;
        let stem_b_uris = register_track(
            &store,
            "b",
            [
                (StemKind::Vocals.as_str(), self.b.vocals.as_path()),
                (StemKind::Drums.as_str(), self.b.drums.as_path()),
                (StemKind::Bass.as_str(), self.b.bass.as_path()),
                (StemKind::Other.as_str(), self.b.other.as_path()),
            ],
        )?;

        let inputs = JobInputs { stem_a_uris, stem_b_uris, recipe: self.recipe.into(), mix: self.mix_params() };

        let render_settings = RenderSettings { sample_rate: settings.render.sample_rate, target_lufs: settings.render.target_lufs, headroom_db: settings.render.headroom_db };
        let orchestrator = Orchestrator::new(Arc::clone(&store) as Arc<dyn ArtifactStore>, settings.daemon.worker_pool_size, render_settings, workdir.path().join("scratch"));

        let id = orchestrator.submit(inputs).await;
        println!("job {id} queued");

        let job = await_completion(&orchestrator, id).await?;

        match job.status {
            JobStatus::Completed => {
                std::fs::create_dir_all(&self.output)?;
                let mashup_uri = job.outputs.mashup_uri.as_deref().ok_or_else(|| anyhow::anyhow!("completed job has no mashup artifact"))?;
                let project_uri = job.outputs.project_uri.as_deref().ok_or_else(|| anyhow::anyhow!("completed job has no project artifact"))?;

                std::fs::write(self.output.join("mashup.wav"), store.get(mashup_uri)?)?;
                std::fs::write(self.output.join("project.json"), store.get(project_uri)?)?;

                if let Some(summary) = printing::plan_summary(&job) {
                    println!("{summary}");
                }
                println!("wrote {}", self.output.join("mashup.wav").display());
                Ok(0)
            }
            JobStatus::Failed if job.message == "cancelled" => {
                eprintln!("job {id} cancelled");
                Ok(130)
            }
            JobStatus::Failed => {
                eprintln!("job {id} failed: {}", job.message);
                Ok(2)
            }
            JobStatus::Queued | JobStatus::Processing => unreachable!("await_completion only returns a terminal job"),
        }
    }
}

/// Poll the registry for progress until the job reaches a terminal status,
/// requesting cancellation if the user sends ctrl-c while waiting.
async fn await_completion(orchestrator: &Orchestrator, id: Uuid) -> anyhow::Result<Job> {
    let mut last_message = String::new();
    loop {
        let job = orchestrator.registry().get(id).await.ok_or_else(|| anyhow::anyhow!("job {id} vanished from the registry"))?;

        if job.message != last_message {
            println!("{}", printing::progress_line(&job));
            last_message.clone_from(&job.message);
        }

        if job.status.is_terminal() {
            return Ok(job);
        }

        tokio::select! {
            () = tokio::time::sleep(POLL_INTERVAL) => {}
            result = tokio::signal::ctrl_c() => {
                result?;
                eprintln!("interrupted, cancelling job {id}...");
                orchestrator.cancel(id).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn register_track_reads_each_stem_and_returns_its_uri() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFilesystemStore::new(dir.path().join("artifacts")).unwrap();

        let vocals_path = dir.path().join("vocals.wav");
        std::fs::write(&vocals_path, b"vocals-bytes").unwrap();
        let drums_path = dir.path().join("drums.wav");
        std::fs::write(&drums_path, b"drums-bytes").unwrap();
        let bass_path = dir.path().join("bass.wav");
        std::fs::write(&bass_path, b"bass-bytes").unwrap();
        let other_path = dir.path().join("other.wav");
        std::fs::write(&other_path, b"other-bytes").unwrap();

        let uris = register_track(
            &store,
            "a",
            [("vocals", vocals_path.as_path()), ("drums", drums_path.as_path()), ("bass", bass_path.as_path()), ("other", other_path.as_path())],
        )
        .unwrap();

        assert_eq!(uris.len(), 4);
        assert_eq!(store.get(&uris["vocals"]).unwrap(), b"vocals-bytes");
    }

    #[test]
    fn register_track_fails_fast_on_a_missing_stem_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFilesystemStore::new(dir.path().join("artifacts")).unwrap();

        let missing = dir.path().join("does-not-exist.wav");
        let result = register_track(&store, "a", [("vocals", missing.as_path()), ("drums", missing.as_path()), ("bass", missing.as_path()), ("other", missing.as_path())]);

        assert!(result.is_err());
    }
}
