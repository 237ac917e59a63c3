//! The artifact store: write-once-per-key blob storage (§4.4). Named so a
//! local-filesystem implementation and a future networked/S3-compatible one
//! are interchangeable; only the local implementation ships here, the same
//! way the spec treats the object store as an external collaborator beyond
//! this in-process default.

use std::path::PathBuf;

use crate::errors::{OrchestratorError, OrchestratorResult};

/// Write-once-per-key blob storage, keyed by an opaque string (here, a
/// job id and artifact name joined together).
pub trait ArtifactStore: Send + Sync {
    /// Fetch the bytes a `uri` (as produced by an earlier [`Self::put`], or
    /// supplied externally as an input stem location) refers to.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ArtifactFetch`] if the underlying read fails.
    fn get(&self, uri: &str) -> OrchestratorResult<Vec<u8>>;

    /// Store `bytes` under `key`, returning the URI it can later be
    /// fetched from.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ArtifactPublish`] if the underlying write fails.
    fn put(&self, key: &str, bytes: &[u8]) -> OrchestratorResult<String>;
}

/// A single-node `ArtifactStore` backed by a root directory on the local
/// filesystem. URIs are `file://<absolute path>`.
#[derive(Debug, Clone)]
pub struct LocalFilesystemStore {
    root: PathBuf,
}

impl LocalFilesystemStore {
    /// # Errors
    ///
    /// Returns an [`std::io::Error`] if `root` does not exist and cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn uri_to_path(uri: &str) -> PathBuf {
        uri.strip_prefix("file://").map_or_else(|| PathBuf::from(uri), PathBuf::from)
    }
}

impl ArtifactStore for LocalFilesystemStore {
    fn get(&self, uri: &str) -> OrchestratorResult<Vec<u8>> {
        let path = Self::uri_to_path(uri);
        std::fs::read(&path).map_err(|source| OrchestratorError::ArtifactFetch { uri: uri.to_string(), source })
    }

    fn put(&self, key: &str, bytes: &[u8]) -> OrchestratorResult<String> {
        let path = self.key_to_path(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| OrchestratorError::ArtifactPublish { key: key.to_string(), source })?;
        }
        std::fs::write(&path, bytes).map_err(|source| OrchestratorError::ArtifactPublish { key: key.to_string(), source })?;
        Ok(format!("file://{}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFilesystemStore::new(dir.path()).unwrap();

        let uri = store.put("job-1/mashup.wav", b"hello").unwrap();
        assert!(uri.starts_with("file://"));

        let bytes = store.get(&uri).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn get_on_a_missing_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFilesystemStore::new(dir.path()).unwrap();

        let result = store.get("file:///does/not/exist");
        assert!(result.is_err());
    }

    #[test]
    fn put_creates_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFilesystemStore::new(dir.path()).unwrap();

        let uri = store.put("a/b/c.bin", b"data").unwrap();
        let bytes = store.get(&uri).unwrap();
        assert_eq!(bytes, b"data");
    }
}
