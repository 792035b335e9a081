//! Bundled artifact extraction
//!
//! The language-server payload ships inside the installed package and must
//! be materialized to disk before an interpreter can run it. Extraction is
//! lazy and happens at most once per cache lifetime; the temp directory is
//! dropped (and the payload removed) together with the cache.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{LauncherError, Result};

/// Default payload filename
pub const ARTIFACT_NAME: &str = "language_server.pyz";

/// Where the payload comes from
#[derive(Debug, Clone)]
pub enum ArtifactSource {
    /// Bytes compiled into the host adapter (`include_bytes!`)
    Embedded(&'static [u8]),
    /// A file shipped next to the installed package
    File(PathBuf),
}

/// Lazily extracts the bundled payload and caches the extracted path
pub struct ArtifactCache {
    name: String,
    source: ArtifactSource,
    extracted: OnceCell<(TempDir, PathBuf)>,
}

impl ArtifactCache {
    /// Cache for the default payload name
    pub fn new(source: ArtifactSource) -> Self {
        Self::with_name(ARTIFACT_NAME, source)
    }

    /// Cache for a custom payload name
    pub fn with_name(name: impl Into<String>, source: ArtifactSource) -> Self {
        Self {
            name: name.into(),
            source,
            extracted: OnceCell::new(),
        }
    }

    /// Materialize the payload to a temp path, extracting on first call
    ///
    /// A missing or unreadable payload is a packaging defect and yields
    /// [`LauncherError::ArtifactMissing`].
    pub async fn materialize(&self) -> Result<&Path> {
        let (_, path) = self
            .extracted
            .get_or_try_init(|| async { self.extract() })
            .await?;
        Ok(path.as_path())
    }

    fn extract(&self) -> Result<(TempDir, PathBuf)> {
        let bytes = match &self.source {
            ArtifactSource::Embedded(bytes) => {
                if bytes.is_empty() {
                    return Err(self.missing("embedded payload is empty"));
                }
                bytes.to_vec()
            }
            ArtifactSource::File(path) => {
                debug!(source = %path.display(), "Reading bundled payload");
                std::fs::read(path)
                    .map_err(|e| self.missing(&format!("cannot read {:?}: {}", path, e)))?
            }
        };

        let dir = tempfile::Builder::new()
            .prefix("aegis-server")
            .tempdir()
            .map_err(|e| self.missing(&format!("cannot create temp dir: {}", e)))?;

        let target = dir.path().join(&self.name);
        std::fs::write(&target, bytes)
            .map_err(|e| self.missing(&format!("cannot write {:?}: {}", target, e)))?;

        info!(path = %target.display(), "Bundled server payload extracted");
        Ok((dir, target))
    }

    fn missing(&self, detail: &str) -> LauncherError {
        LauncherError::ArtifactMissing {
            resource: self.name.clone(),
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extract_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join(ARTIFACT_NAME);
        std::fs::write(&source, b"payload").unwrap();

        let cache = ArtifactCache::new(ArtifactSource::File(source));
        let path = cache.materialize().await.unwrap();

        assert!(path.is_file());
        assert_eq!(std::fs::read(path).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_extraction_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join(ARTIFACT_NAME);
        std::fs::write(&source, b"payload").unwrap();

        let cache = ArtifactCache::new(ArtifactSource::File(source.clone()));
        let first = cache.materialize().await.unwrap().to_path_buf();

        // Removing the source after first extraction must not matter
        std::fs::remove_file(&source).unwrap();
        let second = cache.materialize().await.unwrap().to_path_buf();

        assert_eq!(first, second);
        assert!(second.is_file());
    }

    #[tokio::test]
    async fn test_missing_payload_is_artifact_missing() {
        let cache = ArtifactCache::new(ArtifactSource::File(PathBuf::from(
            "/nonexistent/language_server.pyz",
        )));

        let err = cache.materialize().await.unwrap_err();
        assert!(matches!(err, LauncherError::ArtifactMissing { .. }));
    }

    #[tokio::test]
    async fn test_empty_embedded_payload_rejected() {
        let cache = ArtifactCache::new(ArtifactSource::Embedded(&[]));
        let err = cache.materialize().await.unwrap_err();
        assert!(matches!(err, LauncherError::ArtifactMissing { .. }));
    }

    #[tokio::test]
    async fn test_embedded_payload_extracted() {
        static PAYLOAD: &[u8] = b"#!/usr/bin/env python\n";
        let cache = ArtifactCache::new(ArtifactSource::Embedded(PAYLOAD));

        let path = cache.materialize().await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), PAYLOAD);
    }
}
