//! Segment Bundle Store: the only component allowed to touch a bundle
//! directory. Append-only from outside, read-only from the request path.

use std::path::{Path, PathBuf};

use super::index::SegmentIndex;
use super::metadata::{BundleMetadata, ChannelManifest};
use crate::error::{AppError, AppResult};

/// Result of the four-clause completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleState {
    Absent,
    Partial,
    Complete,
}

/// Filesystem-backed home for every channel's segment bundles.
pub struct BundleStore {
    cache_dir: PathBuf,
}

impl BundleStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn bundle_dir(&self, slug: &str, fingerprint: &str) -> PathBuf {
        self.cache_dir
            .join("channels")
            .join(slug)
            .join("videos")
            .join(fingerprint)
    }

    fn manifest_path(&self, slug: &str) -> PathBuf {
        self.cache_dir.join("channels").join(slug).join("manifest.json")
    }

    /// A bundle is complete iff its index is present, contains the
    /// end-of-list marker, lists at least one segment, every listed
    /// segment file exists on disk, and the metadata record is present.
    /// Anything short of that is partial, never absent-with-an-excuse.
    pub async fn exists(&self, slug: &str, fingerprint: &str) -> BundleState {
        let dir = self.bundle_dir(slug, fingerprint);
        let index_path = dir.join("index.m3u8");
        let metadata_path = dir.join("metadata.json");

        let index_text = match tokio::fs::read_to_string(&index_path).await {
            Ok(t) => t,
            Err(_) => {
                return if dir.exists() {
                    BundleState::Partial
                } else {
                    BundleState::Absent
                }
            }
        };

        let index = SegmentIndex::parse(&index_text);
        if !index.end_of_list || index.segments.is_empty() {
            return BundleState::Partial;
        }

        for seg in &index.segments {
            if !dir.join(&seg.filename).exists() {
                return BundleState::Partial;
            }
        }

        if tokio::fs::metadata(&metadata_path).await.is_err() {
            return BundleState::Partial;
        }

        BundleState::Complete
    }

    /// Best-effort deletion of a partial bundle's files and directory.
    pub async fn reap(&self, slug: &str, fingerprint: &str) -> std::io::Result<()> {
        let dir = self.bundle_dir(slug, fingerprint);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Idempotent mkdir-all; returns the writable bundle directory.
    pub async fn create(&self, slug: &str, fingerprint: &str) -> std::io::Result<PathBuf> {
        let dir = self.bundle_dir(slug, fingerprint);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Parse a complete bundle's index and metadata. Caller is expected to
    /// have already established the bundle is `Complete`.
    pub async fn open(&self, slug: &str, fingerprint: &str) -> AppResult<(SegmentIndex, BundleMetadata)> {
        let dir = self.bundle_dir(slug, fingerprint);
        let index_text = tokio::fs::read_to_string(dir.join("index.m3u8")).await?;
        let metadata_text = tokio::fs::read_to_string(dir.join("metadata.json")).await?;
        let metadata: BundleMetadata = serde_json::from_str(&metadata_text)?;
        let index = SegmentIndex::parse(&index_text);
        if !index.end_of_list || index.segments.is_empty() {
            return Err(AppError::Bundle(format!(
                "bundle {}/{} is not complete",
                slug, fingerprint
            )));
        }
        Ok((index, metadata))
    }

    pub async fn load_manifest(&self, slug: &str) -> ChannelManifest {
        match tokio::fs::read_to_string(self.manifest_path(slug)).await {
            Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
            Err(_) => ChannelManifest::default(),
        }
    }

    pub async fn save_manifest(&self, slug: &str, manifest: &ChannelManifest) -> AppResult<()> {
        let path = self.manifest_path(slug);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(manifest)?;
        tokio::fs::write(path, text).await?;
        Ok(())
    }
}
