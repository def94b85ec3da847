//! Channel Pool: the registry of every configured channel, swapped in
//! whole on a definitions reload so request handlers never observe a
//! half-rebuilt set of channels.

use std::collections::HashMap;
use std::sync::Arc;

use crate::bundle::{BundleStore, ChannelManifest};

use super::compiled::{self, CompiledProgram};
use super::definitions::ChannelDefinition;
use super::program::ChannelProgram;
use super::runtime::ChannelRuntime;

/// Everything the server and scheduler need for one configured channel.
pub struct ChannelEntry {
    pub definition: ChannelDefinition,
    pub program: ChannelProgram,
    pub compiled: CompiledProgram,
    pub manifest: ChannelManifest,
    pub runtime: ChannelRuntime,
}

/// A point-in-time registry of all channels, keyed by slug. Immutable
/// once built — a reload builds a whole new `ChannelPool` and the
/// holder swaps the `Arc` atomically, so readers in flight keep seeing
/// a consistent snapshot.
#[derive(Default)]
pub struct ChannelPool {
    entries: HashMap<String, ChannelEntry>,
}

impl ChannelPool {
    /// Build a fresh pool: one `ChannelProgram` + compiled program per
    /// definition, each with a freshly-constructed (unstarted) runtime.
    pub async fn build(definitions: &[ChannelDefinition], store: &BundleStore) -> Self {
        let mut entries = HashMap::with_capacity(definitions.len());
        for def in definitions {
            let program = ChannelProgram::build(def);
            let compiled = compiled::compile(&program, store, &def.slug).await;
            let manifest = store.load_manifest(&def.slug).await;
            entries.insert(
                def.slug.clone(),
                ChannelEntry {
                    definition: def.clone(),
                    program,
                    compiled,
                    manifest,
                    runtime: ChannelRuntime::new(),
                },
            );
        }
        Self { entries }
    }

    pub fn get(&self, slug: &str) -> Option<&ChannelEntry> {
        self.entries.get(slug)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start every channel's runtime, in the order they appear in the
    /// definitions file. Called once at startup and again after a
    /// definitions reload rebuilds the pool.
    pub async fn start_all(&self) {
        for entry in self.entries.values() {
            entry.runtime.start().await;
        }
    }

    /// Recompile one channel's `CompiledProgram` against the current
    /// bundle store and swap it in, in place. Called after the
    /// Pre-Generation Scheduler completes a transcode for this channel,
    /// so a channel becomes (or stays) broadcastable as soon as a bundle
    /// completes, per spec.md §3 Lifecycle — no-op if `slug` isn't in
    /// this pool (e.g. it was dropped by a definitions reload that raced
    /// with an in-flight transcode).
    pub async fn recompile(&mut self, slug: &str, store: &BundleStore) {
        let Some(program) = self.entries.get(slug).map(|entry| entry.program.clone()) else {
            return;
        };
        let compiled = compiled::compile(&program, store, slug).await;
        let manifest = store.load_manifest(slug).await;
        if let Some(entry) = self.entries.get_mut(slug) {
            entry.compiled = compiled;
            entry.manifest = manifest;
        }
    }
}

pub type SharedChannelPool = Arc<tokio::sync::RwLock<ChannelPool>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::definitions::ChannelType;

    #[tokio::test]
    async fn test_build_empty_definitions() {
        let dir = std::env::temp_dir().join(format!("bcast_pool_{}", uuid::Uuid::new_v4()));
        let store = BundleStore::new(dir.clone());
        let pool = ChannelPool::build(&[], &store).await;
        assert!(pool.is_empty());
        assert!(pool.get("missing").is_none());
    }

    #[tokio::test]
    async fn test_recompile_picks_up_newly_completed_bundle() {
        use crate::bundle::index::IndexSegment;
        use crate::bundle::{BundleMetadata, SegmentIndex};
        use crate::channel::program::SourceItem;
        use std::fs;

        let dir = std::env::temp_dir().join(format!("bcast_pool_recompile_{}", uuid::Uuid::new_v4()));
        let store = BundleStore::new(dir.clone());
        let def = ChannelDefinition {
            kind: ChannelType::Sequential,
            name: "Test".to_string(),
            slug: "test".to_string(),
            paths: vec![],
        };
        let mut pool = ChannelPool::build(&[def], &store).await;
        assert!(pool.get("test").unwrap().compiled.is_empty());

        // Inject a Source Item and write its bundle directly, simulating
        // a transcode that completed after the pool was first built.
        pool.entries.get_mut("test").unwrap().program.queue.push(SourceItem {
            path: "/media/ep1.mp4".to_string(),
            fingerprint: "fp0".to_string(),
        });
        let bundle_dir = store.bundle_dir("test", "fp0");
        fs::create_dir_all(&bundle_dir).unwrap();
        fs::write(bundle_dir.join("segment_00000.ts"), b"x").unwrap();
        let index = SegmentIndex {
            segments: vec![IndexSegment { filename: "segment_00000.ts".to_string(), duration_secs: 6.0 }],
            end_of_list: true,
        };
        fs::write(bundle_dir.join("index.m3u8"), index.to_m3u8()).unwrap();
        fs::write(
            bundle_dir.join("metadata.json"),
            serde_json::to_string(&BundleMetadata {
                original_path: "/media/ep1.mp4".to_string(),
                video_hash: "fp0".to_string(),
                generated_at: chrono::Utc::now(),
                duration: 6.0,
            }).unwrap(),
        ).unwrap();

        pool.recompile("test", &store).await;
        assert_eq!(pool.get("test").unwrap().compiled.len(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_build_and_start_all() {
        let dir = std::env::temp_dir().join(format!("bcast_pool_{}", uuid::Uuid::new_v4()));
        let store = BundleStore::new(dir.clone());
        let def = ChannelDefinition {
            kind: ChannelType::Sequential,
            name: "Test".to_string(),
            slug: "test".to_string(),
            paths: vec![],
        };
        let pool = ChannelPool::build(&[def], &store).await;
        assert_eq!(pool.len(), 1);
        pool.start_all().await;
        let entry = pool.get("test").unwrap();
        assert!(entry.runtime.is_started());
    }
}
