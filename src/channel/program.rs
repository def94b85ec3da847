//! Channel Program: the ordered sequence of Source Items for a channel,
//! built by walking its configured root paths.

use rand::seq::SliceRandom;
use walkdir::WalkDir;

use super::definitions::{ChannelDefinition, ChannelType};
use super::fingerprint::fingerprint;
use crate::bundle::{BundleState, BundleStore};

/// Extensions retained when walking a channel's root paths, matched
/// case-insensitively. Exact list is a configuration constant per the
/// external-interface contract.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "m4v", "webm", "ts"];

/// A single video file discovered under a channel's root paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    pub path: String,
    pub fingerprint: String,
}

impl SourceItem {
    fn from_path(path: String) -> Self {
        let fingerprint = fingerprint(&path);
        Self { path, fingerprint }
    }
}

/// The ordered `queue` of Source Items for one channel, as built from its
/// definition. Stored in memory only; rebuilt on definitions reload or
/// bundle completion.
#[derive(Debug, Clone)]
pub struct ChannelProgram {
    pub slug: String,
    pub queue: Vec<SourceItem>,
}

impl ChannelProgram {
    /// Walk `def`'s root paths recursively, retain supported-extension
    /// files, and order them per `def.kind`. A missing or empty root path
    /// simply contributes nothing — the channel is built with whatever
    /// queue results, never an error.
    pub fn build(def: &ChannelDefinition) -> Self {
        let mut queue: Vec<SourceItem> = Vec::new();

        for root in &def.paths {
            if !root.exists() {
                eprintln!(
                    "WARN: channel {:?} root path does not exist: {:?}",
                    def.slug, root
                );
                continue;
            }

            for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                let is_supported = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                    .unwrap_or(false);
                if !is_supported {
                    continue;
                }
                queue.push(SourceItem::from_path(path.to_string_lossy().into_owned()));
            }
        }

        if def.kind == ChannelType::Shuffle {
            queue.shuffle(&mut rand::rng());
        }

        Self {
            slug: def.slug.clone(),
            queue,
        }
    }

    /// The subset of `queue` whose bundle is not yet `Complete`, in
    /// channel order — what the Pre-Generation Scheduler is actually
    /// meant to enqueue (spec.md §4.C: "enqueues every Source Item whose
    /// bundle is not complete").
    pub async fn pending(&self, store: &BundleStore) -> Vec<SourceItem> {
        let mut pending = Vec::new();
        for item in &self.queue {
            if store.exists(&self.slug, &item.fingerprint).await != BundleState::Complete {
                pending.push(item.clone());
            }
        }
        pending
    }
}
