//! Guide cache: the Program Guide Builder's output is expensive enough
//! (walking a whole programming day's worth of loops) that it's
//! recomputed on a timer rather than per request.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;

use super::builder::{build_guide, ScheduleEntry};
use crate::channel::pool::SharedChannelPool;

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Default)]
pub struct GuideCache {
    entries: RwLock<HashMap<String, Vec<ScheduleEntry>>>,
}

impl GuideCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every channel's guide from the current pool snapshot and
    /// replace the cache in one shot.
    pub async fn refresh(&self, pool: &SharedChannelPool) {
        let pool = pool.read().await;
        let mut fresh = HashMap::with_capacity(pool.len());
        for slug in pool.slugs() {
            if let Some(entry) = pool.get(slug) {
                if let Some(epoch) = entry.runtime.epoch_snapshot().await {
                    let guide = build_guide(&entry.compiled, &entry.manifest, &entry.definition, &entry.program.queue, epoch);
                    fresh.insert(slug.to_string(), guide);
                }
            }
        }
        *self.entries.write().await = fresh;
    }

    /// Read a channel's cached guide, or `None` if it hasn't been
    /// computed yet (the caller falls back to computing inline).
    pub async fn get(&self, slug: &str) -> Option<Vec<ScheduleEntry>> {
        self.entries.read().await.get(slug).cloned()
    }

    pub async fn put(&self, slug: &str, entries: Vec<ScheduleEntry>) {
        self.entries.write().await.insert(slug.to_string(), entries);
    }
}
