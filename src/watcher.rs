//! Channel Definitions Watcher: polls the channel-definitions file's
//! modification time and triggers a safe, atomic rebuild on change.
//! Polling (not `notify`) is intentional — robustness across networked
//! filesystems is worth the latency, per the external-interface contract.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::RwLock;

use crate::bundle::BundleStore;
use crate::channel::pool::SharedChannelPool;
use crate::channel::{definitions, ChannelPool};
use crate::transcode::Scheduler;

pub const POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub struct DefinitionsWatcher {
    channel_list: PathBuf,
    last_modified: RwLock<Option<SystemTime>>,
}

impl DefinitionsWatcher {
    pub fn new(channel_list: PathBuf) -> Self {
        Self {
            channel_list,
            last_modified: RwLock::new(None),
        }
    }

    async fn current_mtime(&self) -> Option<SystemTime> {
        tokio::fs::metadata(&self.channel_list).await.ok()?.modified().ok()
    }

    /// Check the file's mtime; if it changed since the last check (or
    /// this is the first check), reload definitions, rebuild the pool,
    /// re-enqueue the scheduler, and restart all channels. A read or
    /// parse failure is logged and leaves prior state untouched.
    pub async fn poll_and_maybe_reload(&self, store: &BundleStore, pool: &SharedChannelPool, scheduler: &Scheduler) {
        let current = self.current_mtime().await;
        {
            let last = self.last_modified.read().await;
            if *last == current && last.is_some() {
                return;
            }
        }

        let definitions = match definitions::load_or_default(&self.channel_list).await {
            Ok(defs) => defs,
            Err(e) => {
                eprintln!("ERROR: failed to reload channel definitions: {e}");
                return;
            }
        };

        println!("INFO: channel definitions changed, rebuilding {} channel(s)", definitions.len());

        {
            let old = pool.read().await;
            for slug in old.slugs() {
                if let Some(entry) = old.get(slug) {
                    entry.runtime.stop().await;
                }
            }
        }

        let fresh = ChannelPool::build(&definitions, store).await;
        for def in &definitions {
            if let Some(entry) = fresh.get(&def.slug) {
                let pending = entry.program.pending(store).await;
                scheduler.enqueue(def.slug.clone(), pending).await;
            }
        }
        fresh.start_all().await;

        *pool.write().await = fresh;
        *self.last_modified.write().await = current;
    }

    /// Run the poll loop forever, spawned once at startup.
    pub async fn run(self: Arc<Self>, store: Arc<BundleStore>, pool: SharedChannelPool, scheduler: Arc<Scheduler>) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            ticker.tick().await;
            self.poll_and_maybe_reload(&store, &pool, &scheduler).await;
        }
    }
}
