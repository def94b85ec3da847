//! Channel Runtime State: the `(started, epoch)` pair a broadcasting
//! channel carries, published so a reader never observes `started=true`
//! alongside `epoch=None`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::RwLock;

use super::compiled::CompiledProgram;
use crate::playlist::synthesizer;

pub struct ChannelRuntime {
    started: AtomicBool,
    epoch: RwLock<Option<Instant>>,
}

impl Default for ChannelRuntime {
    fn default() -> Self {
        Self {
            started: AtomicBool::new(false),
            epoch: RwLock::new(None),
        }
    }
}

impl ChannelRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Publish an epoch and flip `started`. Idempotent: calling this on an
    /// already-started runtime is a no-op, so a restart doesn't reset the
    /// loop position of a channel that never stopped.
    pub async fn start(&self) {
        if self.started.load(Ordering::SeqCst) {
            return;
        }
        let mut guard = self.epoch.write().await;
        *guard = Some(Instant::now());
        self.started.store(true, Ordering::SeqCst);
    }

    /// Reset to the unstarted state, used by the Channel Definitions
    /// Watcher before it rebuilds and restarts a channel.
    pub async fn stop(&self) {
        self.started.store(false, Ordering::SeqCst);
        let mut guard = self.epoch.write().await;
        *guard = None;
    }

    /// Renders the live manifest at the current instant, or `None` if the
    /// channel hasn't been started yet — the server maps that to 503.
    pub async fn current_manifest(&self, compiled: &CompiledProgram) -> Option<String> {
        let epoch = self.epoch_snapshot().await?;
        let offset = crate::time_model::offset_secs(epoch, Instant::now());
        Some(synthesizer::render(compiled, offset))
    }

    /// The published epoch, or `None` if the channel hasn't started.
    /// Used by the Guide Builder, which needs the raw epoch rather than
    /// a rendered manifest.
    pub async fn epoch_snapshot(&self) -> Option<Instant> {
        if !self.started.load(Ordering::SeqCst) {
            return None;
        }
        *self.epoch.read().await
    }
}
