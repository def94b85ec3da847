//! Pre-Generation Scheduler: round-robins across channels' pending
//! Source Items so no single large channel starves the others, and runs
//! the external transcoder single-flight (one source at a time, never
//! reentrant).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::worker::{TranscodeOutcome, TranscodeWorker};
use crate::bundle::BundleStore;
use crate::channel::pool::SharedChannelPool;
use crate::channel::program::SourceItem;

/// How often `run()` is re-invoked from its background task, so a
/// definitions reload's newly-enqueued items (or a previously-failed
/// item re-enqueued on retry) eventually get processed — the scheduler
/// itself only drains whatever is queued at the moment `run()` starts.
pub const RUN_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerProgress {
    pub current_index: usize,
    pub total: usize,
    pub is_generating: bool,
}

impl SchedulerProgress {
    pub fn percent_complete(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.current_index as f64 / self.total as f64) * 100.0
        }
    }
}

/// Insertion-ordered per-channel sub-queues, flattened round-robin for
/// the actual run so every channel makes progress before any one
/// channel's long tail is exhausted.
pub struct Scheduler {
    queues: Mutex<Vec<(String, VecDeque<SourceItem>)>>,
    run_lock: Mutex<()>,
    current_index: AtomicUsize,
    total: AtomicUsize,
    is_generating: AtomicBool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            queues: Mutex::new(Vec::new()),
            run_lock: Mutex::new(()),
            current_index: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            is_generating: AtomicBool::new(false),
        }
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a channel's pending queue, or add it if not yet present.
    /// Called after a definitions reload rebuilds a channel's program.
    pub async fn enqueue(&self, slug: String, items: Vec<SourceItem>) {
        let mut queues = self.queues.lock().await;
        let queue: VecDeque<SourceItem> = items.into_iter().collect();
        if let Some(entry) = queues.iter_mut().find(|(s, _)| *s == slug) {
            entry.1 = queue;
        } else {
            queues.push((slug, queue));
        }
        self.total.store(queues.iter().map(|(_, q)| q.len()).sum(), Ordering::SeqCst);
    }

    /// Round-robin interleave of every channel's current sub-queue: one
    /// item from channel 0, one from channel 1, ... wrapping back to
    /// channel 0 once every other channel has contributed or drained.
    async fn build_flat(&self) -> Vec<(String, SourceItem)> {
        let queues = self.queues.lock().await;
        let mut cursors: Vec<(String, VecDeque<SourceItem>)> = queues
            .iter()
            .map(|(slug, q)| (slug.clone(), q.clone()))
            .collect();

        let mut flat = Vec::new();
        loop {
            let mut progressed = false;
            for (slug, queue) in cursors.iter_mut() {
                if let Some(item) = queue.pop_front() {
                    flat.push((slug.clone(), item));
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
        flat
    }

    /// Run every currently-queued Source Item through the worker, in
    /// round-robin channel order. Guarded by `try_lock` so a concurrent
    /// call returns immediately rather than interleaving two runs. After
    /// each item that completes transcoding, the owning channel's
    /// `CompiledProgram` is recompiled and swapped into `pool` so the
    /// channel picks up the new segments on its very next request,
    /// rather than waiting for a definitions reload (spec.md §3
    /// Lifecycle, §2 Dataflow: "once any channel has at least one
    /// complete bundle, that channel becomes broadcastable").
    pub async fn run(&self, worker: &TranscodeWorker, pool: &SharedChannelPool, store: &BundleStore) {
        let Ok(_guard) = self.run_lock.try_lock() else {
            println!("INFO: scheduler run already in progress, skipping");
            return;
        };

        let flat = self.build_flat().await;
        self.total.store(flat.len(), Ordering::SeqCst);
        self.current_index.store(0, Ordering::SeqCst);
        self.is_generating.store(true, Ordering::SeqCst);

        for (slug, item) in flat {
            match worker.transcode(&item.path, &slug, &item.fingerprint).await {
                Ok(TranscodeOutcome::Complete) => {
                    pool.write().await.recompile(&slug, store).await;
                }
                Ok(TranscodeOutcome::Failed { exit_code, tail }) => {
                    eprintln!(
                        "ERROR: transcode failed for {:?} (slug={}, exit={:?}): {}",
                        item.path, slug, exit_code, tail
                    );
                }
                Err(e) => {
                    eprintln!("ERROR: transcode error for {:?} (slug={}): {}", item.path, slug, e);
                }
            }
            self.current_index.fetch_add(1, Ordering::SeqCst);
        }

        self.is_generating.store(false, Ordering::SeqCst);
        self.queues.lock().await.clear();
    }

    pub fn progress(&self) -> SchedulerProgress {
        SchedulerProgress {
            current_index: self.current_index.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
            is_generating: self.is_generating.load(Ordering::SeqCst),
        }
    }
}
