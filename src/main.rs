//! Channel Broadcast Engine entry point: loads configuration, boots the
//! channel pool, and spawns the background tasks (pre-generation
//! scheduler, guide-cache refresh, definitions watcher) alongside the
//! HTTP surface.

mod bundle;
mod channel;
mod config;
mod error;
mod guide;
mod playlist;
mod server;
mod time_model;
mod transcode;
mod watcher;

use std::sync::Arc;

use tokio::sync::RwLock;

use bundle::BundleStore;
use channel::{definitions, ChannelPool};
use config::AppConfig;
use guide::GuideCache;
use transcode::{Scheduler, TranscodeWorker};
use watcher::DefinitionsWatcher;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();
    println!("INFO: starting broadcast engine (cache_dir={:?}, port={})", config.cache_dir, config.port);

    if let Err(e) = tokio::fs::create_dir_all(&config.cache_dir).await {
        eprintln!("ERROR: failed to create cache directory {:?}: {e}", config.cache_dir);
        std::process::exit(1);
    }

    let store = Arc::new(BundleStore::new(config.cache_dir.clone()));

    let definitions = match definitions::load_or_default(&config.channel_list).await {
        Ok(defs) => defs,
        Err(e) => {
            eprintln!("ERROR: failed to load channel definitions: {e}");
            std::process::exit(1);
        }
    };

    let pool = ChannelPool::build(&definitions, &store).await;
    let scheduler = Arc::new(Scheduler::new());
    for def in &definitions {
        if let Some(entry) = pool.get(&def.slug) {
            let pending = entry.program.pending(&store).await;
            scheduler.enqueue(def.slug.clone(), pending).await;
        }
    }
    pool.start_all().await;

    let pool: channel::SharedChannelPool = Arc::new(RwLock::new(pool));
    let guide_cache = Arc::new(GuideCache::new());

    let worker = Arc::new(TranscodeWorker::new(config.clone(), BundleStore::new(config.cache_dir.clone())));
    {
        let scheduler = scheduler.clone();
        let worker = worker.clone();
        let pool = pool.clone();
        let store = store.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(transcode::scheduler::RUN_INTERVAL);
            loop {
                ticker.tick().await;
                scheduler.run(&worker, &pool, &store).await;
            }
        });
    }

    {
        let guide_cache = guide_cache.clone();
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(guide::cache::REFRESH_INTERVAL);
            loop {
                ticker.tick().await;
                guide_cache.refresh(&pool).await;
            }
        });
    }

    {
        let watcher = Arc::new(DefinitionsWatcher::new(config.channel_list.clone()));
        let store = store.clone();
        let pool = pool.clone();
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            watcher.run(store, pool, scheduler).await;
        });
    }

    let state = server::AppState {
        pool,
        guide_cache,
        store,
    };

    if let Err(e) = server::serve(state, config.port).await {
        eprintln!("ERROR: HTTP server exited: {e}");
        std::process::exit(1);
    }
}
