//! Axum HTTP surface: the thin wire-protocol layer over the core. No
//! business logic lives here beyond status-code mapping, matching
//! `streaming::server::StreamingServer` in the teacher.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tower_http::cors::{Any, CorsLayer};

use crate::bundle::BundleStore;
use crate::channel::pool::SharedChannelPool;
use crate::guide::{build_guide, GuideCache};

#[derive(Clone)]
pub struct AppState {
    pub pool: SharedChannelPool,
    pub guide_cache: Arc<GuideCache>,
    pub store: Arc<BundleStore>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(health_handler))
        .route("/channels", get(channels_index_handler))
        .route("/channels/:slug/live.m3u8", get(live_manifest_handler))
        .route("/channels/:slug/guide", get(guide_handler))
        .route("/channels/:slug/videos/:fingerprint/:segment", get(segment_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("INFO: broadcast engine listening on http://{addr}");
    axum::serve(listener, app).await
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[derive(Serialize)]
struct ChannelSummary {
    slug: String,
    name: String,
    started: bool,
    segment_count: usize,
}

#[derive(Serialize)]
struct ChannelsIndex {
    channels: Vec<ChannelSummary>,
}

async fn channels_index_handler(State(state): State<AppState>) -> Response {
    let pool = state.pool.read().await;
    let mut channels = Vec::new();
    for slug in pool.slugs() {
        if let Some(entry) = pool.get(slug) {
            channels.push(ChannelSummary {
                slug: slug.to_string(),
                name: entry.definition.name.clone(),
                started: entry.runtime.is_started(),
                segment_count: entry.compiled.len(),
            });
        }
    }
    json_response(StatusCode::OK, &ChannelsIndex { channels })
}

/// A request for a non-existent slug returns 404; an unstarted channel
/// returns 503; a started channel with zero segments returns the
/// three-line empty manifest (the Synthesizer already renders that for
/// `L = 0`, so no special-casing is needed here).
async fn live_manifest_handler(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let pool = state.pool.read().await;
    let Some(entry) = pool.get(&slug) else {
        return plain_text_response(StatusCode::NOT_FOUND, "channel not found");
    };

    match entry.runtime.current_manifest(&entry.compiled).await {
        Some(manifest) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from(manifest))
            .unwrap(),
        None => plain_text_response(StatusCode::SERVICE_UNAVAILABLE, "channel not started"),
    }
}

async fn guide_handler(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let pool = state.pool.read().await;
    let Some(entry) = pool.get(&slug) else {
        return plain_text_response(StatusCode::NOT_FOUND, "channel not found");
    };

    let entries = match state.guide_cache.get(&slug).await {
        Some(cached) => cached,
        None => {
            // Cold-start fallback: compute inline for the very first
            // request before the refresh timer has ticked once.
            let Some(epoch) = entry.runtime.epoch_snapshot().await else {
                return plain_text_response(StatusCode::SERVICE_UNAVAILABLE, "channel not started");
            };
            let computed = build_guide(&entry.compiled, &entry.manifest, &entry.definition, &entry.program.queue, epoch);
            state.guide_cache.put(&slug, computed.clone()).await;
            computed
        }
    };

    json_response(StatusCode::OK, &entries)
}

async fn segment_handler(
    State(state): State<AppState>,
    Path((slug, fingerprint, segment)): Path<(String, String, String)>,
) -> Response {
    let decoded_segment = urlencoding::decode(&segment).unwrap_or(std::borrow::Cow::Borrowed(&segment));
    let path = state.store.bundle_dir(&slug, &fingerprint).join(decoded_segment.as_ref());

    // Segment files are served as a stream rather than read fully into
    // memory first, since segments are opaque media containers handed
    // to the client as-is (spec.md §1: no transcoding of the output
    // manifest).
    match tokio::fs::File::open(&path).await {
        Ok(file) => {
            let stream = ReaderStream::new(file);
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "video/MP2T")
                .header(header::CACHE_CONTROL, "max-age=31536000, immutable")
                .body(Body::from_stream(stream))
                .unwrap()
        }
        Err(e) => {
            eprintln!("WARN: segment read failed for {path:?}: {e}");
            plain_text_response(StatusCode::NOT_FOUND, "segment not found")
        }
    }
}

fn plain_text_response(status: StatusCode, body: &'static str) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(body))
        .unwrap()
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    let json = serde_json::to_string(body).unwrap_or_default();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelPool;
    use tokio::sync::RwLock;

    fn empty_state() -> AppState {
        let dir = std::env::temp_dir().join(format!("bcast_server_{}", uuid::Uuid::new_v4()));
        AppState {
            pool: Arc::new(RwLock::new(ChannelPool::default())),
            guide_cache: Arc::new(GuideCache::new()),
            store: Arc::new(BundleStore::new(dir)),
        }
    }

    #[tokio::test]
    async fn test_live_manifest_missing_slug_is_404() {
        let state = empty_state();
        let response = live_manifest_handler(State(state), Path("missing".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_guide_missing_slug_is_404() {
        let state = empty_state();
        let response = guide_handler(State(state), Path("missing".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_channels_index_empty_pool() {
        let state = empty_state();
        let response = channels_index_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_segment_not_found() {
        let state = empty_state();
        let response = segment_handler(
            State(state),
            Path(("ch".to_string(), "fp".to_string(), "segment_00000.ts".to_string())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
