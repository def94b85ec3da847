//! Transcode Worker: turns one source video into a sealed segment bundle
//! by spawning the external transcoder, modeled as an opaque binary
//! (`ffmpeg` by default, but the path is configurable) whose stdout/stderr
//! we don't interpret beyond its exit code and a short diagnostic tail.

use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::bundle::{BundleState, BundleStore};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Bound on the captured stderr tail, per the "final <= 500 bytes"
/// diagnostic clause.
const DIAGNOSTIC_TAIL_BYTES: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum TranscodeOutcome {
    Complete,
    Failed { exit_code: Option<i32>, tail: String },
}

pub struct TranscodeWorker {
    config: AppConfig,
    store: BundleStore,
    transcoder_path: PathBuf,
}

impl TranscodeWorker {
    pub fn new(config: AppConfig, store: BundleStore) -> Self {
        let transcoder_path = find_transcoder_path();
        Self { config, store, transcoder_path }
    }

    /// Transcode `source_path` into `slug`'s bundle for `fingerprint`. A
    /// bundle already `Complete` is a no-op; a `Partial` one is reaped
    /// first so a retried file never mixes segments from two attempts.
    /// Never retries internally — a caller that wants another attempt
    /// must call this again.
    pub async fn transcode(&self, source_path: &str, slug: &str, fingerprint: &str) -> AppResult<TranscodeOutcome> {
        match self.store.exists(slug, fingerprint).await {
            BundleState::Complete => return Ok(TranscodeOutcome::Complete),
            BundleState::Partial => {
                self.store.reap(slug, fingerprint).await?;
            }
            BundleState::Absent => {}
        }

        let dir = self.store.create(slug, fingerprint).await?;
        let index_path = dir.join("index.m3u8");
        let segment_pattern = dir.join("segment_%05d.ts");

        let video_filter = self
            .config
            .video_filter
            .clone()
            .unwrap_or_else(|| format!("scale={}:{}", self.config.dimensions.0, self.config.dimensions.1));

        let args: Vec<String> = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(), "warning".to_string(),
            "-y".to_string(),
            "-i".to_string(), source_path.to_string(),
            "-c:v".to_string(), self.config.video_codec.clone(),
            "-preset".to_string(), self.config.video_preset.clone(),
            "-crf".to_string(), self.config.video_crf.to_string(),
            "-vf".to_string(), video_filter,
            "-c:a".to_string(), self.config.audio_codec.clone(),
            "-b:a".to_string(), format!("{}k", self.config.audio_bitrate_kbps),
            "-f".to_string(), "hls".to_string(),
            "-hls_time".to_string(), self.config.hls_segment_length_seconds.to_string(),
            "-hls_playlist_type".to_string(), "vod".to_string(),
            "-hls_segment_filename".to_string(), segment_pattern.to_string_lossy().into_owned(),
            index_path.to_string_lossy().into_owned(),
        ];

        let mut cmd = Command::new(&self.transcoder_path);
        cmd.args(&args);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            AppError::Transcode(format!("failed to spawn transcoder at {:?}: {e}", self.transcoder_path))
        })?;

        let mut stderr = child.stderr.take().ok_or_else(|| {
            AppError::Transcode("failed to capture transcoder stderr".to_string())
        })?;

        let (tail, status) = tokio::join!(drain_tail(&mut stderr), child.wait());
        let status = status.map_err(|e| AppError::Transcode(format!("transcoder wait failed: {e}")))?;

        if !status.success() {
            eprintln!(
                "WARN: transcode failed for {:?} (slug={}, exit={:?}): {}",
                source_path, slug, status.code(), tail
            );
            return Ok(TranscodeOutcome::Failed { exit_code: status.code(), tail });
        }

        self.finalize_metadata(slug, fingerprint, source_path).await?;
        println!("INFO: transcode complete for {:?} (slug={})", source_path, slug);
        Ok(TranscodeOutcome::Complete)
    }

    async fn finalize_metadata(&self, slug: &str, fingerprint: &str, source_path: &str) -> AppResult<()> {
        let (index, _) = self.store.open(slug, fingerprint).await?;
        let duration: f64 = index.segments.iter().map(|s| s.duration_secs).sum();

        let metadata = crate::bundle::BundleMetadata {
            original_path: source_path.to_string(),
            video_hash: fingerprint.to_string(),
            generated_at: chrono::Utc::now(),
            duration,
        };
        let dir = self.store.bundle_dir(slug, fingerprint);
        let text = serde_json::to_string_pretty(&metadata)?;
        tokio::fs::write(dir.join("metadata.json"), text).await?;

        let mut manifest = self.store.load_manifest(slug).await;
        manifest.entries.insert(
            fingerprint.to_string(),
            crate::bundle::metadata::ManifestEntry {
                original_path: source_path.to_string(),
                filename: PathBuf::from(source_path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| source_path.to_string()),
                added_at: chrono::Utc::now().timestamp_millis(),
            },
        );
        self.store.save_manifest(slug, &manifest).await?;
        Ok(())
    }
}

/// Read `stderr` to EOF and keep only the last `DIAGNOSTIC_TAIL_BYTES`
/// bytes, as valid UTF-8 (lossy), matching the bounded diagnostic tail
/// the Pre-Generation Scheduler logs on failure.
async fn drain_tail(stderr: &mut (impl tokio::io::AsyncRead + Unpin)) -> String {
    let mut buf = Vec::new();
    let _ = stderr.read_to_end(&mut buf).await;
    let start = buf.len().saturating_sub(DIAGNOSTIC_TAIL_BYTES);
    String::from_utf8_lossy(&buf[start..]).into_owned()
}

/// Search order: explicit `TRANSCODER_PATH` override, then system `PATH`
/// lookup of `ffmpeg`, matching the teacher's `get_ffmpeg_path` fallback
/// chain (minus the Tauri-bundled-resource step, which has no analogue
/// in a standalone service).
fn find_transcoder_path() -> PathBuf {
    if let Ok(path) = std::env::var("TRANSCODER_PATH") {
        return PathBuf::from(path);
    }
    PathBuf::from("ffmpeg")
}
