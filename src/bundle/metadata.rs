//! `metadata.json`: the per-bundle record capturing where a bundle came
//! from and when it was produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleMetadata {
    #[serde(rename = "originalPath")]
    pub original_path: String,
    #[serde(rename = "videoHash")]
    pub video_hash: String,
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
    pub duration: f64,
}

/// `manifest.json`: fingerprint -> source-item entry, for a single channel.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelManifest {
    #[serde(flatten)]
    pub entries: std::collections::HashMap<String, ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "originalPath")]
    pub original_path: String,
    pub filename: String,
    #[serde(rename = "addedAt")]
    pub added_at: i64,
}
