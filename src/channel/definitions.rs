//! Channel definitions file: the JSON array of channels an operator
//! configures, and the default-channel fallback used when it's absent.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// `type` field of a channel definition: sequential playback preserves
/// filesystem walk order, shuffle applies a per-process random permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Sequential,
    Shuffle,
}

/// A single configured channel, as read from the channel-definitions file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDefinition {
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub name: String,
    pub slug: String,
    pub paths: Vec<PathBuf>,
}

/// Load the channel-definitions file, creating a default single-channel
/// configuration (persisted to disk) if it doesn't exist.
///
/// Returns `Err` only if the file exists but is not valid JSON, or if an
/// entry names an unknown `type` — both are loud, rejected-on-load
/// conditions rather than silent fallbacks.
pub async fn load_or_default(path: &Path) -> AppResult<Vec<ChannelDefinition>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => parse(&text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let defaults = vec![default_channel()];
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let text = serde_json::to_string_pretty(&defaults)?;
            tokio::fs::write(path, text).await?;
            Ok(defaults)
        }
        Err(e) => Err(AppError::Io(e)),
    }
}

/// Parse channel-definitions JSON, rejecting unknown `type` values loudly
/// (they'd otherwise surface much later as an empty, unexplained channel).
pub fn parse(text: &str) -> AppResult<Vec<ChannelDefinition>> {
    serde_json::from_str(text).map_err(AppError::Json)
}

fn default_channel() -> ChannelDefinition {
    ChannelDefinition {
        kind: ChannelType::Shuffle,
        name: "Example Channel".to_string(),
        slug: "example".to_string(),
        paths: vec![PathBuf::from("/media")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let json = r#"[{"type":"shuffle","name":"Cartoons","slug":"cartoons","paths":["/media/cartoons"]}]"#;
        let defs = parse(json).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].kind, ChannelType::Shuffle);
        assert_eq!(defs[0].slug, "cartoons");
    }

    #[test]
    fn test_parse_unknown_type_rejected() {
        let json = r#"[{"type":"random","name":"X","slug":"x","paths":[]}]"#;
        assert!(parse(json).is_err());
    }

    #[test]
    fn test_parse_invalid_json_rejected() {
        assert!(parse("not json").is_err());
    }

    #[tokio::test]
    async fn test_load_or_default_creates_file() {
        let dir = std::env::temp_dir().join(format!("bcast_test_{}", uuid::Uuid::new_v4()));
        let path = dir.join("channels.json");
        let defs = load_or_default(&path).await.unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].slug, "example");
        assert!(path.exists());
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
