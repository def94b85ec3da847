//! Compiled Program: the flattened, cumulative-timestamped segment
//! sequence the Synthesizer and Guide Builder consume. Built by
//! concatenating each Source Item's bundle index in channel-defined order.

use crate::bundle::BundleStore;

use super::program::ChannelProgram;

/// `(videoIndex, durationSeconds, relativeURL, cumulativeTimestamp)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    pub video_index: usize,
    pub duration_secs: f64,
    pub relative_url: String,
    pub cumulative_timestamp: f64,
}

/// The ordered vector of Segment Records for a channel, plus its size.
#[derive(Debug, Clone, Default)]
pub struct CompiledProgram {
    pub segments: Vec<SegmentRecord>,
    pub total_duration: f64,
}

impl CompiledProgram {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn max_duration(&self) -> f64 {
        self.segments
            .iter()
            .fold(0.0_f64, |max, s| max.max(s.duration_secs))
    }
}

/// Compile a `ChannelProgram` against the bundle store. Source Items
/// whose bundle is not complete, or whose bundle becomes unreadable
/// between compiles, are simply omitted — this never errors, since a
/// channel with some videos not yet transcoded is a normal, expected
/// state, not a failure.
pub async fn compile(program: &ChannelProgram, store: &BundleStore, slug: &str) -> CompiledProgram {
    let mut segments = Vec::new();
    let mut cumulative = 0.0_f64;

    for (video_index, item) in program.queue.iter().enumerate() {
        let (index, _metadata) = match store.open(slug, &item.fingerprint).await {
            Ok(opened) => opened,
            Err(_) => continue,
        };

        for seg in index.segments {
            let relative_url = format!("channels/{}/videos/{}/{}", slug, item.fingerprint, seg.filename);
            segments.push(SegmentRecord {
                video_index,
                duration_secs: seg.duration_secs,
                relative_url,
                cumulative_timestamp: cumulative,
            });
            cumulative += seg.duration_secs;
        }
    }

    CompiledProgram {
        segments,
        total_duration: cumulative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::index::IndexSegment;
    use crate::bundle::{BundleMetadata, SegmentIndex};
    use crate::channel::definitions::{ChannelDefinition, ChannelType};
    use crate::channel::program::SourceItem;
    use std::fs;

    fn write_bundle(store: &BundleStore, slug: &str, fp: &str, durations: &[f64]) {
        let dir = store.bundle_dir(slug, fp);
        fs::create_dir_all(&dir).unwrap();
        let mut segments = Vec::new();
        for (i, d) in durations.iter().enumerate() {
            let filename = format!("segment_{i:05}.ts");
            fs::write(dir.join(&filename), b"x").unwrap();
            segments.push(IndexSegment { filename, duration_secs: *d });
        }
        let index = SegmentIndex { segments, end_of_list: true };
        fs::write(dir.join("index.m3u8"), index.to_m3u8()).unwrap();
        fs::write(
            dir.join("metadata.json"),
            serde_json::to_string(&BundleMetadata {
                original_path: format!("/media/{fp}.mp4"),
                video_hash: fp.to_string(),
                generated_at: chrono::Utc::now(),
                duration: durations.iter().sum(),
            }).unwrap(),
        ).unwrap();
    }

    #[tokio::test]
    async fn test_compile_concatenates_in_order() {
        let dir = std::env::temp_dir().join(format!("bcast_compiled_{}", uuid::Uuid::new_v4()));
        let store = BundleStore::new(dir.clone());
        write_bundle(&store, "ch", "fp0", &[6.0, 6.0, 4.5]);
        write_bundle(&store, "ch", "fp1", &[2.0, 2.0]);

        let def = ChannelDefinition {
            kind: ChannelType::Sequential,
            name: "Test".to_string(),
            slug: "ch".to_string(),
            paths: vec![],
        };
        let program = ChannelProgram {
            slug: def.slug.clone(),
            queue: vec![
                SourceItem { path: "/media/fp0.mp4".to_string(), fingerprint: "fp0".to_string() },
                SourceItem { path: "/media/fp1.mp4".to_string(), fingerprint: "fp1".to_string() },
            ],
        };

        let compiled = compile(&program, &store, "ch").await;
        assert_eq!(compiled.len(), 5);
        assert_eq!(compiled.total_duration, 16.5);
        assert_eq!(compiled.segments[0].video_index, 0);
        assert_eq!(compiled.segments[3].video_index, 1);
        assert_eq!(compiled.segments[4].cumulative_timestamp, 16.5 - 2.0);

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_compile_skips_incomplete_bundles() {
        let dir = std::env::temp_dir().join(format!("bcast_compiled_skip_{}", uuid::Uuid::new_v4()));
        let store = BundleStore::new(dir.clone());
        write_bundle(&store, "ch", "fp0", &[6.0]);

        let program = ChannelProgram {
            slug: "ch".to_string(),
            queue: vec![
                SourceItem { path: "/media/fp0.mp4".to_string(), fingerprint: "fp0".to_string() },
                SourceItem { path: "/media/missing.mp4".to_string(), fingerprint: "missing".to_string() },
            ],
        };

        let compiled = compile(&program, &store, "ch").await;
        assert_eq!(compiled.len(), 1);
        fs::remove_dir_all(&dir).ok();
    }
}
