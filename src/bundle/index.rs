//! Segment index parsing and rendering: a standard HLS v3 media playlist
//! with `#EXT-X-ENDLIST` describing one sealed Segment Bundle.

use regex::Regex;
use std::sync::OnceLock;

fn extinf_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#EXTINF:([0-9]+(\.[0-9]+)?)").unwrap())
}

/// One segment file listed in a bundle's index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSegment {
    pub filename: String,
    pub duration_secs: f64,
}

/// A bundle's parsed `index.m3u8`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentIndex {
    pub segments: Vec<IndexSegment>,
    pub end_of_list: bool,
}

impl SegmentIndex {
    /// Parse a segment index. For each `#EXTINF:<d>,` line, the following
    /// non-comment line is the segment filename. Duration is matched by
    /// the regular expression `#EXTINF:([0-9]+(\.[0-9]+)?)`.
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut pending_duration: Option<f64> = None;
        let mut end_of_list = false;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "#EXT-X-ENDLIST" {
                end_of_list = true;
                continue;
            }
            if let Some(caps) = extinf_re().captures(line) {
                if let Ok(d) = caps[1].parse::<f64>() {
                    pending_duration = Some(d);
                }
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            if let Some(duration_secs) = pending_duration.take() {
                segments.push(IndexSegment {
                    filename: line.to_string(),
                    duration_secs,
                });
            }
        }

        Self {
            segments,
            end_of_list,
        }
    }

    /// Render as a VOD-style playlist with an end-of-list marker, as
    /// written by the Transcode Worker once a bundle is finalized.
    pub fn to_m3u8(&self) -> String {
        let target = self
            .segments
            .iter()
            .fold(0.0_f64, |max, s| max.max(s.duration_secs))
            .max(1.0)
            .ceil() as u64;

        let mut out = String::new();
        out.push_str("#EXTM3U\n");
        out.push_str("#EXT-X-VERSION:3\n");
        out.push_str(&format!("#EXT-X-TARGETDURATION:{}\n", target));
        out.push_str("#EXT-X-MEDIA-SEQUENCE:0\n");
        for seg in &self.segments {
            out.push_str(&format!("#EXTINF:{:.6},\n", seg.duration_secs));
            out.push_str(&seg.filename);
            out.push('\n');
        }
        if self.end_of_list {
            out.push_str("#EXT-X-ENDLIST\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete_index() {
        let text = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n#EXT-X-MEDIA-SEQUENCE:0\n#EXTINF:6.000000,\nsegment_00000.ts\n#EXTINF:4.500000,\nsegment_00001.ts\n#EXT-X-ENDLIST\n";
        let idx = SegmentIndex::parse(text);
        assert!(idx.end_of_list);
        assert_eq!(idx.segments.len(), 2);
        assert_eq!(idx.segments[0].filename, "segment_00000.ts");
        assert_eq!(idx.segments[0].duration_secs, 6.0);
        assert_eq!(idx.segments[1].duration_secs, 4.5);
    }

    #[test]
    fn test_parse_missing_endlist() {
        let text = "#EXTM3U\n#EXTINF:6.000000,\nsegment_00000.ts\n";
        let idx = SegmentIndex::parse(text);
        assert!(!idx.end_of_list);
        assert_eq!(idx.segments.len(), 1);
    }

    #[test]
    fn test_roundtrip() {
        let idx = SegmentIndex {
            segments: vec![
                IndexSegment { filename: "segment_00000.ts".to_string(), duration_secs: 6.0 },
                IndexSegment { filename: "segment_00001.ts".to_string(), duration_secs: 4.5 },
            ],
            end_of_list: true,
        };
        let text = idx.to_m3u8();
        let reparsed = SegmentIndex::parse(&text);
        assert_eq!(reparsed, idx);
    }
}
