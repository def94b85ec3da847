//! Program Guide Builder: groups a Compiled Program's segments into
//! shows and projects them onto the programming day (03:00–03:00 local).

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Duration as ChronoDuration, Local};
use serde::Serialize;

use crate::bundle::ChannelManifest;
use crate::channel::compiled::CompiledProgram;
use crate::channel::definitions::ChannelDefinition;
use crate::channel::program::SourceItem;
use crate::time_model;

const MERGE_THRESHOLD_SECS: f64 = 20.0 * 60.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub title: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub duration_secs: f64,
    pub is_current: bool,
}

struct Show {
    video_index: usize,
    start_sec: f64,
    duration_sec: f64,
}

fn group_shows(compiled: &CompiledProgram) -> Vec<Show> {
    let mut shows: Vec<Show> = Vec::new();
    for seg in &compiled.segments {
        match shows.last_mut() {
            Some(last) if last.video_index == seg.video_index => {
                last.duration_sec += seg.duration_secs;
            }
            _ => shows.push(Show {
                video_index: seg.video_index,
                start_sec: seg.cumulative_timestamp,
                duration_sec: seg.duration_secs,
            }),
        }
    }
    shows
}

/// Fingerprint is the path component right before the segment filename
/// in a Segment Record's `relativeURL` (`channels/<slug>/videos/<fp>/<file>`).
fn fingerprint_from_relative_url(relative_url: &str) -> Option<&str> {
    let parts: Vec<&str> = relative_url.split('/').collect();
    if parts.len() < 2 {
        return None;
    }
    Some(parts[parts.len() - 2])
}

fn title_for(original_path: &str, def: &ChannelDefinition) -> String {
    for root in &def.paths {
        let root_str = root.to_string_lossy();
        if original_path.starts_with(root_str.as_ref()) {
            if let Some(name) = root.file_name() {
                return name.to_string_lossy().into_owned();
            }
        }
    }
    Path::new(original_path)
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| original_path.to_string())
}

/// The source path for a show's title is read from the per-channel
/// Manifest when present; otherwise from the queue directly (spec.md
/// §4.G step 4), falling back to the segment's own relative URL only if
/// neither has an entry for this video index.
fn show_title(
    video_index: usize,
    compiled: &CompiledProgram,
    manifest: &ChannelManifest,
    def: &ChannelDefinition,
    queue: &[SourceItem],
) -> String {
    let relative_url = compiled
        .segments
        .iter()
        .find(|s| s.video_index == video_index)
        .map(|s| s.relative_url.as_str())
        .unwrap_or("");

    let original_path = fingerprint_from_relative_url(relative_url)
        .and_then(|fp| manifest.entries.get(fp))
        .map(|entry| entry.original_path.clone())
        .or_else(|| queue.get(video_index).map(|item| item.path.clone()))
        .unwrap_or_else(|| relative_url.to_string());

    title_for(&original_path, def)
}

/// Build the program guide for `compiled`, covering
/// `[previous_3am(now), next_3am(now))`.
pub fn build_guide(
    compiled: &CompiledProgram,
    manifest: &ChannelManifest,
    def: &ChannelDefinition,
    queue: &[SourceItem],
    epoch: Instant,
) -> Vec<ScheduleEntry> {
    if compiled.is_empty() || compiled.total_duration <= 0.0 {
        return Vec::new();
    }

    let offset = time_model::offset_secs(epoch, Instant::now());
    let total = compiled.total_duration;
    let phase = offset.rem_euclid(total);

    let now_local = Local::now();
    let phase_duration = ChronoDuration::milliseconds((phase * 1000.0).round() as i64);
    let loop_start = now_local - phase_duration;
    let total_duration = ChronoDuration::milliseconds((total * 1000.0).round() as i64);

    let prev = time_model::previous_3am(now_local);
    let next = time_model::next_3am(now_local);

    let shows = group_shows(compiled);
    let mut entries: Vec<ScheduleEntry> = Vec::new();

    let mut cursor = loop_start;
    while cursor + total_duration > prev {
        cursor -= total_duration;
    }

    while cursor < next {
        for show in &shows {
            let start_offset = ChronoDuration::milliseconds((show.start_sec * 1000.0).round() as i64);
            let duration = ChronoDuration::milliseconds((show.duration_sec * 1000.0).round() as i64);
            let show_start = cursor + start_offset;
            let show_end = show_start + duration;

            if show_start < next && show_end > prev {
                let is_current = show_start <= now_local && now_local < show_end;
                entries.push(ScheduleEntry {
                    title: show_title(show.video_index, compiled, manifest, def, queue),
                    start: show_start,
                    end: show_end,
                    duration_secs: show.duration_sec,
                    is_current,
                });
            }
        }
        cursor += total_duration;
    }

    entries.sort_by_key(|e| e.start);
    merge_short_runs(entries)
}

/// Collapse consecutive entries that share a title and are each under
/// `MERGE_THRESHOLD_SECS` into one.
fn merge_short_runs(entries: Vec<ScheduleEntry>) -> Vec<ScheduleEntry> {
    let mut merged: Vec<ScheduleEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        let should_merge = matches!(
            merged.last(),
            Some(last) if last.title == entry.title
                && last.duration_secs < MERGE_THRESHOLD_SECS
                && entry.duration_secs < MERGE_THRESHOLD_SECS
        );
        if should_merge {
            let last = merged.last_mut().unwrap();
            last.end = entry.end;
            last.duration_secs += entry.duration_secs;
            last.is_current = last.is_current || entry.is_current;
        } else {
            merged.push(entry);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::compiled::SegmentRecord;
    use crate::channel::definitions::ChannelType;
    use std::path::PathBuf;

    fn def() -> ChannelDefinition {
        ChannelDefinition {
            kind: ChannelType::Sequential,
            name: "Test".to_string(),
            slug: "test".to_string(),
            paths: vec![PathBuf::from("/media")],
        }
    }

    fn compiled_with(segments: Vec<(usize, f64, &str)>) -> CompiledProgram {
        let mut recs = Vec::new();
        let mut cumulative = 0.0;
        for (video_index, d, fp) in segments {
            recs.push(SegmentRecord {
                video_index,
                duration_secs: d,
                relative_url: format!("channels/test/videos/{fp}/seg.ts"),
                cumulative_timestamp: cumulative,
            });
            cumulative += d;
        }
        CompiledProgram { segments: recs, total_duration: cumulative }
    }

    #[test]
    fn test_group_shows_collapses_consecutive_same_index() {
        let compiled = compiled_with(vec![(0, 6.0, "fp0"), (0, 6.0, "fp0"), (1, 4.0, "fp1")]);
        let shows = group_shows(&compiled);
        assert_eq!(shows.len(), 2);
        assert_eq!(shows[0].duration_sec, 12.0);
        assert_eq!(shows[1].start_sec, 12.0);
    }

    #[test]
    fn test_title_for_uses_root_basename() {
        let d = def();
        let title = title_for("/media/cartoons/ep1.mp4", &d);
        assert_eq!(title, "media");
    }

    #[test]
    fn test_title_for_falls_back_to_parent_dir() {
        let d = def();
        let title = title_for("/elsewhere/show/ep1.mp4", &d);
        assert_eq!(title, "show");
    }

    #[test]
    fn test_empty_program_yields_no_entries() {
        let compiled = CompiledProgram::default();
        let entries = build_guide(&compiled, &ChannelManifest::default(), &def(), &[], Instant::now());
        assert!(entries.is_empty());
    }

    #[test]
    fn test_build_guide_covers_programming_day() {
        // Four distinct 600s episodes that all live under the same
        // configured root, so title derivation gives them all "media" —
        // the merge pass should then collapse them into one entry (S6).
        let compiled = compiled_with(vec![(0, 600.0, "fp0"), (1, 600.0, "fp1"), (2, 600.0, "fp2"), (3, 600.0, "fp3")]);
        let mut manifest = ChannelManifest::default();
        for (fp, i) in [("fp0", 0), ("fp1", 1), ("fp2", 2), ("fp3", 3)] {
            manifest.entries.insert(
                fp.to_string(),
                crate::bundle::metadata::ManifestEntry {
                    original_path: format!("/media/show/ep{i}.mp4"),
                    filename: format!("ep{i}.mp4"),
                    added_at: 0,
                },
            );
        }
        let epoch = Instant::now();
        let entries = build_guide(&compiled, &manifest, &def(), &[], epoch);
        assert!(!entries.is_empty());
        assert!(entries.iter().any(|e| (e.duration_secs - 2400.0).abs() < 1.0));
    }

    #[test]
    fn test_exactly_one_entry_is_current() {
        let compiled = compiled_with(vec![(0, 600.0, "fp0"), (1, 600.0, "fp1")]);
        let epoch = Instant::now();
        let entries = build_guide(&compiled, &ChannelManifest::default(), &def(), &[], epoch);
        assert_eq!(entries.iter().filter(|e| e.is_current).count(), 1);
    }

    #[test]
    fn test_title_falls_back_to_queue_when_manifest_entry_missing() {
        // No ChannelManifest entry for "fp0" — title derivation must fall
        // back to the queue's original path, not the bundle fingerprint.
        let compiled = compiled_with(vec![(0, 600.0, "fp0")]);
        let queue = vec![SourceItem { path: "/media/cartoons/ep1.mp4".to_string(), fingerprint: "fp0".to_string() }];
        let epoch = Instant::now();
        let entries = build_guide(&compiled, &ChannelManifest::default(), &def(), &queue, epoch);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "media");
    }
}
