//! Live-Playlist Synthesizer: given an offset in seconds since a
//! channel's epoch, renders a rolling segmented manifest with monotonic
//! sequence numbers and discontinuity markers. Pure and deterministic —
//! it never touches the filesystem, only the pre-compiled in-memory
//! `CompiledProgram`.

use crate::channel::compiled::CompiledProgram;

/// Segments kept immediately before the current index, clamped at 0 (not
/// wrapped across loops on the low side).
pub const WINDOW_BEHIND: usize = 30;
/// Segments kept starting at the current index, wrapping modulo the
/// program length so playback continues seamlessly across the loop
/// boundary. Large enough to outrun any reasonable player buffer.
pub const WINDOW_AHEAD: usize = 2000;

/// Render the live manifest for `program` at `offset` seconds since the
/// channel's epoch, using the default window sizes.
pub fn render(program: &CompiledProgram, offset: f64) -> String {
    render_with_window(program, offset, WINDOW_BEHIND, WINDOW_AHEAD)
}

/// Same as `render`, but with explicit window sizes — split out so the
/// windowing behavior can be exercised directly in tests without
/// constructing thousands of segments.
pub fn render_with_window(
    program: &CompiledProgram,
    offset: f64,
    window_behind: usize,
    window_ahead: usize,
) -> String {
    let l = program.len();
    if l == 0 {
        return "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-ENDLIST\n".to_string();
    }

    let offset = offset.max(0.0);
    let total = program.total_duration;
    let phase = offset.rem_euclid(total);
    let loop_count = (offset / total).floor() as i64;

    // Smallest index whose cumulative timestamp is strictly greater than
    // phase; falls back to 0 under floating-point edge conditions.
    let k = program
        .segments
        .iter()
        .position(|s| s.cumulative_timestamp > phase)
        .unwrap_or(0);

    let behind_count = window_behind.min(k);
    let start = k - behind_count;
    // Not clamped to `l`. The forward side wraps modulo `l` (line below)
    // to fill the full `windowAhead` cushion even when the program has
    // far fewer than `windowAhead` segments.
    let window_len = behind_count + window_ahead;

    let mut window = Vec::with_capacity(window_len);
    for i in 0..window_len {
        window.push(&program.segments[(start + i) % l]);
    }

    let first_sequence = loop_count * (l as i64) + (start as i64);
    let target_duration = window
        .iter()
        .fold(0.0_f64, |max, s| max.max(s.duration_secs))
        .max(2.0)
        .ceil() as i64;

    let mut body = String::new();
    for (i, seg) in window.iter().enumerate() {
        if i > 0 && window[i - 1].video_index != seg.video_index {
            body.push_str("#EXT-X-DISCONTINUITY\n");
        }
        body.push_str(&format!("#EXTINF:{:.6},\n", seg.duration_secs));
        body.push_str(&seg.relative_url);
        body.push('\n');
    }

    format!(
        "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:{}\n#EXT-X-MEDIA-SEQUENCE:{}\n{}",
        target_duration, first_sequence, body
    )
}
