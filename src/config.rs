use std::path::PathBuf;

/// Runtime configuration, sourced entirely from the environment per the
/// service's external-interface contract. No other environment variables
/// affect the core.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of the on-disk bundle/manifest layout (`CACHE_DIR`).
    pub cache_dir: PathBuf,
    /// Path to the channel-definitions JSON file (`CHANNEL_LIST`).
    pub channel_list: PathBuf,
    /// Target segment duration handed to the transcoder (`HLS_SEGMENT_LENGTH_SECONDS`).
    pub hls_segment_length_seconds: f64,
    /// Target transcode frame size (`DIMENSIONS`, `<width>x<height>`).
    pub dimensions: (u32, u32),
    /// Transcoder argument selections. These have no effect on playlist
    /// synthesis; they only shape the Transcode Worker's spawned command.
    pub video_codec: String,
    pub video_preset: String,
    pub video_crf: u8,
    pub audio_codec: String,
    pub audio_bitrate_kbps: u32,
    pub video_filter: Option<String>,
    /// HTTP bind port.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache"),
            channel_list: PathBuf::from("./channels.json"),
            hls_segment_length_seconds: 6.0,
            dimensions: (1280, 720),
            video_codec: "libx264".to_string(),
            video_preset: "veryfast".to_string(),
            video_crf: 23,
            audio_codec: "aac".to_string(),
            audio_bitrate_kbps: 128,
            video_filter: None,
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("CACHE_DIR") {
            config.cache_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CHANNEL_LIST") {
            config.channel_list = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("HLS_SEGMENT_LENGTH_SECONDS") {
            if let Ok(parsed) = v.parse::<f64>() {
                config.hls_segment_length_seconds = parsed;
            }
        }
        if let Ok(v) = std::env::var("DIMENSIONS") {
            if let Some((w, h)) = parse_dimensions(&v) {
                config.dimensions = (w, h);
            } else {
                eprintln!("WARN: Ignoring malformed DIMENSIONS={:?}, expected WxH", v);
            }
        }
        if let Ok(v) = std::env::var("VIDEO_CODEC") {
            config.video_codec = v;
        }
        if let Ok(v) = std::env::var("VIDEO_PRESET") {
            config.video_preset = v;
        }
        if let Ok(v) = std::env::var("VIDEO_CRF") {
            if let Ok(parsed) = v.parse::<u8>() {
                config.video_crf = parsed;
            }
        }
        if let Ok(v) = std::env::var("AUDIO_CODEC") {
            config.audio_codec = v;
        }
        if let Ok(v) = std::env::var("AUDIO_BITRATE_KBPS") {
            if let Ok(parsed) = v.parse::<u32>() {
                config.audio_bitrate_kbps = parsed;
            }
        }
        if let Ok(v) = std::env::var("VIDEO_FILTER") {
            config.video_filter = Some(v);
        }
        if let Ok(v) = std::env::var("PORT") {
            if let Ok(parsed) = v.parse::<u16>() {
                config.port = parsed;
            }
        }

        config
    }
}

fn parse_dimensions(raw: &str) -> Option<(u32, u32)> {
    let (w, h) = raw.split_once(['x', 'X'])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}
