//! Live-Playlist Synthesizer: turns a compiled program plus a wall-clock
//! offset into a rolling HLS manifest.

pub mod synthesizer;

pub use synthesizer::render;
