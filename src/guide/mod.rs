//! Program Guide: derives a human-readable schedule from a channel's
//! Compiled Program and the same time model the Synthesizer uses.

pub mod builder;
pub mod cache;

pub use builder::{build_guide, ScheduleEntry};
pub use cache::GuideCache;
