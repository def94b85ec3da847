//! Centralized error handling for the broadcast engine.
//!
//! This module defines the `AppError` enum, which encapsulates all possible
//! errors that can occur within the application. It uses `thiserror` for
//! idiomatic error definition and implements `serde::Serialize` so handlers
//! can turn errors into response bodies.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// The primary error type for the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Error related to filesystem operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing or serializing JSON (channel definitions, manifest, metadata).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error related to a bundle on disk being malformed or unreadable.
    #[error("Bundle error: {0}")]
    Bundle(String),

    /// Error spawning or running the external transcoder.
    #[error("Transcode error: {0}")]
    Transcode(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// A specialized `Result` type for broadcast-engine operations.
pub type AppResult<T> = Result<T, AppError>;
