//! Error types for the trigger backend and the persisted trigger map.
//!
//! Parsing has no error type at all: absence of a match is a normal `None`
//! result. The errors here are caught close to where they occur and degrade
//! to partial success; they never propagate as fatal to callers.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by an alert backend.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Trigger backend rejected the request: {0}")]
    Rejected(String),

    #[error("Trigger backend unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown trigger id: {0}")]
    UnknownTrigger(String),
}

/// Errors from the persisted trigger-map store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode trigger map: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Store path has no parent directory: {0}")]
    InvalidPath(PathBuf),
}
