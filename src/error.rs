//! Error kinds for calls against the vector service.
//!
//! Every failure of a remote call resolves to one of these variants. The
//! pipelines decide which ones abort a command and which are collected and
//! reported at the end (see [`EndeeError::ChunkInsert`]).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EndeeError {
    /// The health probe failed; nothing else was attempted.
    #[error("vector service is not reachable at {url}")]
    Unreachable { url: String },

    /// Index creation failed for a reason other than "already exists".
    #[error("failed to create index '{index}': {message}")]
    Provisioning { index: String, message: String },

    /// One insert batch was rejected. `start..end` is the record range.
    #[error("failed to insert chunk {start}-{end}: {message}")]
    ChunkInsert {
        start: usize,
        end: usize,
        message: String,
    },

    /// The search request itself failed or returned a non-success status.
    #[error("search failed: {message}")]
    SearchRequest { message: String },

    /// The search response could not be read under any known shape.
    #[error("could not decode search response ({payload_len} bytes): {reason}")]
    Decode { payload_len: usize, reason: String },

    /// An embedding had a different length than the index dimension.
    #[error("embedding has {actual} dimensions but index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Format a non-success response for an error message.
pub(crate) fn status_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, body)
    }
}
