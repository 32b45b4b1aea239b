//! Error types for the pipeline and its collaborators.

use thiserror::Error;

/// Failure of the file-listing provider for one search step.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Repository not found: {0}")]
    NotFound(String),

    #[allow(dead_code)] // Raised by hosted listing providers, not the local tree
    #[error("Rate limited by file-listing provider (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[allow(dead_code)] // Raised by hosted listing providers, not the local tree
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a call to the reasoning engine.
#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to reasoning engine at {0}")]
    Connect(String),

    #[error("Reasoning engine API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to serialize analysis context: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Hard failure of one chunk. Recorded by the orchestrator, never fatal to a run.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("Reasoning engine failed: {0}")]
    Reasoning(#[from] ReasoningError),
}
