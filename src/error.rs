//! Error types for decompression, recovery and storage.

use thiserror::Error;

/// The compressed input could not be turned into a container.
#[derive(Error, Debug)]
pub enum DecompressionError {
    /// The gzip stream is malformed or ends early.
    #[error("failed to decompress container: {0}")]
    InvalidStream(#[from] std::io::Error),

    /// The stream expands past the decompressed size limit.
    #[error("container expands past {limit} bytes (compressed: {compressed} bytes)")]
    TooLarge {
        /// Size of the compressed input.
        compressed: usize,
        /// Decompressed size limit.
        limit: u64,
    },

    /// The blocking decompression task did not complete.
    #[error("decompression task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Extracted bytes could not be recovered as a JSON document.
#[derive(Error, Debug)]
pub enum RecoveryError {
    /// The bytes are archive metadata (extended attributes and the like)
    /// rather than the document itself.
    #[error("content is archive metadata, not a document (found {signature:?})")]
    ContaminationDetected {
        /// The signature that matched.
        signature: &'static str,
    },

    /// Every recovery strategy failed. Carries the strict parse error.
    #[error("content is not valid JSON: {source}")]
    ParseFailed {
        /// Error from the first, unmodified parse attempt.
        #[source]
        source: serde_json::Error,
    },
}

/// The storage collaborator failed to answer.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Local filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote store answered with an unexpected status.
    #[error("storage request failed with status: {0}")]
    Status(reqwest::StatusCode),

    /// Transport kept failing after every configured attempt.
    #[error("gave up fetching {key} after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Key being fetched.
        key: String,
        /// Requests made, including the first.
        attempts: u32,
        /// Error from the last attempt.
        #[source]
        source: reqwest::Error,
    },

    /// The key cannot address an object in this store.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Failures with no local fallback, surfaced to the HTTP boundary.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Fetching the stored object failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The stored object is not a usable container.
    #[error(transparent)]
    Decompression(#[from] DecompressionError),
}
