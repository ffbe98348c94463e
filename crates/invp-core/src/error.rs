//! Error types for the invp-core library.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for the invp library.
///
/// Every call either succeeds with a payload or fails with exactly one of
/// these kinds. Nothing is retried or translated on the way up.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Missing or invalid configuration, raised at construction time.
    #[error("configuration error: {0}")]
    Config(String),

    /// The input file could not be read. Raised before any network call.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Network or connection fault during submit or poll.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The submission response did not carry a usable job handle.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The service reported the job as failed.
    #[error("job failed: {diagnostic}")]
    JobFailed { diagnostic: String },

    /// Polling exceeded the configured maximum wait.
    #[error("job did not finish within {}s", .waited.as_secs())]
    Timeout { waited: Duration },

    /// The caller cancelled the wait.
    #[error("wait for job cancelled")]
    Cancelled,
}

impl ClientError {
    /// Whether resubmitting the same document may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Timeout { .. })
    }
}

/// Result type for the invp library.
pub type Result<T> = std::result::Result<T, ClientError>;
