//! Error types for the stdio-to-HTTP proxy

use thiserror::Error;

/// Fatal, loop-level failures. Per-line failures never surface here; they
/// are converted into JSON-RPC error envelopes on stdout instead.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("writer task failed: {0}")]
    WriterTask(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Per-message forwarding failures. The `Display` string of each variant is
/// exactly what lands in the `error.message` field of the envelope written
/// back to stdout.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Network-level failure: DNS, connection refused, request timeout.
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// Remote answered outside the 2xx range.
    #[error("HTTP {}: {}", .0.as_u16(), .0.canonical_reason().unwrap_or("Unknown Status"))]
    Status(reqwest::StatusCode),

    /// Remote answered 2xx but the body is not valid JSON.
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}
