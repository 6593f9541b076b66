//! Error types for the proxy.

use thiserror::Error;

/// Errors raised by the proxy.
///
/// Every error raised while executing a tool — upstream, decode, and
/// argument errors alike — is caught at the dispatch boundary and turned
/// into an `isError` tool result; none escapes the invocation that produced
/// it. Only `Io` (the stdio loop itself) propagates out of the server.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Upstream returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Connection-level failure talking to the upstream.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// No usable payload in the upstream response (no parsable SSE data line,
    /// or the expected `result.content[0].text` field is missing).
    #[error("failed to parse search response")]
    ParseResponse,

    /// The result text was present but not valid JSON after the unescape
    /// attempt.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure reading stdin or writing stdout.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required tool argument was not provided.
    #[error("missing required argument: {0}")]
    MissingArg(String),

    /// A tool argument had an unusable value.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The requested tool is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, ProxyError>;
