//! Error types for the image store client.
//!
//! # Design
//! Server answers and transport failures are kept apart: a non-2xx status is
//! `Http` with the raw status code and body, while a connection that never
//! produced an answer is `Transport`. JSON problems are split by direction,
//! `Encoding` for request metadata and `Decode` for response bodies.

/// Errors returned by `ImageStore` operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (DNS, connect, protocol).
    #[error("transport failed: {0}")]
    Transport(#[from] ureq::Error),

    /// A response expected to hold JSON could not be decoded.
    #[error("response is not valid JSON: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// Request metadata could not be encoded as JSON.
    #[error("metadata encoding failed: {0}")]
    Encoding(#[source] serde_json::Error),

    /// Reading a streamed body failed part way through.
    #[error("reading response body failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
