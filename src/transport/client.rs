//! Transport contract used by the interceptor chain.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{WireRequest, WireResponse};

/// Contract that abstracts the network I/O behind the interceptor chain.
///
/// Implementations must drain the response body before returning, so a
/// stream interrupted mid-body surfaces as a [`TransportError`] and can be
/// retried like any other I/O failure.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, TransportError>;
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("timeout elapsed: {0}")]
    Timeout(String),
    #[error("response stream interrupted: {0}")]
    Body(String),
    #[error("i/o error: {0}")]
    Io(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("redirect policy violated: {0}")]
    Redirect(String),
}

impl TransportError {
    /// Whether replaying the identical request could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            TransportError::InvalidRequest(_) | TransportError::Redirect(_)
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_builder() {
            TransportError::InvalidRequest(message)
        } else if err.is_redirect() {
            TransportError::Redirect(message)
        } else if err.is_timeout() {
            TransportError::Timeout(message)
        } else if err.is_connect() {
            TransportError::Connect(message)
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(message)
        } else {
            TransportError::Io(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_requests_and_redirect_loops_are_terminal() {
        assert!(TransportError::Connect("refused".into()).is_retryable());
        assert!(TransportError::Timeout("read".into()).is_retryable());
        assert!(TransportError::Body("reset".into()).is_retryable());
        assert!(TransportError::Io("broken pipe".into()).is_retryable());
        assert!(!TransportError::InvalidRequest("bad header".into()).is_retryable());
        assert!(!TransportError::Redirect("too many redirects".into()).is_retryable());
    }
}
