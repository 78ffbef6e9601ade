//! Gateway error taxonomy.

use thiserror::Error;

use super::transport::TransportError;

/// Classified failure from a gateway call.
///
/// The gateway never retries internally; every failure is surfaced so the
/// caller can decide whether and when to retry.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Query text was empty after trimming. Caller error, not retryable.
    #[error("search text must not be empty")]
    InvalidQuery,

    /// Upstream asked for a cooldown; retry after the given number of
    /// seconds. Raised locally while the backoff window is open, without a
    /// network call.
    #[error("rate limited, retry in {0}s")]
    RateLimited(u64),

    /// Transport failure; backoff and quota state are left untouched.
    #[error(transparent)]
    Network(#[from] TransportError),

    /// Provider rejected the request with a client or quota error status.
    #[error("request rejected by upstream (HTTP {0})")]
    QuotaExceeded(u16),

    /// Provider-reported application error from the response body.
    #[error("upstream error {id} ({name}): {message}")]
    Upstream {
        id: u32,
        name: String,
        message: String,
    },

    /// Response body did not match the documented shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Whether a caller may reasonably retry after this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited(_)
                | GatewayError::Network(_)
                | GatewayError::QuotaExceeded(_)
        )
    }
}
