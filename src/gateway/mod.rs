//! Quota-aware gateway to the upstream question search API.
//!
//! Single choke point for outbound search calls: rejects requests locally
//! while a backoff window is open, issues one GET per call, and harvests
//! quota and backoff signals from every response. Backoff expires purely by
//! wall-clock; there is no explicit transition event.

mod backoff;
mod error;
mod query;
mod quota;
mod response;
mod transport;

pub use backoff::BackoffClock;
pub use error::GatewayError;
pub use query::{SearchQuery, SortKey, SortOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use quota::QuotaTracker;
pub use response::{ResultItem, ResultOwner, SearchResultPage};
pub use transport::{HttpTransport, SearchTransport, TransportError, TransportResponse};

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use response::RawSearchResponse;

/// Advisory state shared by all clones of a gateway.
///
/// Process-lifetime only; resets on restart. Read-modify-write happens
/// under one lock, and overlapping calls resolve last-writer-wins.
#[derive(Debug, Default)]
struct GatewayState {
    backoff: BackoffClock,
    quota: QuotaTracker,
}

/// Gateway through which every call to the search provider passes.
pub struct SearchGateway {
    config: GatewayConfig,
    transport: Arc<dyn SearchTransport>,
    state: Arc<RwLock<GatewayState>>,
}

impl SearchGateway {
    /// Create a gateway backed by a real HTTP transport.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let transport = HttpTransport::new(&config.user_agent, config.timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a gateway with a caller-supplied transport.
    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn SearchTransport>) -> Self {
        Self {
            config,
            transport,
            state: Arc::new(RwLock::new(GatewayState::default())),
        }
    }

    /// Execute one search call.
    ///
    /// Fails fast with [`GatewayError::RateLimited`] while a backoff window
    /// is open, without touching the network. Never retries; the caller
    /// decides whether and when to try again.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResultPage, GatewayError> {
        if query.text().trim().is_empty() {
            return Err(GatewayError::InvalidQuery);
        }

        {
            let state = self.state.read().await;
            if let Some(secs) = state.backoff.remaining_secs() {
                debug!("rejected locally, backoff active for {}s", secs);
                return Err(GatewayError::RateLimited(secs));
            }
        }

        let url = query.request_url(&self.config);
        debug!("search '{}' via {}", query.text().trim(), self.config.endpoint);

        let response = self.transport.fetch(&url).await?;

        match response.status {
            429 | 503 => {
                let secs = response
                    .header("retry-after")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(self.config.default_backoff_secs);
                let mut state = self.state.write().await;
                state.backoff.set_backoff(secs);
                warn!(
                    "throttled by upstream (HTTP {}), backing off {}s",
                    response.status, secs
                );
                return Err(GatewayError::RateLimited(secs));
            }
            status if !(200..300).contains(&status) => {
                warn!("request rejected by upstream (HTTP {})", status);
                return Err(GatewayError::QuotaExceeded(status));
            }
            _ => {}
        }

        let raw: RawSearchResponse = serde_json::from_str(&response.body)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        if let Some(id) = raw.error_id {
            let name = raw.error_name.unwrap_or_default();
            let message = raw.error_message.unwrap_or_default();
            warn!("upstream error {} ({}): {}", id, name, message);
            return Err(GatewayError::Upstream { id, name, message });
        }

        let items = raw.items.ok_or_else(|| {
            GatewayError::MalformedResponse("response body has no items array".to_string())
        })?;

        let mut state = self.state.write().await;
        if let Some(remaining) = raw.quota_remaining {
            state.quota.update(remaining);
        }
        if let Some(secs) = raw.backoff {
            warn!("upstream requested {}s backoff on a successful response", secs);
            state.backoff.set_backoff(secs);
        }

        debug!(
            "{} items, has_more={}, quota_remaining={:?}",
            items.len(),
            raw.has_more,
            state.quota.get()
        );

        Ok(SearchResultPage {
            items,
            has_more: raw.has_more,
            quota_remaining: state.quota.get(),
            backoff_seconds: state.backoff.remaining_secs(),
        })
    }

    /// Last quota figure reported by upstream, if any.
    pub async fn quota_remaining(&self) -> Option<u32> {
        self.state.read().await.quota.get()
    }

    /// Seconds left in the current backoff window, if one is open.
    pub async fn backoff_remaining(&self) -> Option<u64> {
        self.state.read().await.backoff.remaining_secs()
    }

    /// True when a call would not be rejected locally.
    pub async fn is_available(&self) -> bool {
        !self.state.read().await.backoff.is_blocked()
    }
}

impl Clone for SearchGateway {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            transport: self.transport.clone(),
            state: self.state.clone(),
        }
    }
}
