//! End-to-end gateway behavior against a scripted transport.
//!
//! No network: responses are replayed in order and every call is counted,
//! so backoff short-circuiting can be asserted precisely.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use codeq_search::config::GatewayConfig;
use codeq_search::gateway::{
    GatewayError, SearchGateway, SearchQuery, SearchTransport, TransportError, TransportResponse,
};

/// Replays scripted responses in order and counts calls.
struct ScriptedTransport {
    responses: Mutex<Vec<Result<TransportResponse, TransportError>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<TransportResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchTransport for ScriptedTransport {
    async fn fetch(&self, _url: &str) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        assert!(!responses.is_empty(), "transport called more times than scripted");
        responses.remove(0)
    }
}

fn gateway_with(transport: &Arc<ScriptedTransport>) -> SearchGateway {
    SearchGateway::with_transport(
        GatewayConfig::default(),
        Arc::clone(transport) as Arc<dyn SearchTransport>,
    )
}

fn response(status: u16, headers: &[(&str, &str)], body: &str) -> TransportResponse {
    TransportResponse {
        status,
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: body.to_string(),
    }
}

/// Minimal well-formed result body with `count` items.
fn items_body(count: usize, has_more: bool, quota_remaining: u32) -> String {
    let items: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"question_id": {id}, "title": "q{id}", "link": "https://example.com/q/{id}"}}"#,
                id = i + 1
            )
        })
        .collect();
    format!(
        r#"{{"items": [{}], "has_more": {}, "quota_max": 300, "quota_remaining": {}}}"#,
        items.join(","),
        has_more,
        quota_remaining
    )
}

#[tokio::test]
async fn empty_query_fails_without_network_call() {
    let transport = ScriptedTransport::new(vec![]);
    let gateway = gateway_with(&transport);

    let result = gateway.search(&SearchQuery::new("")).await;
    assert!(matches!(result, Err(GatewayError::InvalidQuery)));

    let result = gateway.search(&SearchQuery::new("   ")).await;
    assert!(matches!(result, Err(GatewayError::InvalidQuery)));

    assert_eq!(transport.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn throttle_response_opens_backoff_window() {
    let transport = ScriptedTransport::new(vec![Ok(response(
        503,
        &[("Retry-After", "30")],
        "",
    ))]);
    let gateway = gateway_with(&transport);

    let result = gateway.search(&SearchQuery::new("x")).await;
    assert!(matches!(result, Err(GatewayError::RateLimited(30))));
    assert_eq!(transport.calls(), 1);

    // Within the window the rejection is local; the transport is not hit
    let result = gateway.search(&SearchQuery::new("x")).await;
    assert!(matches!(result, Err(GatewayError::RateLimited(secs)) if secs <= 30));
    assert_eq!(transport.calls(), 1);

    assert!(!gateway.is_available().await);
    assert_eq!(gateway.backoff_remaining().await, Some(30));
}

#[tokio::test(start_paused = true)]
async fn backoff_expires_by_wall_clock() {
    let transport = ScriptedTransport::new(vec![
        Ok(response(429, &[("retry-after", "5")], "")),
        Ok(response(200, &[], &items_body(1, false, 99))),
    ]);
    let gateway = gateway_with(&transport);

    let result = gateway.search(&SearchQuery::new("x")).await;
    assert!(matches!(result, Err(GatewayError::RateLimited(5))));

    tokio::time::advance(std::time::Duration::from_secs(6)).await;
    assert!(gateway.is_available().await);

    let page = gateway.search(&SearchQuery::new("x")).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn throttle_without_hint_uses_default_backoff() {
    let transport = ScriptedTransport::new(vec![Ok(response(503, &[], ""))]);
    let config = GatewayConfig {
        default_backoff_secs: 45,
        ..Default::default()
    };
    let gateway =
        SearchGateway::with_transport(config, Arc::clone(&transport) as Arc<dyn SearchTransport>);

    let result = gateway.search(&SearchQuery::new("x")).await;
    assert!(matches!(result, Err(GatewayError::RateLimited(45))));
}

#[tokio::test]
async fn success_page_parses_and_updates_quota() {
    let transport = ScriptedTransport::new(vec![Ok(response(
        200,
        &[],
        &items_body(12, true, 250),
    ))]);
    let gateway = gateway_with(&transport);

    assert_eq!(gateway.quota_remaining().await, None);

    let page = gateway.search(&SearchQuery::new("react")).await.unwrap();
    assert_eq!(page.items.len(), 12);
    assert!(page.has_more);
    assert_eq!(page.quota_remaining, Some(250));
    assert_eq!(page.backoff_seconds, None);

    assert_eq!(gateway.quota_remaining().await, Some(250));
    assert!(gateway.is_available().await);
}

#[tokio::test(start_paused = true)]
async fn backoff_hint_on_success_body_blocks_next_call() {
    let body = r#"{"items": [], "has_more": false, "quota_remaining": 40, "backoff": 10}"#;
    let transport = ScriptedTransport::new(vec![Ok(response(200, &[], body))]);
    let gateway = gateway_with(&transport);

    let page = gateway.search(&SearchQuery::new("x")).await.unwrap();
    assert_eq!(page.quota_remaining, Some(40));
    assert_eq!(page.backoff_seconds, Some(10));

    let result = gateway.search(&SearchQuery::new("x")).await;
    assert!(matches!(result, Err(GatewayError::RateLimited(secs)) if secs <= 10));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn missing_items_is_malformed() {
    let transport = ScriptedTransport::new(vec![Ok(response(
        200,
        &[],
        r#"{"has_more": false, "quota_remaining": 10}"#,
    ))]);
    let gateway = gateway_with(&transport);

    let result = gateway.search(&SearchQuery::new("x")).await;
    assert!(matches!(result, Err(GatewayError::MalformedResponse(_))));
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let transport = ScriptedTransport::new(vec![Ok(response(200, &[], "<html>oops</html>"))]);
    let gateway = gateway_with(&transport);

    let result = gateway.search(&SearchQuery::new("x")).await;
    assert!(matches!(result, Err(GatewayError::MalformedResponse(_))));
}

#[tokio::test]
async fn error_envelope_is_surfaced() {
    let body = r#"{"error_id": 502, "error_name": "throttle_violation",
                   "error_message": "too many requests from this IP"}"#;
    let transport = ScriptedTransport::new(vec![Ok(response(200, &[], body))]);
    let gateway = gateway_with(&transport);

    let result = gateway.search(&SearchQuery::new("x")).await;
    match result {
        Err(GatewayError::Upstream { id, name, message }) => {
            assert_eq!(id, 502);
            assert_eq!(name, "throttle_violation");
            assert_eq!(message, "too many requests from this IP");
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn client_error_status_is_quota_exceeded() {
    let transport = ScriptedTransport::new(vec![Ok(response(400, &[], ""))]);
    let gateway = gateway_with(&transport);

    let result = gateway.search(&SearchQuery::new("x")).await;
    assert!(matches!(result, Err(GatewayError::QuotaExceeded(400))));

    // Quota errors do not open a backoff window
    assert!(gateway.is_available().await);
}

#[tokio::test]
async fn transport_failure_leaves_state_untouched() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::Network("dns failure".to_string())),
        Ok(response(200, &[], &items_body(1, false, 7))),
    ]);
    let gateway = gateway_with(&transport);

    let result = gateway.search(&SearchQuery::new("x")).await;
    assert!(matches!(result, Err(GatewayError::Network(_))));

    // Neither backoff nor quota state was mutated
    assert!(gateway.is_available().await);
    assert_eq!(gateway.quota_remaining().await, None);
    assert_eq!(gateway.backoff_remaining().await, None);

    // The gateway stays usable for the next call
    let page = gateway.search(&SearchQuery::new("x")).await.unwrap();
    assert_eq!(page.quota_remaining, Some(7));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn clones_share_advisory_state() {
    let transport = ScriptedTransport::new(vec![Ok(response(
        200,
        &[],
        &items_body(1, false, 123),
    ))]);
    let gateway = gateway_with(&transport);
    let clone = gateway.clone();

    gateway.search(&SearchQuery::new("x")).await.unwrap();
    assert_eq!(clone.quota_remaining().await, Some(123));
}
