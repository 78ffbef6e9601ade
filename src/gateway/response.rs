//! Provider response wire format.
//!
//! One JSON body shape carries both outcomes: a result page (`items` plus
//! quota bookkeeping) or an error envelope (`error_id`/`error_name`/
//! `error_message`). Everything is optional at the wire level; the gateway
//! decides which shape it actually received.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw provider response body, before classification.
#[derive(Debug, Deserialize)]
pub(crate) struct RawSearchResponse {
    pub items: Option<Vec<ResultItem>>,
    #[serde(default)]
    pub has_more: bool,
    pub quota_remaining: Option<u32>,
    /// Cooldown request in seconds, sometimes present on a 200 body.
    pub backoff: Option<u64>,
    pub error_id: Option<u32>,
    pub error_name: Option<String>,
    pub error_message: Option<String>,
}

/// Owner of a question, as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultOwner {
    pub user_id: Option<u64>,
    pub display_name: Option<String>,
    pub reputation: Option<u64>,
}

/// One question from a search result page.
///
/// Read-only projection of upstream data; no local identity beyond the
/// provider's question id. Absent fields deserialize to defaults rather
/// than failing the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub question_id: u64,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub answer_count: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner: Option<ResultOwner>,
    #[serde(default)]
    pub is_answered: bool,
    pub accepted_answer_id: Option<u64>,
    #[serde(with = "chrono::serde::ts_seconds_option", default)]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_seconds_option", default)]
    pub last_activity_date: Option<DateTime<Utc>>,
}

/// A parsed page of results plus advisory telemetry snapshots.
///
/// `quota_remaining` and `backoff_seconds` reflect gateway state at call
/// completion; they are for display, not authoritative anywhere else.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultPage {
    pub items: Vec<ResultItem>,
    pub has_more: bool,
    pub quota_remaining: Option<u32>,
    pub backoff_seconds: Option<u64>,
}
