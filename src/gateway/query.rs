//! Search query construction.
//!
//! `SearchQuery` carries the caller's parameters; the request URL is built
//! here as pure string work so it can be tested without a transport.

use crate::config::GatewayConfig;

/// Largest page size the provider accepts; larger requests are clamped.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Sort key for search results (`sort=` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    /// Most recently active first
    #[default]
    Activity,
    /// Creation date
    Creation,
    /// Vote score
    Votes,
    /// Provider relevance ranking
    Relevance,
}

impl SortKey {
    /// Wire value for the `sort=` parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortKey::Activity => "activity",
            SortKey::Creation => "creation",
            SortKey::Votes => "votes",
            SortKey::Relevance => "relevance",
        }
    }
}

/// Sort direction (`order=` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    /// Descending (provider default)
    #[default]
    Desc,
    /// Ascending
    Asc,
}

impl SortOrder {
    /// Wire value for the `order=` parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Desc => "desc",
            SortOrder::Asc => "asc",
        }
    }
}

/// Parameters for one search invocation.
///
/// Created per call, immutable once handed to the gateway, discarded after
/// use.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    text: String,
    page: u32,
    page_size: u32,
    sort: SortKey,
    order: SortOrder,
    tagged: Option<String>,
}

impl SearchQuery {
    /// Create a query with default pagination and sorting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortKey::default(),
            order: SortOrder::default(),
            tagged: None,
        }
    }

    /// Set the result page to fetch (1-based).
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set the requested page size.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the sort key.
    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Set the sort order.
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Restrict results to questions carrying `tag`.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tagged = Some(tag.into());
        self
    }

    /// Query text as given by the caller.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Build the provider request URL.
    ///
    /// Page is floored at 1 and page size clamped to `[1, MAX_PAGE_SIZE]`
    /// here, so no out-of-range pagination ever reaches the wire.
    pub(crate) fn request_url(&self, config: &GatewayConfig) -> String {
        let mut url = format!(
            "{}?site={}&q={}",
            config.endpoint,
            urlencoding::encode(&config.site),
            urlencoding::encode(self.text.trim()),
        );

        url.push_str(&format!("&page={}", self.page.max(1)));
        url.push_str(&format!(
            "&pagesize={}",
            self.page_size.clamp(1, MAX_PAGE_SIZE)
        ));
        url.push_str(&format!("&order={}", self.order.as_param()));
        url.push_str(&format!("&sort={}", self.sort.as_param()));

        if let Some(ref tag) = self.tagged {
            url.push_str(&format!("&tagged={}", urlencoding::encode(tag)));
        }
        if let Some(ref filter) = config.filter {
            url.push_str(&format!("&filter={}", urlencoding::encode(filter)));
        }
        if let Some(ref key) = config.key {
            url.push_str(&format!("&key={}", urlencoding::encode(key)));
        }

        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            endpoint: "https://api.example.com/search".to_string(),
            site: "stackoverflow".to_string(),
            filter: Some("default".to_string()),
            key: None,
            ..Default::default()
        }
    }

    #[test]
    fn builds_basic_url() {
        let url = SearchQuery::new("borrow checker").request_url(&test_config());
        assert_eq!(
            url,
            "https://api.example.com/search?site=stackoverflow&q=borrow%20checker\
             &page=1&pagesize=30&order=desc&sort=activity&filter=default"
        );
    }

    #[test]
    fn oversized_page_size_is_clamped() {
        let url = SearchQuery::new("react")
            .page_size(500)
            .request_url(&test_config());
        assert!(url.contains("&pagesize=100"));
    }

    #[test]
    fn zero_page_and_size_are_floored() {
        let url = SearchQuery::new("react")
            .page(0)
            .page_size(0)
            .request_url(&test_config());
        assert!(url.contains("&page=1"));
        assert!(url.contains("&pagesize=1"));
    }

    #[test]
    fn text_is_trimmed_and_encoded() {
        let url = SearchQuery::new("  a&b  ").request_url(&test_config());
        assert!(url.contains("&q=a%26b&"));
    }

    #[test]
    fn tag_and_key_are_appended() {
        let config = GatewayConfig {
            key: Some("k3y((".to_string()),
            ..test_config()
        };
        let url = SearchQuery::new("hooks")
            .tagged("reactjs")
            .sort(SortKey::Votes)
            .order(SortOrder::Asc)
            .request_url(&config);

        assert!(url.contains("&order=asc"));
        assert!(url.contains("&sort=votes"));
        assert!(url.contains("&tagged=reactjs"));
        assert!(url.contains("&key=k3y%28%28"));
    }
}
