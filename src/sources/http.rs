//! Client for the gallery server's paginated listing and search endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::FetchError;
use crate::models::{ContextKind, MediaItem, Page, PageRequest};
use crate::paging::PageSource;

/// Request timeout used when the caller does not configure one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    items: Vec<MediaItem>,
    #[serde(alias = "totalItems")]
    total: usize,
}

/// Fetches pages from `{base}/api/list` (directories) or `{base}/api/search`
/// (queries), depending on the kind of controller it serves.
pub struct HttpPageSource {
    client: Client,
    base: String,
    kind: ContextKind,
}

impl HttpPageSource {
    pub fn new(base: &str, kind: ContextKind, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("idxd-pager/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, base, kind))
    }

    pub fn with_client(client: Client, base: &str, kind: ContextKind) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            kind,
        }
    }

    /// Full request URL for one page, query string included.
    pub fn page_url(&self, request: &PageRequest) -> Result<Url, FetchError> {
        let (endpoint, context_param) = match self.kind {
            ContextKind::Directory => ("list", "path"),
            ContextKind::Search => ("search", "q"),
        };
        let page = request.page.to_string();
        let per_page = request.page_size.to_string();
        let params = [
            (context_param, request.context.as_str()),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
            ("sort", request.sort.field.as_str()),
            ("order", request.sort.order.as_str()),
            ("filter", request.sort.filter.as_str()),
        ];
        Url::parse_with_params(&format!("{}/api/{}", self.base, endpoint), &params)
            .map_err(|e| FetchError::Network(format!("invalid url {}: {}", self.base, e)))
    }
}

/// Parses a response body into a page.
fn decode_page(body: &str) -> Result<Page<MediaItem>, FetchError> {
    let response: PageResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(Page::new(response.items, response.total))
}

#[async_trait(?Send)]
impl PageSource<MediaItem> for HttpPageSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<MediaItem>, FetchError> {
        let url = self.page_url(request)?;
        trace!(%url, "GET page");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(context = %request.context, page = request.page, %status, "Server rejected page request");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        decode_page(&body)
    }
}
