//! Rendered-page fetching through the ZenRows proxy API

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const ZENROWS_API_URL: &str = "https://api.zenrows.com/v1/";

/// Rendering wait for the listing page, so client-side rows settle
pub const LISTING_WAIT_MS: u64 = 3000;

/// Rendering options forwarded to the proxy service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub js_render: bool,
    pub wait_ms: Option<u64>,
    pub premium_proxy: bool,
}

impl FetchOptions {
    /// Product detail pages only need the premium proxy
    pub fn detail() -> Self {
        Self {
            js_render: false,
            wait_ms: None,
            premium_proxy: true,
        }
    }

    /// The listing is rendered client-side
    pub fn listing() -> Self {
        Self {
            js_render: true,
            wait_ms: Some(LISTING_WAIT_MS),
            premium_proxy: true,
        }
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if self.js_render {
            params.push(("js_render", "true".to_string()));
        }
        if let Some(wait) = self.wait_ms {
            params.push(("wait", wait.to_string()));
        }
        if self.premium_proxy {
            params.push(("premium_proxy", "true".to_string()));
        }
        params
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}{}", detail_suffix(.detail))]
    Status {
        status: u16,
        url: String,
        detail: Option<String>,
    },
    #[error("request for {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

impl FetchError {
    /// HTTP status of the proxy response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
        }
    }
}

/// Anything that can turn a target URL into rendered HTML
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String, FetchError>;
}

// ZenRows error bodies look like {"code": "...", "detail": "..."}
#[derive(Debug, Deserialize)]
struct ZenRowsErrorBody {
    code: Option<String>,
    detail: Option<String>,
}

impl ZenRowsErrorBody {
    fn describe(self) -> Option<String> {
        match (self.code, self.detail) {
            (Some(code), Some(detail)) => Some(format!("{} {}", code, detail)),
            (code, detail) => detail.or(code),
        }
    }
}

/// reqwest-backed client for the ZenRows universal scraper API
pub struct ZenRowsClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl ZenRowsClient {
    pub fn new(api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; CpuScraper/1.0)")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: ZENROWS_API_URL.to_string(),
        })
    }
}

#[async_trait]
impl PageFetcher for ZenRowsClient {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String, FetchError> {
        let mut query = vec![("apikey", self.api_key.clone()), ("url", url.to_string())];
        query.extend(options.query_params());

        debug!("GET {} via proxy ({:?})", url, options);

        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ZenRowsErrorBody>()
                .await
                .ok()
                .and_then(ZenRowsErrorBody::describe);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                detail,
            });
        }

        response.text().await.map_err(transport)
    }
}
