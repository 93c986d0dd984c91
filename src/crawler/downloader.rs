use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument, warn};
use url::{Url, form_urlencoded};

use crate::config::ProxyConfig;
use crate::errors::ExtractError;

/// Source of chapter page bodies.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String, ExtractError>> + Send;
}

/// Fetches chapter pages through the configured CORS proxies.
pub struct ProxyFetcher {
    client: Client,
    proxy: ProxyConfig,
}

impl ProxyFetcher {
    pub fn new(proxy: ProxyConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(ua_generator::ua::spoof_ua())
            .timeout(Duration::from_secs(proxy.timeout_secs))
            .build()?;
        Ok(Self { client, proxy })
    }

    /// Request URLs to try for `target`, one per proxy, in order.
    pub fn request_urls(&self, target: &Url) -> Vec<String> {
        if !self.proxy.enabled || self.proxy.bases.is_empty() {
            return vec![target.to_string()];
        }

        let encoded: String = form_urlencoded::byte_serialize(target.as_str().as_bytes()).collect();
        self.proxy
            .bases
            .iter()
            .map(|base| format!("{}{}", base, encoded))
            .collect()
    }

    async fn get_with_retry(&self, request_url: &str) -> Result<String, ExtractError> {
        let mut attempt = 0;
        loop {
            match self.get(request_url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.proxy.retries && e.is_retryable() => {
                    let delay = backoff(self.proxy.backoff_ms, attempt);
                    warn!("{}, retrying in {}ms", e, delay.as_millis());
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get(&self, request_url: &str) -> Result<String, ExtractError> {
        debug!("GET {}", request_url);
        let response = self
            .client
            .get(request_url)
            .send()
            .await
            .map_err(|source| ExtractError::Network {
                url: request_url.to_owned(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                url: request_url.to_owned(),
                status,
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_textual(content_type) {
                return Err(ExtractError::UnexpectedContent {
                    url: request_url.to_owned(),
                    content_type: content_type.to_owned(),
                });
            }
        }

        response.text().await.map_err(|source| ExtractError::Network {
            url: request_url.to_owned(),
            source,
        })
    }
}

impl Fetch for ProxyFetcher {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<String, ExtractError> {
        let mut last_error = None;

        for request_url in self.request_urls(url) {
            match self.get_with_retry(&request_url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!("{}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ExtractError::Unreachable {
            url: url.to_string(),
        }))
    }
}

/// Exponential delay with up to 50% random jitter.
fn backoff(base_ms: u64, attempt: u32) -> Duration {
    let delay = base_ms.saturating_mul(1u64 << attempt.min(16));
    let jitter = rand::random_range(0..=delay / 2);
    Duration::from_millis(delay.saturating_add(jitter))
}

fn is_textual(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.starts_with("text/")
        || content_type.contains("html")
        || content_type.contains("json")
        || content_type.contains("xml")
}
