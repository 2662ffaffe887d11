use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client, ClientBuilder, Response};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, RETRY_AFTER};
use serde::Deserialize;
use serde_json::Value;
use std::thread;
use std::time::Duration;

use crate::config::ApiConfig;

const JSON_ACCEPT: &str = "application/json, text/plain, */*";
const KML_ACCEPT: &str = "application/vnd.google-earth.kml+xml, application/xml, text/xml, */*";
const ACCEPT_LANGUAGE_VALUE: &str = "pt-PT,pt;q=0.9,en-US;q=0.8,en;q=0.7";
const MAX_REDIRECTS: usize = 5;

/// Envelope shared by the fogos.pt endpoints
#[derive(Debug, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Value>,
}

impl FeedResponse {
    /// Items of a successful response
    pub fn into_items(self) -> Result<Vec<Value>> {
        if !self.success {
            bail!("API returned success=false");
        }
        Ok(self.data)
    }
}

/// Blocking client for the fogos.pt fires and summary feeds
pub struct FogosClient {
    client: Client,
    config: ApiConfig,
}

impl FogosClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = client_builder(&config)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Every active incident from the fires feed
    pub fn fetch_fires(&self) -> Result<Vec<Value>> {
        self.fetch_feed(&self.config.fires_url)
    }

    /// National totals, oldest entry first
    pub fn fetch_summary(&self) -> Result<Vec<Value>> {
        self.fetch_feed(&self.config.summary_url)
    }

    /// Download a KML document
    pub fn fetch_kml(&self, url: &str) -> Result<String> {
        self.get_with_retries(url, KML_ACCEPT)?
            .text()
            .context(format!("Failed to read KML body from {}", url))
    }

    fn fetch_feed(&self, url: &str) -> Result<Vec<Value>> {
        let feed: FeedResponse = self
            .get_with_retries(url, JSON_ACCEPT)?
            .json()
            .context(format!("Failed to parse JSON from {}", url))?;

        feed.into_items()
    }

    /// GET with retries on transport errors and on 403/429
    ///
    /// Rate-limit responses honour a numeric `Retry-After`; otherwise the
    /// wait grows linearly with the attempt number. Any other non-success
    /// status fails immediately.
    fn get_with_retries(&self, url: &str, accept: &'static str) -> Result<Response> {
        let max_retries = self.config.max_retries.max(1);

        for attempt in 1..=max_retries {
            let response = match self.client.get(url).header(ACCEPT, accept).send() {
                Ok(r) => r,
                Err(e) => {
                    if attempt >= max_retries {
                        return Err(e).context(format!("Failed to send request to {}", url));
                    }
                    let wait = backoff_secs(self.config.backoff_secs, attempt);
                    log::warn!(
                        "Request error ({}), retrying in {}s (attempt {}/{})",
                        e,
                        wait,
                        attempt,
                        max_retries
                    );
                    thread::sleep(Duration::from_secs(wait));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() || status == StatusCode::NOT_MODIFIED {
                return Ok(response);
            }

            if is_rate_limited(status) {
                if attempt >= max_retries {
                    bail!(
                        "{} returned status {} after {} attempts",
                        url,
                        status,
                        attempt
                    );
                }
                let wait = retry_after_secs(response.headers())
                    .unwrap_or_else(|| backoff_secs(self.config.backoff_secs, attempt));
                log::warn!(
                    "Received {} from {}, waiting {}s (attempt {}/{})",
                    status,
                    url,
                    wait,
                    attempt,
                    max_retries
                );
                thread::sleep(Duration::from_secs(wait));
                continue;
            }

            bail!("{} returned error status: {}", url, status);
        }

        bail!("No request attempted for {}", url)
    }
}

impl super::KmlFetcher for FogosClient {
    fn fetch_kml(&self, url: &str) -> Result<String> {
        FogosClient::fetch_kml(self, url)
    }
}

fn client_builder(config: &ApiConfig) -> ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(config.timeout_secs))
}

fn is_rate_limited(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN
}

fn backoff_secs(base: u64, attempt: u32) -> u64 {
    base * u64::from(attempt)
}

/// `Retry-After` in seconds; HTTP-date values are ignored
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
