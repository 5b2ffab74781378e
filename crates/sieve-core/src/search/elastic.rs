//! Elasticsearch scroll backend over the REST API.
//!
//! Uses `POST /{index}/_search?scroll=..` to open a scroll and
//! `POST /_search/scroll` to continue it. Authentication is HTTP basic.

use super::{ScrollPage, SearchHit, SearchIndex};
use crate::error::{Result, SieveError};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireScrollResponse {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: WireHits,
}

#[derive(Debug, Deserialize)]
struct WireHits {
    hits: Vec<WireHit>,
}

#[derive(Debug, Deserialize)]
struct WireHit {
    #[serde(rename = "_source")]
    source: Value,
}

fn parse_page(body: &[u8]) -> Result<ScrollPage> {
    let wire: WireScrollResponse = serde_json::from_slice(body)?;
    let hits = wire
        .hits
        .hits
        .into_iter()
        .map(|hit| SearchHit::from_source(hit.source))
        .collect::<Result<Vec<_>>>()?;
    Ok(ScrollPage {
        scroll_id: wire.scroll_id,
        hits,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Connection settings for an Elasticsearch cluster.
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Base URL, e.g. "https://localhost:9200".
    pub url: String,
    /// Basic auth user.
    pub username: String,
    /// Basic auth password.
    pub password: String,
    /// PEM file with an extra root certificate (self-signed clusters).
    pub ca_cert: Option<PathBuf>,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Elasticsearch index client.
pub struct ElasticsearchIndex {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
}

impl ElasticsearchIndex {
    /// Build a client from explicit settings.
    pub fn new(config: ElasticsearchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| SieveError::Config(format!("Invalid URL {:?}: {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SieveError::Config(format!(
                "URL {:?} cannot carry a path",
                config.url
            )));
        }

        let mut builder = reqwest::Client::builder();

        if let Some(path) = &config.ca_cert {
            let pem = std::fs::read(path)?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                SieveError::Config(format!("Invalid CA certificate {}: {}", path.display(), e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| SieveError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            username: config.username,
            password: config.password,
        })
    }

    /// Base URL extended by `segments`, each percent-encoded as one path
    /// segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SieveError::Config(format!("URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn post(&self, url: Url, body: &Value) -> RequestBuilder {
        self.http
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
    }

    fn search_request(
        &self,
        index: &str,
        keep_alive: &str,
        body: &Value,
    ) -> Result<RequestBuilder> {
        let url = self.endpoint(&[index, "_search"])?;
        Ok(self.post(url, body).query(&[("scroll", keep_alive)]))
    }

    fn scroll_request(&self, body: &Value) -> Result<RequestBuilder> {
        let url = self.endpoint(&["_search", "scroll"])?;
        Ok(self.post(url, body))
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, Vec<u8>)> {
        let response = request
            .send()
            .await
            .map_err(|e| SieveError::Search(format!("Request failed: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SieveError::Search(format!("Failed to read response: {}", e)))?;
        Ok((status, bytes.to_vec()))
    }
}

fn error_body(body: &[u8]) -> String {
    String::from_utf8_lossy(body).chars().take(512).collect()
}

impl SearchIndex for ElasticsearchIndex {
    async fn search(
        &self,
        index: &str,
        query: &Value,
        page_size: usize,
        keep_alive: &str,
    ) -> Result<ScrollPage> {
        let body = json!({ "query": query, "size": page_size });
        let request = self.search_request(index, keep_alive, &body)?;

        debug!(index = %index, page_size, keep_alive = %keep_alive, "Opening scroll");
        let (status, bytes) = self.send(request).await?;
        if !status.is_success() {
            return Err(SieveError::Search(format!(
                "search on {} failed ({}): {}",
                index,
                status,
                error_body(&bytes)
            )));
        }
        parse_page(&bytes)
    }

    async fn scroll(&self, scroll_id: &str, keep_alive: &str) -> Result<ScrollPage> {
        let body = json!({ "scroll": keep_alive, "scroll_id": scroll_id });

        let (status, bytes) = self.send(self.scroll_request(&body)?).await?;
        match status {
            s if s.is_success() => parse_page(&bytes),
            // search_context_missing_exception: expired or unknown cursor
            StatusCode::NOT_FOUND => Err(SieveError::InvalidCursor(error_body(&bytes))),
            s => Err(SieveError::Search(format!(
                "scroll failed ({}): {}",
                s,
                error_body(&bytes)
            ))),
        }
    }
}
