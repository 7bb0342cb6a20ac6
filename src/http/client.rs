//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Own the shared `reqwest::Client`, base URL and default headers
//! - Merge default headers under per-call headers
//! - Send a `RequestPlan` and buffer the reply within one deadline
//!
//! # Design Decisions
//! - Cheap to clone; the inner connection pool is shared
//! - Per-call headers replace defaults with the same name
//! - No retries: one plan, one request
//! - Transport failures and timeouts keep their cause

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::{BridgeError, BridgeResult, UpstreamCause};
use crate::http::request::{PlannedBody, RequestPlan};
use crate::http::response::UpstreamResponse;
use crate::resilience::timeouts::{with_timeout, Elapsed};

/// Shared handle to the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: Url,
    default_headers: HeaderMap,
}

impl UpstreamClient {
    /// Client for `base_url` with a default `reqwest` configuration.
    pub fn new(base_url: &str) -> BridgeResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BridgeError::InvalidConfig(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BridgeError::InvalidConfig(format!(
                "base URL '{base_url}' cannot carry a path"
            )));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BridgeError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            default_headers: HeaderMap::new(),
        })
    }

    /// Build from the `[upstream]` configuration section.
    ///
    /// Returns `None` when no base URL is configured.
    pub fn from_config(config: &UpstreamConfig) -> BridgeResult<Option<Self>> {
        match &config.base_url {
            Some(base_url) => Self::new(base_url)?
                .with_header_map(&config.default_headers)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Add every `name = value` pair as a default header.
    pub fn with_header_map(mut self, headers: &BTreeMap<String, String>) -> BridgeResult<Self> {
        for (name, value) in headers {
            self = self.with_default_header(name, value)?;
        }
        Ok(self)
    }

    /// Use a preconfigured `reqwest::Client` (proxies, TLS, pools).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn with_default_header(mut self, name: &str, value: &str) -> BridgeResult<Self> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| BridgeError::InvalidConfig(format!("invalid header name '{name}': {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| BridgeError::InvalidConfig(format!("invalid value for header '{name}': {e}")))?;
        self.default_headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Defaults overlaid with `per_call`; per-call names win.
    pub fn merged_headers(&self, per_call: &HeaderMap) -> HeaderMap {
        let mut merged = self.default_headers.clone();
        for name in per_call.keys() {
            merged.remove(name);
        }
        for (name, value) in per_call {
            merged.append(name.clone(), value.clone());
        }
        merged
    }

    /// Send `plan` and buffer the reply, bounded by `timeout`.
    pub async fn execute(
        &self,
        plan: &RequestPlan,
        timeout: Option<Duration>,
    ) -> BridgeResult<UpstreamResponse> {
        let url = plan.url(&self.base_url);
        let mut request = self
            .client
            .request(plan.method.clone(), url.clone())
            .headers(self.merged_headers(&plan.headers));

        request = match &plan.body {
            Some(PlannedBody::Json(value)) => request.json(value),
            Some(PlannedBody::Form(pairs)) => request.form(pairs),
            Some(PlannedBody::Raw {
                content_type,
                bytes,
            }) => request
                .header(CONTENT_TYPE, content_type.as_str())
                .body(bytes.clone()),
            None => request,
        };

        tracing::debug!(method = %plan.method, url = %url, "Sending upstream request");
        let start = Instant::now();

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(UpstreamResponse {
                status,
                content_type,
                body: body.to_vec(),
            })
        };

        match with_timeout(timeout, exchange).await {
            Ok(Ok(response)) => {
                tracing::debug!(
                    url = %url,
                    status = %response.status,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Upstream responded"
                );
                Ok(response)
            }
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Upstream request failed");
                Err(BridgeError::UpstreamRequest {
                    url: url.to_string(),
                    source: UpstreamCause::Http(e),
                })
            }
            Err(Elapsed(limit)) => {
                tracing::warn!(url = %url, timeout = ?limit, "Upstream request timed out");
                Err(BridgeError::UpstreamRequest {
                    url: url.to_string(),
                    source: UpstreamCause::Timeout(limit),
                })
            }
        }
    }
}
