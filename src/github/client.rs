// GitHub API HTTP client.
// Serves GET requests from the response cache, retries transient failures with backoff,
// and charges unrecoverable failures to the run's error budget.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::backoff::RetryPolicy;
use crate::cache::{CacheStore, CachedData, CachedResponse, DEFAULT_TTL, request_key};
use crate::context::RunContext;
use crate::error::{FellowError, Result};

use super::pagination::parse_next_link;
use super::transport::{HttpTransport, RawResponse, Transport};
use super::types::RateLimit;

pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// How a response should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Success,
    Transient,
    Permanent,
}

fn classify(response: &RawResponse) -> Disposition {
    let status = response.status;
    if status.is_success() {
        return Disposition::Success;
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Disposition::Transient;
    }
    // GitHub answers an exhausted primary rate limit, and a tripped secondary
    // one, with 403. The former zeroes the remaining count, the latter sets Retry-After.
    if status == StatusCode::FORBIDDEN
        && (RateLimit::from_headers(&response.headers).is_some_and(|r| r.remaining == 0)
            || response.headers.contains_key("retry-after"))
    {
        return Disposition::Transient;
    }
    Disposition::Permanent
}

fn retry_after(response: &RawResponse) -> Option<Duration> {
    response
        .headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_secs)
}

fn permanent_error(response: RawResponse, url: &Url) -> FellowError {
    match response.status {
        StatusCode::UNAUTHORIZED => FellowError::Unauthorized,
        StatusCode::NOT_FOUND => FellowError::NotFound(url.to_string()),
        status => FellowError::Status {
            status,
            body: response.body,
        },
    }
}

/// Decode a JSON body. An undecodable body counts as a failed call.
pub(crate) fn decode<T: DeserializeOwned>(ctx: &mut RunContext, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "could not decode response body");
        ctx.record_failure();
        FellowError::from(e)
    })
}

/// GitHub API client with caching and retry handling.
pub struct GitHubClient {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn CacheStore>,
    policy: RetryPolicy,
    ttl: Duration,
}

impl GitHubClient {
    /// Create a client over the given transport and cache with default policy and TTL.
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            transport,
            cache,
            policy: RetryPolicy::default(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Create a client talking to api.github.com with the given token.
    pub fn with_token(token: &str, cache: Arc<dyn CacheStore>) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(token)?), cache))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub(crate) fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Absolute URL for an API path with query parameters.
    pub fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", GITHUB_API_BASE, path))
            .map_err(|e| FellowError::Other(format!("invalid URL for {}: {}", path, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// GET an API path, from the cache when a fresh entry exists.
    pub async fn fetch(
        &self,
        ctx: &mut RunContext,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<CachedResponse> {
        let url = self.url(path, params)?;
        self.fetch_url(ctx, url).await
    }

    /// GET an absolute URL, from the cache when a fresh entry exists.
    pub async fn fetch_url(&self, ctx: &mut RunContext, url: Url) -> Result<CachedResponse> {
        ctx.ensure_budget()?;

        let key = request_key("GET", url.as_str());
        match self.cache.get(&key) {
            Ok(Some(entry)) if entry.is_valid(self.ttl) => {
                debug!(%url, "cache hit");
                ctx.record_cache_hit();
                return Ok(entry.data);
            }
            Ok(_) => {}
            Err(e) => debug!(%url, error = %e, "cache read failed, fetching"),
        }

        let response = self.send(ctx, Method::GET, url.clone()).await?;
        let cached = CachedResponse {
            status: response.status.as_u16(),
            next: response
                .headers
                .get("link")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_next_link),
            body: response.body,
        };

        if response.status == StatusCode::OK {
            if serde_json::from_str::<IgnoredAny>(&cached.body).is_err() {
                warn!(%url, "response body is not JSON, not caching it");
            } else if let Err(e) = self.cache.set(CachedData::new(key, cached.clone())) {
                warn!(%url, error = %e, "failed to write cache entry");
            }
        }

        Ok(cached)
    }

    /// GET an API path and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &mut RunContext,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.fetch(ctx, path, params).await?;
        decode(ctx, &response.body)
    }

    /// GET an API path bypassing the cache in both directions.
    pub async fn get_json_fresh<T: DeserializeOwned>(
        &self,
        ctx: &mut RunContext,
        path: &str,
    ) -> Result<T> {
        ctx.ensure_budget()?;
        let url = self.url(path, &[])?;
        let response = self.send(ctx, Method::GET, url).await?;
        decode(ctx, &response.body)
    }

    /// DELETE an API path. Never cached.
    pub async fn delete(&self, ctx: &mut RunContext, path: &str) -> Result<StatusCode> {
        ctx.ensure_budget()?;
        let url = self.url(path, &[])?;
        let response = self.send(ctx, Method::DELETE, url).await?;
        Ok(response.status)
    }

    /// Drop cached responses whose URL starts with the given API path.
    pub fn invalidate(&self, path: &str) -> Result<usize> {
        let url = self.url(path, &[])?;
        self.cache.invalidate(&request_key("GET", url.as_str()))
    }

    /// Send a request, retrying transient failures according to the retry policy.
    async fn send(&self, ctx: &mut RunContext, method: Method, url: Url) -> Result<RawResponse> {
        let mut attempt: u32 = 0;

        loop {
            ctx.begin_request()?;
            debug!(%method, %url, attempt = attempt + 1, "sending request");

            let (last_status, hint) = match self.transport.send(method.clone(), url.clone()).await {
                Ok(response) => {
                    if let Some(rate_limit) = RateLimit::from_headers(&response.headers) {
                        ctx.update_rate_limit(rate_limit);
                    }
                    match classify(&response) {
                        Disposition::Success => return Ok(response),
                        Disposition::Transient => {
                            (response.status.to_string(), retry_after(&response))
                        }
                        Disposition::Permanent => {
                            warn!(%method, %url, status = %response.status, "request failed");
                            ctx.record_failure();
                            return Err(permanent_error(response, &url));
                        }
                    }
                }
                Err(e) if e.is_transient() => (e.to_string(), None),
                Err(e) => {
                    ctx.record_failure();
                    return Err(e);
                }
            };

            if attempt + 1 >= self.policy.max_attempts() {
                warn!(%method, %url, attempts = attempt + 1, status = %last_status, "giving up");
                ctx.record_failure();
                return Err(FellowError::RetriesExhausted {
                    status: last_status,
                    attempts: attempt + 1,
                });
            }

            let delay = self.policy.delay_with_hint(attempt, hint);
            warn!(
                %method,
                %url,
                status = %last_status,
                attempt = attempt + 1,
                backoff_ms = delay.as_millis() as u64,
                "transient failure, retrying"
            );
            ctx.record_retry();
            sleep(delay).await;
            attempt += 1;
        }
    }
}
