//! Retrying POST client for the GraphQL upstream.
//!
//! Every call gets its own attempt budget. Rate limiting (HTTP 429), timeouts
//! and connection errors are retried after `backoff * attempt` seconds; name
//! resolution failures, other HTTP statuses and undecodable bodies abort at once.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use log::{error, warn};
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::RelayError;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";

pub const DEFAULT_MAX_RETRIES: u32 = 15;
pub const DEFAULT_BACKOFF_SECS: f64 = 0.5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Upper bound on a single backoff sleep
pub const MAX_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Outcome of a single failed attempt, as seen by the retry loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptError {
    RateLimited,
    Transient(String),
    NameResolution(String),
    Status(u16),
    Fatal(String),
}

impl AttemptError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptError::RateLimited | AttemptError::Transient(_))
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::RateLimited => write!(f, "HTTP 429 Too Many Requests"),
            AttemptError::Transient(msg) => write!(f, "connection error or timeout: {}", msg),
            AttemptError::NameResolution(msg) => write!(f, "name resolution failed: {}", msg),
            AttemptError::Status(status) => write!(f, "HTTP {}", status),
            AttemptError::Fatal(msg) => write!(f, "{}", msg),
        }
    }
}

/// One request/response exchange with an upstream endpoint.
pub trait Transport: Send + Sync {
    fn post_json(
        &self,
        endpoint: &str,
        payload: &Value,
        timeout: Duration,
    ) -> impl Future<Output = Result<Value, AttemptError>> + Send;
}

/// `reqwest` backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn post_json(&self, endpoint: &str, payload: &Value, timeout: Duration) -> Result<Value, AttemptError> {
        let response = self.client
            .post(endpoint)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| classify_request_error(&e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptError::RateLimited);
        }
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }

        // A body cut short is a transport failure, only a complete body that
        // fails to parse is fatal.
        let body = response.bytes().await.map_err(|e| AttemptError::Transient(error_chain(&e)))?;
        serde_json::from_slice(&body).map_err(|e| AttemptError::Fatal(format!("invalid JSON body: {}", e)))
    }
}

/// Sorts a `reqwest` send error into the retry taxonomy.
pub fn classify_request_error(err: &reqwest::Error) -> AttemptError {
    if is_name_resolution(err) {
        AttemptError::NameResolution(error_chain(err))
    } else if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        AttemptError::Transient(error_chain(err))
    } else {
        AttemptError::Fatal(error_chain(err))
    }
}

// hyper reports resolver failures as a connect error wrapping "dns error".
fn is_name_resolution(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        let msg = cause.to_string().to_lowercase();
        if msg.contains("dns error")
            || msg.contains("failed to lookup address")
            || msg.contains("name or service not known")
        {
            return true;
        }
        source = cause.source();
    }
    false
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

/// Attempt budget, linear backoff factor and per-attempt timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_secs: f64,
    timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_SECS, DEFAULT_TIMEOUT)
    }
}

impl RetryPolicy {
    /// `max_retries` below one is raised to one; negative or non-finite
    /// backoff factors become zero.
    pub fn new(max_retries: u32, backoff_secs: f64, timeout: Duration) -> Self {
        let backoff_secs = if backoff_secs.is_finite() && backoff_secs > 0.0 { backoff_secs } else { 0.0 };
        Self {
            max_retries: max_retries.max(1),
            backoff_secs,
            timeout,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sleep before the attempt following failed attempt number `attempt` (1-based).
    /// Saturates at `MAX_BACKOFF` for absurd factors.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::try_from_secs_f64(self.backoff_secs * attempt as f64)
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }
}

/// Runs `payload` against `endpoint` until it succeeds, fails fatally or
/// the policy's attempt budget is spent.
pub async fn fetch_with<T: Transport>(
    transport: &T,
    endpoint: &str,
    payload: &Value,
    policy: &RetryPolicy,
) -> Result<Value, RelayError> {
    let max_retries = policy.max_retries();

    for attempt in 1..=max_retries {
        match transport.post_json(endpoint, payload, policy.timeout()).await {
            Ok(body) => return Ok(body),
            Err(e) if e.is_retryable() => {
                if attempt < max_retries {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        "{} from {} (attempt {}/{}), retrying in {:.1}s",
                        e, endpoint, attempt, max_retries, delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    warn!("{} from {} (attempt {}/{})", e, endpoint, attempt, max_retries);
                }
            }
            Err(AttemptError::NameResolution(reason)) => {
                error!("Unable to resolve {}: {}", endpoint, reason);
                return Err(RelayError::NameResolution { endpoint: endpoint.to_string(), reason });
            }
            Err(AttemptError::Status(status)) => {
                error!("Upstream {} answered with HTTP {}", endpoint, status);
                return Err(RelayError::UpstreamStatus { endpoint: endpoint.to_string(), status });
            }
            Err(e) => {
                error!("Unexpected error while calling {}: {}", endpoint, e);
                return Err(RelayError::RequestFailed(e.to_string()));
            }
        }
    }

    error!("[max attempts reached] {}", payload);
    Err(RelayError::RetryExhausted {
        endpoint: endpoint.to_string(),
        attempts: max_retries,
        payload: payload.to_string(),
    })
}

/// A transport bound to one endpoint and one retry policy.
#[derive(Debug, Clone)]
pub struct Fetcher<T> {
    transport: T,
    endpoint: String,
    policy: RetryPolicy,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, endpoint: impl Into<String>, policy: RetryPolicy) -> Self {
        Self { transport, endpoint: endpoint.into(), policy }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn fetch(&self, payload: &Value) -> Result<Value, RelayError> {
        fetch_with(&self.transport, &self.endpoint, payload, &self.policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use serde_json::json;
    use tokio::time::Instant;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, 0.5, Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_returns_immediately() {
        let transport = ScriptedTransport::new(vec![Ok(json!({"data": {"ok": true}}))]);
        let fetcher = Fetcher::new(transport, "http://upstream/graphql", policy(5));

        let body = fetcher.fetch(&json!({"query": "{}"})).await.unwrap();

        assert_eq!(body["data"]["ok"], json!(true));
        assert_eq!(fetcher.transport().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_then_success() {
        let transport = ScriptedTransport::new(vec![
            Err(AttemptError::RateLimited),
            Err(AttemptError::Transient(String::from("connection reset"))),
            Ok(json!({"data": {}})),
        ]);
        let fetcher = Fetcher::new(transport, "http://upstream/graphql", policy(5));
        let start = Instant::now();

        assert!(fetcher.fetch(&json!({})).await.is_ok());

        assert_eq!(fetcher.transport().calls(), 3);
        // linear backoff: 0.5s after the first failure, 1.0s after the second
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_carries_payload() {
        let transport = ScriptedTransport::repeating(Err(AttemptError::RateLimited));
        let fetcher = Fetcher::new(transport, "http://upstream/graphql", policy(3));
        let payload = json!({"query": "q", "variables": {"slug": "berserk"}});

        match fetcher.fetch(&payload).await {
            Err(RelayError::RetryExhausted { attempts, payload: carried, .. }) => {
                assert_eq!(attempts, 3);
                assert_eq!(carried, payload.to_string());
            }
            other => panic!("expected RetryExhausted, got {:?}", other),
        }
        assert_eq!(fetcher.transport().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_equal_to_budget_exhaust() {
        let transport = ScriptedTransport::new(vec![
            Err(AttemptError::Transient(String::from("timeout"))),
            Err(AttemptError::Transient(String::from("timeout"))),
            Ok(json!({})),
        ]);
        let fetcher = Fetcher::new(transport, "http://upstream/graphql", policy(2));

        assert!(matches!(fetcher.fetch(&json!({})).await, Err(RelayError::RetryExhausted { .. })));
        assert_eq!(fetcher.transport().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_name_resolution_is_not_retried() {
        let transport = ScriptedTransport::repeating(Err(AttemptError::NameResolution(String::from("dns error"))));
        let fetcher = Fetcher::new(transport, "http://upstream/graphql", policy(10));

        assert!(matches!(fetcher.fetch(&json!({})).await, Err(RelayError::NameResolution { .. })));
        assert_eq!(fetcher.transport().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_status_is_fatal() {
        let transport = ScriptedTransport::repeating(Err(AttemptError::Status(500)));
        let fetcher = Fetcher::new(transport, "http://upstream/graphql", policy(10));

        assert!(matches!(
            fetcher.fetch(&json!({})).await,
            Err(RelayError::UpstreamStatus { status: 500, .. })
        ));
        assert_eq!(fetcher.transport().calls(), 1);
    }

    #[test]
    fn test_policy_clamps_inputs() {
        let policy = RetryPolicy::new(0, -1.0, Duration::from_secs(1));
        assert_eq!(policy.max_retries(), 1);
        assert_eq!(policy.delay_for(3), Duration::ZERO);
        assert_eq!(RetryPolicy::default().delay_for(3), Duration::from_millis(1500));
    }

    #[test]
    fn test_huge_backoff_saturates() {
        let policy = RetryPolicy::new(3, f64::MAX, Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), MAX_BACKOFF);
        assert_eq!(RetryPolicy::new(3, 1e12, Duration::from_secs(1)).delay_for(1), MAX_BACKOFF);
    }
}
