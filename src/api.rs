//! Oracle API interaction with throttling-aware exponential backoff.
//!
//! This module turns one article into one classification verdict by talking
//! to an OpenAI-compatible chat completions endpoint.
//!
//! # Architecture
//!
//! - [`OracleTransport`]: core trait, one prompt in, one raw text response out
//! - [`HttpOracle`]: the HTTP implementation, which tags failures as
//!   [`OracleError`] variants at the transport boundary
//! - [`RetryOracle`]: decorator adding per-call timeouts and retry on throttling
//! - [`OracleClient`]: renders the prompt and parses the response
//!
//! # Retry Strategy
//!
//! - Only [`OracleError::Throttled`] is retried; everything else fails fast
//! - At most 5 attempts in total by default
//! - Backoff `base * 2^(attempt-1)`, capped, plus random jitter
//! - A timed-out attempt is terminal

use crate::config::OracleConfig;
use crate::error::{ConfigError, OracleError};
use crate::models::{Article, ClassificationResult};
use crate::pipeline::parser::parse_response;
use crate::prompt::PromptTemplate;
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

const SYSTEM_MESSAGE: &str =
    "You are a JSON-only API that decides whether a news article is relevant and classifies it.";

/// Trait for a text-in/text-out oracle.
///
/// Implementors send a rendered prompt to the service and return its raw
/// textual answer, or a tagged [`OracleError`].
pub trait OracleTransport {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}

/// Timeout and retry settings for a single article.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: usize,
    /// Delay before the first retry; doubles with each further attempt.
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the random delay added to each backoff.
    pub max_jitter: Duration,
    /// Applied to every attempt separately.
    pub call_timeout: Duration,
}

impl From<&OracleConfig> for RetryPolicy {
    fn from(config: &OracleConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.backoff_base(),
            max_delay: config.backoff_max(),
            max_jitter: Duration::from_millis(config.jitter_ms),
            call_timeout: config.timeout(),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failed attempt (1-based), before jitter.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(31) as u32;
        self.base_delay.saturating_mul(1u32 << shift).min(self.max_delay)
    }
}

/// Wrapper that adds timeouts and throttling backoff to any [`OracleTransport`].
///
/// The decorator dispatches on the error tag: [`OracleError::Throttled`] is
/// waited out, any other failure is returned to the caller immediately.
pub struct RetryOracle<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryOracle<T>
where
    T: OracleTransport,
{
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryOracle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOracle")
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T> OracleTransport for RetryOracle<T>
where
    T: OracleTransport + fmt::Debug,
{
    #[instrument(level = "debug", skip_all)]
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            let outcome = match timeout(self.policy.call_timeout, self.inner.complete(prompt)).await {
                Ok(res) => res,
                Err(_) => Err(OracleError::Timeout(self.policy.call_timeout)),
            };
            attempt += 1;

            let e = match outcome {
                Ok(resp) => return Ok(resp),
                Err(e) => e,
            };
            let attempt_dt = attempt_t0.elapsed();
            let total_dt = total_t0.elapsed();

            if !e.is_retryable() {
                warn!(
                    attempt,
                    elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                    error = %e,
                    "oracle call failed; not retrying"
                );
                return Err(e);
            }

            if attempt >= self.policy.max_attempts {
                error!(
                    attempt,
                    max = self.policy.max_attempts,
                    elapsed_ms_total = total_dt.as_millis() as u64,
                    error = %e,
                    "oracle still throttling; giving up"
                );
                return Err(e);
            }

            let jitter_ms: u64 = rng().random_range(0..=self.policy.max_jitter.as_millis() as u64);
            let delay = self.policy.backoff(attempt) + Duration::from_millis(jitter_ms);

            warn!(
                attempt,
                max = self.policy.max_attempts,
                elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                elapsed_ms_total = total_dt.as_millis() as u64,
                ?delay,
                error = %e,
                "oracle throttled; backing off"
            );
            sleep(delay).await;
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// [`OracleTransport`] over an OpenAI-compatible chat completions API.
pub struct HttpOracle {
    client: Client,
    completions_url: Url,
    models_url: Url,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    json_mode: bool,
    timeout: Duration,
}

impl fmt::Debug for HttpOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpOracle")
            .field("completions_url", &self.completions_url.as_str())
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl HttpOracle {
    /// Build the client. `api_key` overrides the key from the config file.
    pub fn new(config: &OracleConfig, api_key: Option<String>) -> Result<Self, ConfigError> {
        let base = Url::parse(&format!("{}/", config.api_base.trim_end_matches('/')))
            .map_err(|e| ConfigError::Invalid(format!("oracle.api_base: {e}")))?;
        let completions_url = base
            .join("chat/completions")
            .map_err(|e| ConfigError::Invalid(format!("oracle.api_base: {e}")))?;
        let models_url = base
            .join("models")
            .map_err(|e| ConfigError::Invalid(format!("oracle.api_base: {e}")))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            completions_url,
            models_url,
            api_key: api_key.or_else(|| config.api_key.clone()),
            model: config.model.clone(),
            temperature: config.temperature,
            json_mode: config.json_mode,
            timeout: config.timeout(),
        })
    }

    /// Check that the endpoint is reachable and accepts our credentials.
    ///
    /// A rejected key (401/403) is [`OracleError::Fatal`]. Any other HTTP
    /// status counts as reachable, since not every compatible server lists
    /// its models.
    #[instrument(level = "info", skip_all, fields(url = %self.models_url))]
    pub async fn probe(&self) -> Result<(), OracleError> {
        let mut req = self.client.get(self.models_url.clone());
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| self.tag_request_error(e))?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let text = resp.text().await.unwrap_or_default();
            return Err(OracleError::Fatal(format!(
                "credentials rejected, HTTP {status}: {}",
                truncate_for_log(text.trim(), 200)
            )));
        }
        info!(%status, "Oracle endpoint reachable");
        Ok(())
    }

    fn tag_request_error(&self, e: reqwest::Error) -> OracleError {
        if e.is_timeout() {
            OracleError::Timeout(self.timeout)
        } else if e.is_builder() || e.is_decode() {
            OracleError::Fatal(e.to_string())
        } else {
            OracleError::Transient(e.to_string())
        }
    }
}

/// Tag for a non-success status.
fn tag_status(status: StatusCode, body: &str) -> OracleError {
    let detail = format!("HTTP {status}: {}", truncate_for_log(body.trim(), 200));
    if status == StatusCode::TOO_MANY_REQUESTS {
        OracleError::Throttled(detail)
    } else if status.is_server_error() {
        OracleError::Transient(detail)
    } else {
        OracleError::Fatal(detail)
    }
}

impl OracleTransport for HttpOracle {
    #[instrument(level = "debug", skip_all)]
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let t0 = Instant::now();
        let mut body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                {"role": "system", "content": SYSTEM_MESSAGE},
                {"role": "user", "content": prompt},
            ],
        });
        if self.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        let mut req = self.client.post(self.completions_url.clone()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| self.tag_request_error(e))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let e = tag_status(status, &text);
            debug!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "Oracle returned error status");
            return Err(e);
        }

        let completion: ChatCompletion = resp
            .json()
            .await
            .map_err(|e| OracleError::Fatal(format!("malformed completion envelope: {e}")))?;
        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Oracle call completed");

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OracleError::Fatal("completion had no message content".into()))
    }
}

/// Classifies one article: render prompt, call with retry, parse.
pub struct OracleClient<T> {
    oracle: RetryOracle<T>,
    prompt: PromptTemplate,
}

impl<T> OracleClient<T>
where
    T: OracleTransport + fmt::Debug,
{
    pub fn new(transport: T, policy: RetryPolicy, prompt: PromptTemplate) -> Self {
        Self {
            oracle: RetryOracle::new(transport, policy),
            prompt,
        }
    }

    /// Ask the oracle about one article.
    ///
    /// Transport failures surface as [`OracleError`]; a response that cannot
    /// be parsed becomes the default reject verdict instead.
    #[instrument(level = "debug", skip_all, fields(url = %article.url))]
    pub async fn classify(&self, article: &Article) -> Result<ClassificationResult, OracleError> {
        let prompt = self.prompt.render(article);
        let raw = self.oracle.complete(&prompt).await?;
        debug!(response_preview = %truncate_for_log(&raw, 300), "Oracle raw response");
        Ok(parse_response(&raw))
    }
}
