//! Judge client
//!
//! The object a [`JudgeFactory`](crate::registry::JudgeFactory) constructs: an
//! OpenAI-compatible chat client bound to one underlying model, temperature
//! and retry budget.

use crate::config::Credential;
use crate::error::{AppError, AppResult};
use crate::metrics::{JudgeCallResult, Metrics};
use crate::probe::join_path;
use crate::registry::JudgeSettings;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Where judges send their requests
///
/// `base_url` is the versioned base (for example the recommended version's
/// base from a probe), without the chat path.
#[derive(Debug, Clone)]
pub struct JudgeConnection {
    base_url: String,
    chat_path: String,
    credential: Credential,
    request_timeout: Duration,
    retry_backoff: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl JudgeConnection {
    pub fn new(base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            base_url: base_url.into(),
            chat_path: "chat/completions".to_string(),
            credential,
            request_timeout: Duration::from_secs(60),
            retry_backoff: Duration::from_millis(500),
            metrics: None,
        }
    }

    pub fn with_chat_path(mut self, chat_path: impl Into<String>) -> Self {
        self.chat_path = chat_path.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Base delay between attempts; doubles per attempt, with jitter
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn chat_url(&self) -> String {
        join_path(&self.base_url, &self.chat_path)
    }
}

#[derive(Debug, Serialize)]
struct JudgeRequest<'a> {
    model: &'a str,
    temperature: f64,
    stream: bool,
    messages: [JudgeMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct JudgeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct JudgeResponse {
    #[serde(default)]
    choices: Vec<JudgeChoice>,
}

#[derive(Debug, Deserialize)]
struct JudgeChoice {
    message: JudgeResponseMessage,
}

#[derive(Debug, Deserialize)]
struct JudgeResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Why one attempt failed
#[derive(Debug)]
enum AttemptError {
    Status { status: u16, body: String },
    Transport(String),
    Unparseable(String),
    Empty,
}

impl AttemptError {
    /// Client errors other than 408/429 will fail the same way on every attempt
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Status { status, .. } => {
                !((400..500).contains(status) && *status != 408 && *status != 429)
            }
            AttemptError::Transport(_) | AttemptError::Unparseable(_) | AttemptError::Empty => {
                true
            }
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::Status { status, body } => write!(f, "HTTP {}: {}", status, body),
            AttemptError::Transport(e) => write!(f, "request failed: {}", e),
            AttemptError::Unparseable(e) => write!(f, "unparseable response: {}", e),
            AttemptError::Empty => write!(f, "response contained no message content"),
        }
    }
}

/// A constructed judge
pub struct JudgeClient {
    settings: JudgeSettings,
    chat_url: String,
    credential: Credential,
    retry_backoff: Duration,
    client: reqwest::Client,
    metrics: Option<Arc<Metrics>>,
}

impl JudgeClient {
    pub(crate) fn new(settings: JudgeSettings, connection: &JudgeConnection) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(connection.request_timeout)
            .build()
            .map_err(AppError::HttpClient)?;

        Ok(Self {
            settings,
            chat_url: connection.chat_url(),
            credential: connection.credential.clone(),
            retry_backoff: connection.retry_backoff,
            client,
            metrics: connection.metrics.clone(),
        })
    }

    /// Settings this judge was constructed with
    pub fn settings(&self) -> &JudgeSettings {
        &self.settings
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Send `prompt` as a single user message and return the reply text
    ///
    /// Makes up to `retry_budget` attempts. Client errors other than 408/429
    /// end the loop immediately.
    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        let budget = self.settings.retry_budget().max(1);
        let mut last_error = None;

        for attempt in 1..=budget {
            match self.attempt(prompt).await {
                Ok(content) => {
                    self.record(JudgeCallResult::Success);
                    if self.settings.verbose() {
                        tracing::info!(
                            model = %self.settings.model(),
                            attempt,
                            response = %content,
                            "Judge responded"
                        );
                    }
                    return Ok(content);
                }
                Err(e) => {
                    let retry = e.is_retryable() && attempt < budget;
                    self.record(if retry {
                        JudgeCallResult::Retried
                    } else {
                        JudgeCallResult::Failed
                    });

                    if self.settings.verbose() {
                        tracing::info!(
                            model = %self.settings.model(),
                            attempt,
                            budget,
                            error = %e,
                            "Judge attempt failed"
                        );
                    } else {
                        tracing::debug!(
                            model = %self.settings.model(),
                            attempt,
                            budget,
                            error = %e,
                            "Judge attempt failed"
                        );
                    }

                    if !retry {
                        return Err(AppError::JudgeRequestFailed {
                            model: self.settings.model().to_string(),
                            attempts: attempt,
                            reason: e.to_string(),
                        });
                    }
                    last_error = Some(e);
                    tokio::time::sleep(backoff_delay(self.retry_backoff, attempt)).await;
                }
            }
        }

        Err(AppError::JudgeRequestFailed {
            model: self.settings.model().to_string(),
            attempts: budget,
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt made".to_string()),
        })
    }

    async fn attempt(&self, prompt: &str) -> Result<String, AttemptError> {
        let request = JudgeRequest {
            model: self.settings.model(),
            temperature: self.settings.temperature(),
            stream: false,
            messages: [JudgeMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.chat_url)
            .bearer_auth(self.credential.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Status { status, body });
        }

        let body: JudgeResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Unparseable(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AttemptError::Empty)
    }

    fn record(&self, result: JudgeCallResult) {
        if let Some(metrics) = &self.metrics {
            metrics.record_judge_request(result);
        }
    }
}

/// `base * 2^(attempt-1)` capped at 30s, plus up to 50% jitter
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    let exp = base
        .saturating_mul(1u32 << (attempt.saturating_sub(1)).min(16))
        .min(MAX_BACKOFF);
    let jitter_ms = (exp.as_millis() as u64) / 2;
    let jitter = if jitter_ms == 0 {
        0
    } else {
        rand::rng().random_range(0..=jitter_ms)
    };
    exp + Duration::from_millis(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_chat_url() {
        let conn = JudgeConnection::new("https://chat-api.tamu.ai/api/", Credential::new("k"));
        assert_eq!(
            conn.chat_url(),
            "https://chat-api.tamu.ai/api/chat/completions"
        );
    }

    #[test]
    fn test_retryable_classification() {
        let status = |s| AttemptError::Status {
            status: s,
            body: String::new(),
        };
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(status(408).is_retryable());
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(AttemptError::Transport("reset".to_string()).is_retryable());
        assert!(AttemptError::Empty.is_retryable());
    }

    #[test]
    fn test_backoff_zero_base_never_sleeps() {
        assert_eq!(backoff_delay(Duration::ZERO, 5), Duration::ZERO);
    }

    #[test]
    fn test_backoff_doubles_within_jitter() {
        let base = Duration::from_millis(100);
        for attempt in 1..=4u32 {
            let expected = 100u64 * (1 << (attempt - 1));
            let delay = backoff_delay(base, attempt).as_millis() as u64;
            assert!(delay >= expected, "attempt {}: {} < {}", attempt, delay, expected);
            assert!(delay <= expected + expected / 2);
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let delay = backoff_delay(Duration::from_secs(10), 20);
        assert!(delay <= MAX_BACKOFF + MAX_BACKOFF / 2);
        assert!(delay >= MAX_BACKOFF);
    }

    #[test]
    fn test_factory_build_uses_captured_settings() {
        let mut registry = crate::registry::JudgeRegistry::new();
        let settings = JudgeSettings::new("protected.gpt-4o-mini")
            .with_temperature(0.5)
            .with_retry_budget(7)
            .with_verbose(true);
        registry.register("gpt-judge", settings.clone());

        let conn = JudgeConnection::new("http://127.0.0.1:9/api", Credential::new("k"));
        let client = registry
            .resolve("gpt-judge")
            .unwrap()
            .build(&conn)
            .expect("client builds without network");
        assert_eq!(client.settings(), &settings);
        assert_eq!(client.chat_url(), "http://127.0.0.1:9/api/chat/completions");
    }
}
