//! Endpoint capability discovery
//!
//! Sweeps (API version, model id) combinations against an OpenAI-compatible
//! base URL with one minimal chat request each, in declared priority order.
//! In first-success mode the sweep stops at the first HTTP 200; in exhaustive
//! mode every combination is tried to build a compatibility matrix.
//!
//! Expected negative outcomes (404, 401/403, timeouts, connection errors) never
//! abort the sweep. They are recorded as [`ProbeResult`]s and aggregated into a
//! [`ProbeReport`].

pub mod catalog;
pub mod normalize;
pub mod report;

pub use catalog::parse_model_catalog;
pub use normalize::{NormalizationRule, join_path, normalize, strip_version_suffix};
pub use report::{CatalogListing, Diagnosis, ProbeReport};

use crate::config::Credential;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Longest response body kept in a [`ProbeResult`]
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Message sent with every chat probe
const PROBE_PROMPT: &str = "Hi";

/// Trailing path segments treated as API versions when none are configured
pub const DEFAULT_VERSION_MARKERS: [&str; 6] = ["v1", "v1alpha", "v1beta", "v2", "v2beta", "v3"];

/// Probe stop policy
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeMode {
    /// Stop at the first working combination
    #[default]
    FirstSuccess,
    /// Try every combination
    Exhaustive,
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMode::FirstSuccess => write!(f, "first-success"),
            ProbeMode::Exhaustive => write!(f, "exhaustive"),
        }
    }
}

/// A model identifier being tested for reachability
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelCandidate {
    public_id: String,
}

impl ModelCandidate {
    pub fn new(public_id: impl Into<String>) -> Self {
        Self {
            public_id: public_id.into(),
        }
    }

    pub fn public_id(&self) -> &str {
        &self.public_id
    }
}

impl From<&str> for ModelCandidate {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ModelCandidate {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ModelCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.public_id)
    }
}

/// Where and how to probe
///
/// The base URL is normalized at construction. Before a version candidate is
/// appended, a trailing segment matching a known version marker or another
/// candidate is stripped, so a base of `https://host/v1` probed with `v1beta`
/// targets `https://host/v1beta/...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    base_url: String,
    api_version_candidates: Vec<String>,
    known_version_markers: Vec<String>,
    chat_path_suffix: String,
    models_path_suffix: String,
}

impl EndpointSpec {
    /// Create an endpoint from a raw base URL
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidBaseUrl` if the URL is not an absolute
    /// http(s) URL with a host.
    pub fn new(base_url: &str, rules: &[NormalizationRule]) -> AppResult<Self> {
        let normalized = normalize(base_url, rules);
        validate_base_url(&normalized)?;

        Ok(Self {
            base_url: normalized,
            api_version_candidates: Vec::new(),
            known_version_markers: DEFAULT_VERSION_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            chat_path_suffix: "chat/completions".to_string(),
            models_path_suffix: "models".to_string(),
        })
    }

    /// Set the ordered API-version path segments to try
    ///
    /// Empty segments are dropped; an empty list means the base URL is used as-is.
    pub fn with_api_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.api_version_candidates = versions
            .into_iter()
            .map(|v| v.into().trim_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .collect();
        self
    }

    /// Replace the version markers stripped from the base URL before a version is appended
    pub fn with_known_versions<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_version_markers = markers
            .into_iter()
            .map(|m| m.into().trim_matches('/').to_string())
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    pub fn with_chat_path(mut self, suffix: impl Into<String>) -> Self {
        self.chat_path_suffix = suffix.into().trim_matches('/').to_string();
        self
    }

    pub fn with_models_path(mut self, suffix: impl Into<String>) -> Self {
        self.models_path_suffix = suffix.into().trim_matches('/').to_string();
        self
    }

    /// Normalized base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_version_candidates(&self) -> &[String] {
        &self.api_version_candidates
    }

    pub fn known_version_markers(&self) -> &[String] {
        &self.known_version_markers
    }

    /// Versions in sweep order; `None` stands for the unversioned base URL
    pub fn versions(&self) -> Vec<Option<&str>> {
        if self.api_version_candidates.is_empty() {
            vec![None]
        } else {
            self.api_version_candidates
                .iter()
                .map(|v| Some(v.as_str()))
                .collect()
        }
    }

    /// Base URL with `version` appended in place of any known trailing version
    pub fn versioned_base(&self, version: Option<&str>) -> String {
        match version {
            Some(version) => {
                let markers: Vec<&str> = self
                    .known_version_markers
                    .iter()
                    .chain(&self.api_version_candidates)
                    .map(String::as_str)
                    .collect();
                join_path(strip_version_suffix(&self.base_url, &markers), version)
            }
            None => self.base_url.clone(),
        }
    }

    pub fn chat_url(&self, version: Option<&str>) -> String {
        join_path(&self.versioned_base(version), &self.chat_path_suffix)
    }

    pub fn models_url(&self, version: Option<&str>) -> String {
        join_path(&self.versioned_base(version), &self.models_path_suffix)
    }
}

fn validate_base_url(base_url: &str) -> AppResult<()> {
    let parsed = url::Url::parse(base_url).map_err(|e| AppError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: format!("scheme must be http or https, got '{}'", parsed.scheme()),
        });
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(())
}

/// Classification of a single probe attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// HTTP 200
    Success,
    /// HTTP 404: wrong version path or unknown model, expected for most pairs
    NotFound,
    /// HTTP 401 or 403
    Unauthorized,
    /// Any other HTTP status
    HttpError,
    /// No HTTP response: timeout, DNS failure, connection refused
    TransportError,
}

impl ProbeOutcome {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => ProbeOutcome::Success,
            404 => ProbeOutcome::NotFound,
            401 | 403 => ProbeOutcome::Unauthorized,
            _ => ProbeOutcome::HttpError,
        }
    }

    /// Prometheus label value
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeOutcome::Success => "success",
            ProbeOutcome::NotFound => "not_found",
            ProbeOutcome::Unauthorized => "unauthorized",
            ProbeOutcome::HttpError => "http_error",
            ProbeOutcome::TransportError => "transport_error",
        }
    }
}

/// Result of one (version, candidate) attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    candidate: ModelCandidate,
    version_used: Option<String>,
    outcome: ProbeOutcome,
    status_code: Option<u16>,
    raw_error: Option<String>,
}

impl ProbeResult {
    /// Build a result from an HTTP status; `body` is kept for non-200 statuses only
    pub fn from_status(
        candidate: ModelCandidate,
        version_used: Option<String>,
        status: u16,
        body: Option<String>,
    ) -> Self {
        let outcome = ProbeOutcome::from_status(status);
        let raw_error = match outcome {
            ProbeOutcome::Success => None,
            _ => Some(truncate(body.unwrap_or_default(), MAX_ERROR_BODY_CHARS)),
        };
        Self {
            candidate,
            version_used,
            outcome,
            status_code: Some(status),
            raw_error,
        }
    }

    /// Build a result for an attempt that never got an HTTP response
    pub fn transport_failure(
        candidate: ModelCandidate,
        version_used: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            candidate,
            version_used,
            outcome: ProbeOutcome::TransportError,
            status_code: None,
            raw_error: Some(error.into()),
        }
    }

    pub fn candidate(&self) -> &ModelCandidate {
        &self.candidate
    }

    pub fn version_used(&self) -> Option<&str> {
        self.version_used.as_deref()
    }

    pub fn outcome(&self) -> ProbeOutcome {
        self.outcome
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == ProbeOutcome::Success
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn raw_error(&self) -> Option<&str> {
        self.raw_error.as_deref()
    }
}

fn truncate(mut text: String, max_chars: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
        text.push_str("...");
    }
    text
}

#[derive(Debug, Serialize)]
struct ChatProbeRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: [ChatProbeMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatProbeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Runs probe sweeps and model listings
///
/// Holds one pooled HTTP client; every request carries its own timeout so a
/// slow candidate never extends the budget of the next one.
pub struct EndpointProbe {
    client: reqwest::Client,
    per_call_timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl EndpointProbe {
    /// Create a probe whose chat requests time out after `per_call_timeout`
    pub fn new(per_call_timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(AppError::HttpClient)?;
        Ok(Self {
            client,
            per_call_timeout,
            metrics: None,
        })
    }

    /// Record attempt outcomes and latency into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn per_call_timeout(&self) -> Duration {
        self.per_call_timeout
    }

    /// Sweep (version, candidate) pairs in declared order
    ///
    /// Versions form the outer loop, candidates the inner loop. In
    /// [`ProbeMode::FirstSuccess`] no request is issued after the first HTTP 200
    /// and that success is the last element of the returned sequence. In
    /// [`ProbeMode::Exhaustive`] exactly `versions × candidates` results are
    /// returned.
    ///
    /// # Errors
    ///
    /// Fails before any network call if `candidates` is empty or the
    /// credential is blank. Per-attempt failures are never errors.
    pub async fn probe(
        &self,
        endpoint: &EndpointSpec,
        credential: &Credential,
        candidates: &[ModelCandidate],
        mode: ProbeMode,
    ) -> AppResult<Vec<ProbeResult>> {
        if candidates.is_empty() {
            return Err(AppError::EmptyCandidates);
        }
        if credential.is_blank() {
            return Err(AppError::MissingCredential {
                origin: "bearer token".to_string(),
            });
        }

        let span = tracing::info_span!(
            "probe_sweep",
            sweep_id = %uuid::Uuid::new_v4(),
            base_url = %endpoint.base_url(),
            mode = %mode,
        );

        self.sweep(endpoint, credential, candidates, mode)
            .instrument(span)
            .await
    }

    async fn sweep(
        &self,
        endpoint: &EndpointSpec,
        credential: &Credential,
        candidates: &[ModelCandidate],
        mode: ProbeMode,
    ) -> AppResult<Vec<ProbeResult>> {
        let versions = endpoint.versions();
        let mut results = Vec::with_capacity(versions.len() * candidates.len());

        tracing::info!(
            versions = versions.len(),
            candidates = candidates.len(),
            "Starting probe sweep"
        );

        for version in versions {
            let chat_url = endpoint.chat_url(version);
            tracing::debug!(version = ?version, url = %chat_url, "Probing API version");

            for candidate in candidates {
                let result = self
                    .attempt(&chat_url, version, candidate, credential)
                    .await;
                let stop = result.succeeded() && mode == ProbeMode::FirstSuccess;
                results.push(result);

                if stop {
                    tracing::info!(
                        attempts = results.len(),
                        "First working combination found, ending sweep"
                    );
                    return Ok(results);
                }
            }
        }

        tracing::info!(
            attempts = results.len(),
            successes = results.iter().filter(|r| r.succeeded()).count(),
            "Probe sweep complete"
        );
        Ok(results)
    }

    async fn attempt(
        &self,
        chat_url: &str,
        version: Option<&str>,
        candidate: &ModelCandidate,
        credential: &Credential,
    ) -> ProbeResult {
        let body = ChatProbeRequest {
            model: candidate.public_id(),
            stream: false,
            messages: [ChatProbeMessage {
                role: "user",
                content: PROBE_PROMPT,
            }],
        };

        let started = Instant::now();
        let response = self
            .client
            .post(chat_url)
            .bearer_auth(credential.expose())
            .timeout(self.per_call_timeout)
            .json(&body)
            .send()
            .await;

        let version_used = version.map(str::to_string);
        let result = match response {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = if status == 200 {
                    None
                } else {
                    response.text().await.ok()
                };
                ProbeResult::from_status(candidate.clone(), version_used, status, body)
            }
            Err(e) => {
                let reason = if e.is_timeout() {
                    format!(
                        "timed out after {}s: {}",
                        self.per_call_timeout.as_secs_f64(),
                        e
                    )
                } else {
                    e.to_string()
                };
                ProbeResult::transport_failure(candidate.clone(), version_used, reason)
            }
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        log_attempt(&result, elapsed_ms);
        if let Some(metrics) = &self.metrics {
            metrics.record_probe_attempt(result.outcome(), elapsed_ms);
        }
        result
    }

    /// List the models a versioned endpoint advertises
    ///
    /// # Errors
    ///
    /// Returns a description of the failure (transport error, non-200 status
    /// or undecodable body). Callers treat it as diagnostic detail only.
    pub async fn list_models(
        &self,
        endpoint: &EndpointSpec,
        version: Option<&str>,
        credential: &Credential,
        timeout: Duration,
    ) -> Result<Vec<String>, String> {
        let url = endpoint.models_url(version);
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.expose())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if status.as_u16() != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(body, MAX_ERROR_BODY_CHARS)
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("invalid JSON body: {}", e))?;
        Ok(parse_model_catalog(&body))
    }

    /// Sweep, then list catalogs for diagnostics
    ///
    /// When `listing_timeout` is set, one listing call is made per distinct
    /// version that produced a success, or for the first version when nothing
    /// succeeded. Listing failures only degrade the report's catalog section.
    pub async fn discover(
        &self,
        endpoint: &EndpointSpec,
        credential: &Credential,
        candidates: &[ModelCandidate],
        mode: ProbeMode,
        listing_timeout: Option<Duration>,
    ) -> AppResult<ProbeReport> {
        let results = self.probe(endpoint, credential, candidates, mode).await?;
        let mut report = ProbeReport::new(mode, endpoint.base_url(), results);

        let Some(listing_timeout) = listing_timeout else {
            return Ok(report);
        };

        let mut versions: Vec<Option<String>> = Vec::new();
        for result in report.successes() {
            let version = result.version_used().map(str::to_string);
            if !versions.contains(&version) {
                versions.push(version);
            }
        }
        if versions.is_empty() {
            versions.push(endpoint.versions()[0].map(str::to_string));
        }

        for version in versions {
            let url = endpoint.models_url(version.as_deref());
            let models = self
                .list_models(endpoint, version.as_deref(), credential, listing_timeout)
                .await;
            match &models {
                Ok(ids) => tracing::info!(url = %url, models = ids.len(), "Listed provider models"),
                Err(reason) => tracing::warn!(url = %url, reason = %reason, "Model listing failed"),
            }
            report.push_catalog(CatalogListing::new(version, url, models));
        }

        Ok(report)
    }
}

fn log_attempt(result: &ProbeResult, elapsed_ms: f64) {
    let model = result.candidate().public_id();
    let version = result.version_used().unwrap_or("-");
    match result.outcome() {
        ProbeOutcome::Success => {
            tracing::info!(model, version, elapsed_ms, "Probe succeeded")
        }
        ProbeOutcome::NotFound => {
            tracing::debug!(model, version, elapsed_ms, "Probe miss (404)")
        }
        ProbeOutcome::Unauthorized => tracing::warn!(
            model,
            version,
            status = ?result.status_code(),
            "Probe rejected: authorization failed"
        ),
        ProbeOutcome::HttpError => tracing::warn!(
            model,
            version,
            status = ?result.status_code(),
            reason = result.raw_error().unwrap_or(""),
            "Probe failed"
        ),
        ProbeOutcome::TransportError => tracing::warn!(
            model,
            version,
            reason = result.raw_error().unwrap_or(""),
            "Probe request error"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(base: &str) -> EndpointSpec {
        EndpointSpec::new(base, &[NormalizationRule::tamu_api()]).expect("valid base url")
    }

    #[test]
    fn test_endpoint_unversioned_urls() {
        let ep = endpoint("https://chat-api.tamu.ai/v1/");
        assert_eq!(ep.base_url(), "https://chat-api.tamu.ai/api");
        assert_eq!(ep.versions(), vec![None]);
        assert_eq!(
            ep.chat_url(None),
            "https://chat-api.tamu.ai/api/chat/completions"
        );
        assert_eq!(ep.models_url(None), "https://chat-api.tamu.ai/api/models");
    }

    #[test]
    fn test_endpoint_versioned_urls_replace_trailing_version() {
        let ep = endpoint("https://generativelanguage.example.com/v1")
            .with_api_versions(["v1", "v1beta"]);
        assert_eq!(
            ep.chat_url(Some("v1beta")),
            "https://generativelanguage.example.com/v1beta/chat/completions"
        );
        assert_eq!(
            ep.models_url(Some("v1")),
            "https://generativelanguage.example.com/v1/models"
        );
    }

    #[test]
    fn test_trailing_version_outside_candidates_is_replaced() {
        let ep = endpoint("https://generativelanguage.googleapis.com/v1")
            .with_api_versions(["v1beta"]);
        assert_eq!(
            ep.chat_url(Some("v1beta")),
            "https://generativelanguage.googleapis.com/v1beta/chat/completions"
        );
        assert_eq!(
            ep.models_url(Some("v1beta")),
            "https://generativelanguage.googleapis.com/v1beta/models"
        );
    }

    #[test]
    fn test_custom_version_markers() {
        let ep = endpoint("https://gateway.example.com/2024-06")
            .with_known_versions(["2024-06"])
            .with_api_versions(["2025-01"]);
        assert_eq!(
            ep.versioned_base(Some("2025-01")),
            "https://gateway.example.com/2025-01"
        );

        // Without the marker the trailing segment is part of the base path
        let ep = endpoint("https://gateway.example.com/2024-06")
            .with_known_versions(Vec::<String>::new())
            .with_api_versions(["2025-01"]);
        assert_eq!(
            ep.versioned_base(Some("2025-01")),
            "https://gateway.example.com/2024-06/2025-01"
        );
    }

    #[test]
    fn test_unversioned_base_keeps_its_path() {
        let ep = endpoint("http://localhost:23333/openai").with_api_versions(["v1"]);
        assert_eq!(
            ep.chat_url(Some("v1")),
            "http://localhost:23333/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_endpoint_custom_paths() {
        let ep = endpoint("http://localhost:8080")
            .with_api_versions(["/v2/", ""])
            .with_chat_path("/openai/chat/completions")
            .with_models_path("openai/models/");
        assert_eq!(ep.api_version_candidates(), ["v2"]);
        assert_eq!(
            ep.chat_url(Some("v2")),
            "http://localhost:8080/v2/openai/chat/completions"
        );
        assert_eq!(
            ep.models_url(Some("v2")),
            "http://localhost:8080/v2/openai/models"
        );
    }

    #[test]
    fn test_endpoint_rejects_malformed_urls() {
        let rules = [NormalizationRule::tamu_api()];
        assert!(matches!(
            EndpointSpec::new("not a url", &rules),
            Err(AppError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            EndpointSpec::new("ftp://example.com/v1", &rules),
            Err(AppError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            EndpointSpec::new("", &rules),
            Err(AppError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(ProbeOutcome::from_status(200), ProbeOutcome::Success);
        assert_eq!(ProbeOutcome::from_status(404), ProbeOutcome::NotFound);
        assert_eq!(ProbeOutcome::from_status(401), ProbeOutcome::Unauthorized);
        assert_eq!(ProbeOutcome::from_status(403), ProbeOutcome::Unauthorized);
        assert_eq!(ProbeOutcome::from_status(500), ProbeOutcome::HttpError);
        // Only exactly 200 counts as success
        assert_eq!(ProbeOutcome::from_status(201), ProbeOutcome::HttpError);
    }

    #[test]
    fn test_result_keeps_body_only_for_failures() {
        let ok = ProbeResult::from_status("m".into(), None, 200, Some("{}".to_string()));
        assert!(ok.succeeded());
        assert_eq!(ok.raw_error(), None);

        let miss = ProbeResult::from_status(
            "m".into(),
            Some("v1".to_string()),
            404,
            Some("no such model".to_string()),
        );
        assert!(!miss.succeeded());
        assert_eq!(miss.status_code(), Some(404));
        assert_eq!(miss.raw_error(), Some("no such model"));
        assert_eq!(miss.version_used(), Some("v1"));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let long = "é".repeat(600);
        let cut = truncate(long, MAX_ERROR_BODY_CHARS);
        assert_eq!(cut.chars().count(), MAX_ERROR_BODY_CHARS + 3);
        assert_eq!(truncate("short".to_string(), 10), "short");
    }

    #[test]
    fn test_probe_mode_parses_kebab_case() {
        let mode: ProbeMode = serde_json::from_str(r#""first-success""#).unwrap();
        assert_eq!(mode, ProbeMode::FirstSuccess);
        let mode: ProbeMode = serde_json::from_str(r#""exhaustive""#).unwrap();
        assert_eq!(mode, ProbeMode::Exhaustive);
        assert_eq!(ProbeMode::FirstSuccess.to_string(), "first-success");
    }

    #[tokio::test]
    async fn test_probe_rejects_empty_candidates_without_network() {
        let probe = EndpointProbe::new(Duration::from_secs(1)).unwrap();
        let ep = endpoint("http://127.0.0.1:9/v1");
        let result = probe
            .probe(&ep, &Credential::new("token"), &[], ProbeMode::FirstSuccess)
            .await;
        assert!(matches!(result, Err(AppError::EmptyCandidates)));
    }

    #[tokio::test]
    async fn test_probe_rejects_blank_credential() {
        let probe = EndpointProbe::new(Duration::from_secs(1)).unwrap();
        let ep = endpoint("http://127.0.0.1:9/v1");
        let result = probe
            .probe(
                &ep,
                &Credential::new("  "),
                &["m".into()],
                ProbeMode::FirstSuccess,
            )
            .await;
        assert!(matches!(result, Err(AppError::MissingCredential { .. })));
    }
}
