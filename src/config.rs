//! Configuration management for judgeprobe
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Secrets and the base URL are never stored in the file; they are read from
//! the environment variables the file names, at the moment they are needed.

use crate::error::{AppError, AppResult};
use crate::probe::{DEFAULT_VERSION_MARKERS, EndpointSpec, ModelCandidate, NormalizationRule, ProbeMode};
use crate::registry::{DEFAULT_RETRY_BUDGET, DEFAULT_TEMPERATURE, JudgeRegistry, JudgeSettings};
use crate::server::{ReadinessPolicy, ServerSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Candidate ids the TAMU AI gateway exposes for cheap judging
const DEFAULT_JUDGE_MODELS: [&str; 6] = [
    "protected.gemini-2.0-flash-lite",
    "protected.gemini-2.5-flash-lite",
    "protected.o3-mini",
    "protected.gpt-4o-mini",
    "protected.llama-3.2",
    "protected.claude-3.5-haiku",
];

/// Opaque bearer token
///
/// Only ever forwarded as `Authorization: Bearer <token>`. `Debug` never prints
/// the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the auth header
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default = "default_normalization")]
    pub normalization: Vec<NormalizationRule>,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub judges: JudgesConfig,
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            normalization: default_normalization(),
            probe: ProbeConfig::default(),
            judges: JudgesConfig::default(),
            server: None,
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_normalization() -> Vec<NormalizationRule> {
    vec![NormalizationRule::tamu_api()]
}

/// Target endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Literal base URL; takes precedence over `base_url_env`
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_base_url_env")]
    pub base_url_env: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Ordered API-version path segments; empty means use the base URL as-is
    #[serde(default)]
    pub api_versions: Vec<String>,
    /// Trailing base-URL segments replaced (not extended) when a version is appended
    #[serde(default = "default_known_versions")]
    pub known_versions: Vec<String>,
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    #[serde(default = "default_models_path")]
    pub models_path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            base_url_env: default_base_url_env(),
            api_key_env: default_api_key_env(),
            api_versions: Vec::new(),
            known_versions: default_known_versions(),
            chat_path: default_chat_path(),
            models_path: default_models_path(),
        }
    }
}

fn default_base_url_env() -> String {
    "OPENAI_API_BASE".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_known_versions() -> Vec<String> {
    DEFAULT_VERSION_MARKERS.iter().map(|s| s.to_string()).collect()
}

fn default_chat_path() -> String {
    "chat/completions".to_string()
}

fn default_models_path() -> String {
    "models".to_string()
}

/// Probe sweep configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub mode: ProbeMode,
    #[serde(default = "default_probe_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_listing_timeout")]
    pub listing_timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub list_models: bool,
    /// Candidate model ids in priority order
    #[serde(default = "default_judge_models")]
    pub candidates: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            mode: ProbeMode::default(),
            timeout_seconds: default_probe_timeout(),
            listing_timeout_seconds: default_listing_timeout(),
            list_models: true,
            candidates: default_judge_models(),
        }
    }
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_listing_timeout() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_judge_models() -> Vec<String> {
    DEFAULT_JUDGE_MODELS.iter().map(|s| s.to_string()).collect()
}

/// Judge registration defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JudgesConfig {
    #[serde(default)]
    pub temperature: f64,
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
    #[serde(default)]
    pub verbose: bool,
    /// Public names registered at start-up; each maps to the same underlying id
    #[serde(default = "default_judge_models")]
    pub names: Vec<String>,
    /// Judge resolved when none is named explicitly
    #[serde(default = "default_judge")]
    pub default: String,
    #[serde(default = "default_judge_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for JudgesConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            retry_budget: default_retry_budget(),
            verbose: false,
            names: default_judge_models(),
            default: default_judge(),
            request_timeout_seconds: default_judge_timeout(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl JudgesConfig {
    /// Settings for a judge backed by `model` with the configured defaults
    pub fn settings_for(&self, model: impl Into<String>) -> JudgeSettings {
        JudgeSettings::new(model)
            .with_temperature(self.temperature)
            .with_retry_budget(self.retry_budget)
            .with_verbose(self.verbose)
    }

    /// Seed `registry` with every configured name, each backed by the same model id
    ///
    /// Names are bulk-registered with the fixed defaults; entries are then
    /// re-registered only when this section overrides temperature, retry
    /// budget or verbosity.
    pub fn register_into(&self, registry: &mut JudgeRegistry) {
        registry.bulk_register(self.names.iter().map(|name| (name.as_str(), name.as_str())));

        let overridden = self.temperature != DEFAULT_TEMPERATURE
            || self.retry_budget != DEFAULT_RETRY_BUDGET
            || self.verbose;
        if overridden {
            for name in &self.names {
                registry.register(name.as_str(), self.settings_for(name.as_str()));
            }
            tracing::debug!(
                temperature = self.temperature,
                retry_budget = self.retry_budget,
                verbose = self.verbose,
                "Applied configured judge defaults"
            );
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn default_retry_budget() -> u32 {
    10
}

fn default_judge() -> String {
    DEFAULT_JUDGE_MODELS[0].to_string()
}

fn default_judge_timeout() -> u64 {
    60
}

fn default_retry_backoff_ms() -> u64 {
    500
}

/// Model-serving process configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_health_url")]
    pub health_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Command (program followed by arguments) run once the server is ready
    #[serde(default)]
    pub followup: Vec<String>,
}

impl ServerConfig {
    pub fn spec(&self) -> ServerSpec {
        ServerSpec::new(&self.command, self.args.clone(), self.log_file.clone())
    }

    pub fn readiness_policy(&self) -> ReadinessPolicy {
        ReadinessPolicy::new(
            Duration::from_secs(self.poll_interval_seconds),
            self.max_attempts,
        )
    }
}

fn default_health_url() -> String {
    "http://0.0.0.0:23333/v1/models".to_string()
}

fn default_poll_interval() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    60
}

fn default_log_file() -> PathBuf {
    PathBuf::from("server.log")
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        let config: Self = toml::from_str(&content).map_err(|source| {
            AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Load from `path` when given, otherwise use the built-in defaults
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Read the credential from the process environment
    pub fn resolve_credential(&self) -> AppResult<Credential> {
        self.resolve_credential_with(|name| std::env::var(name).ok())
    }

    /// Read the credential through `lookup` (an environment accessor)
    pub fn resolve_credential_with<F>(&self, lookup: F) -> AppResult<Credential>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = &self.endpoint.api_key_env;
        match lookup(var) {
            Some(token) if !token.trim().is_empty() => Ok(Credential::new(token.trim())),
            _ => Err(AppError::MissingCredential {
                origin: format!("environment variable {}", var),
            }),
        }
    }

    /// Resolve the raw base URL from the config file or the process environment
    pub fn resolve_base_url(&self) -> AppResult<String> {
        self.resolve_base_url_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_base_url_with<F>(&self, lookup: F) -> AppResult<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = self
            .endpoint
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
        {
            return Ok(url.to_string());
        }

        let var = &self.endpoint.base_url_env;
        match lookup(var) {
            Some(url) if !url.trim().is_empty() => Ok(url.trim().to_string()),
            _ => Err(AppError::MissingBaseUrl {
                origin: format!("environment variable {}", var),
            }),
        }
    }

    /// Build the probe target from a raw base URL
    pub fn endpoint_spec(&self, base_url: &str) -> AppResult<EndpointSpec> {
        Ok(EndpointSpec::new(base_url, &self.normalization)?
            .with_known_versions(self.endpoint.known_versions.iter().cloned())
            .with_api_versions(self.endpoint.api_versions.iter().cloned())
            .with_chat_path(self.endpoint.chat_path.clone())
            .with_models_path(self.endpoint.models_path.clone()))
    }

    pub fn candidates(&self) -> Vec<ModelCandidate> {
        self.probe
            .candidates
            .iter()
            .map(|id| ModelCandidate::new(id.as_str()))
            .collect()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_seconds)
    }

    /// Listing timeout, or `None` when listing is disabled
    pub fn listing_timeout(&self) -> Option<Duration> {
        self.probe
            .list_models
            .then(|| Duration::from_secs(self.probe.listing_timeout_seconds))
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()` and `from_str()`, but can
    /// also be called explicitly when constructing Config via other means
    /// (e.g., in tests).
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("probe.timeout_seconds", self.probe.timeout_seconds),
            (
                "probe.listing_timeout_seconds",
                self.probe.listing_timeout_seconds,
            ),
            (
                "judges.request_timeout_seconds",
                self.judges.request_timeout_seconds,
            ),
        ] {
            validate_timeout(name, value)?;
        }

        if self.probe.candidates.iter().any(|c| c.trim().is_empty()) {
            return Err(AppError::Config(
                "probe.candidates must not contain empty model ids".to_string(),
            ));
        }

        if self.endpoint.chat_path.trim_matches('/').is_empty() {
            return Err(AppError::Config(
                "endpoint.chat_path must not be empty".to_string(),
            ));
        }

        // Normalization must stay idempotent across the whole rule set: no
        // rule may produce a segment that another rule rewrites.
        for rule in &self.normalization {
            for other in &self.normalization {
                if rule.to().split('/').any(|segment| segment == other.from()) {
                    return Err(AppError::Config(format!(
                        "normalization rule '{}' -> '{}' produces segment '{}' rewritten by another rule",
                        rule.from(),
                        rule.to(),
                        other.from()
                    )));
                }
            }
        }

        let judges = &self.judges;
        if !judges.temperature.is_finite() || !(0.0..=2.0).contains(&judges.temperature) {
            return Err(AppError::Config(format!(
                "judges.temperature must be a finite number between 0.0 and 2.0, got {}",
                judges.temperature
            )));
        }
        if judges.retry_budget == 0 {
            return Err(AppError::Config(
                "judges.retry_budget must be at least 1".to_string(),
            ));
        }
        if judges.names.iter().any(|n| n.trim().is_empty()) {
            return Err(AppError::Config(
                "judges.names must not contain empty names".to_string(),
            ));
        }

        if let Some(server) = &self.server {
            if server.command.trim().is_empty() {
                return Err(AppError::Config(
                    "server.command must not be empty".to_string(),
                ));
            }
            if server.max_attempts == 0 {
                return Err(AppError::Config(
                    "server.max_attempts must be at least 1".to_string(),
                ));
            }
            if server.poll_interval_seconds == 0 {
                return Err(AppError::Config(
                    "server.poll_interval_seconds must be greater than 0".to_string(),
                ));
            }
            if !server.health_url.starts_with("http://") && !server.health_url.starts_with("https://")
            {
                return Err(AppError::Config(format!(
                    "server.health_url must start with 'http://' or 'https://', got '{}'",
                    server.health_url
                )));
            }
        }

        Ok(())
    }
}

fn validate_timeout(name: &str, value: u64) -> AppResult<()> {
    if value == 0 {
        return Err(AppError::Config(format!(
            "{} must be greater than 0, got {}",
            name, value
        )));
    }
    if value > 300 {
        return Err(AppError::Config(format!(
            "{} cannot exceed 300 seconds (5 minutes), got {}",
            name, value
        )));
    }
    Ok(())
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
