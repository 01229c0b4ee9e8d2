//! Error types for judgeprobe
//!
//! Expected negative probe outcomes (404, 401, timeouts) are never errors; they
//! are recorded as `ProbeResult`s. `AppError` covers configuration failures,
//! registry misses, judge call exhaustion and server lifecycle failures.

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Credential missing: {origin} is not set or empty")]
    MissingCredential { origin: String },

    #[error("Base URL missing: {origin} is not set and no base_url is configured")]
    MissingBaseUrl { origin: String },

    #[error("No candidate models to probe")]
    EmptyCandidates,

    #[error("Malformed base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Judge model '{0}' is not registered")]
    JudgeNotFound(String),

    #[error("Judge {model} failed after {attempts} attempt(s): {reason}")]
    JudgeRequestFailed {
        model: String,
        attempts: u32,
        reason: String,
    },

    #[error("Failed to spawn server command '{command}': {source}")]
    ServerSpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server process exited before becoming ready ({status}). Check {log_path}:\n{log_tail}")]
    ServerExited {
        status: String,
        log_path: String,
        log_tail: String,
    },

    #[error(
        "Server did not become ready after {attempts} health checks ({elapsed_seconds}s). Check {log_path}:\n{log_tail}"
    )]
    ServerStartupTimeout {
        attempts: u32,
        elapsed_seconds: u64,
        log_path: String,
        log_tail: String,
    },

    #[error("Follow-up command '{command}' failed: {reason}")]
    FollowupFailed { command: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_creates() {
        let err = AppError::Config("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_missing_credential_names_variable() {
        let err = AppError::MissingCredential {
            origin: "OPENAI_API_KEY".to_string(),
        };
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_judge_not_found_names_judge() {
        let err = AppError::JudgeNotFound("protected.o3-mini".to_string());
        assert_eq!(
            err.to_string(),
            "Judge model 'protected.o3-mini' is not registered"
        );
    }

    #[test]
    fn test_startup_timeout_surfaces_log() {
        let err = AppError::ServerStartupTimeout {
            attempts: 60,
            elapsed_seconds: 600,
            log_path: "server.log".to_string(),
            log_tail: "CUDA out of memory".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("60 health checks"));
        assert!(msg.contains("server.log"));
        assert!(msg.contains("CUDA out of memory"));
    }
}
