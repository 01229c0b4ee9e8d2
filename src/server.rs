//! Supervised model-serving process
//!
//! Spawns the serving command with stdout/stderr redirected to a log file,
//! polls an HTTP readiness URL at a fixed interval, and terminates the process
//! on every exit path. The child is also spawned with `kill_on_drop`, so an
//! early return or panic cannot leak the server.

use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};

/// Lines of server log surfaced in startup errors
const LOG_TAIL_LINES: usize = 20;

/// Polls between "still waiting" progress messages (one minute at the default interval)
const PROGRESS_EVERY: u32 = 6;

/// How often and how long to wait for readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl ReadinessPolicy {
    /// `max_attempts` health checks, `interval` apart (at least one check is made)
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for ReadinessPolicy {
    /// 10-second interval, 60 checks: a ten-minute ceiling
    fn default() -> Self {
        Self::new(Duration::from_secs(10), 60)
    }
}

/// HTTP readiness predicate: GET `url` answers 200
pub struct HealthCheck {
    client: reqwest::Client,
    url: String,
    metrics: Option<Arc<Metrics>>,
}

impl HealthCheck {
    pub fn new(url: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(AppError::HttpClient)?;
        Ok(Self {
            client,
            url: url.into(),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One readiness check
    pub async fn is_ready(&self) -> bool {
        let ready = match self.client.get(&self.url).send().await {
            Ok(response) => {
                tracing::debug!(
                    url = %self.url,
                    status = %response.status(),
                    "Readiness check completed"
                );
                response.status().as_u16() == 200
            }
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "Readiness check failed");
                false
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_readiness_poll(ready);
        }
        ready
    }
}

/// Outcome of a readiness wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Became ready on check number `attempts`
    Ready { attempts: u32 },
    /// `attempts` checks made without success
    TimedOut { attempts: u32, elapsed: Duration },
    /// The supervised process exited while waiting
    Exited { status: String },
}

/// Poll `check` until it passes or the policy's attempt ceiling is reached
///
/// No sleep follows the final failed check.
pub async fn poll_until_ready(check: &HealthCheck, policy: &ReadinessPolicy) -> Readiness {
    wait_loop(check, policy, None).await
}

async fn wait_loop(
    check: &HealthCheck,
    policy: &ReadinessPolicy,
    mut child: Option<&mut Child>,
) -> Readiness {
    let started = Instant::now();

    for attempt in 1..=policy.max_attempts {
        if let Some(child) = child.as_deref_mut() {
            if let Ok(Some(status)) = child.try_wait() {
                return Readiness::Exited {
                    status: status.to_string(),
                };
            }
        }

        if check.is_ready().await {
            tracing::info!(
                url = %check.url(),
                attempts = attempt,
                elapsed_secs = started.elapsed().as_secs(),
                "Server is ready"
            );
            return Readiness::Ready { attempts: attempt };
        }

        if attempt == policy.max_attempts {
            break;
        }
        if attempt % PROGRESS_EVERY == 0 {
            tracing::info!(
                url = %check.url(),
                attempts = attempt,
                elapsed_secs = started.elapsed().as_secs(),
                "Still waiting for server"
            );
        }
        tokio::time::sleep(policy.interval).await;
    }

    Readiness::TimedOut {
        attempts: policy.max_attempts,
        elapsed: started.elapsed(),
    }
}

/// Command line and log destination for a serving process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    command: String,
    args: Vec<String>,
    log_file: PathBuf,
}

impl ServerSpec {
    pub fn new(command: impl Into<String>, args: Vec<String>, log_file: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args,
            log_file: log_file.into(),
        }
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A running serving process
pub struct ServerProcess {
    child: Child,
    command_line: String,
    log_path: PathBuf,
}

impl ServerProcess {
    /// Spawn the server with output redirected to its log file
    pub fn spawn(spec: &ServerSpec) -> AppResult<Self> {
        let command_line = spec.command_line();
        let spawn_err = |source| AppError::ServerSpawnFailed {
            command: command_line.clone(),
            source,
        };

        let log = File::create(&spec.log_file).map_err(spawn_err)?;
        let log_err = log.try_clone().map_err(spawn_err)?;

        let child = Command::new(&spec.command)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_err)?;

        tracing::info!(
            command = %command_line,
            pid = ?child.id(),
            log = %spec.log_file.display(),
            "Launched model server"
        );

        Ok(Self {
            child,
            command_line,
            log_path: spec.log_file.clone(),
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Wait for readiness; on failure the process is terminated before returning
    ///
    /// # Errors
    ///
    /// `ServerExited` if the process dies while waiting, `ServerStartupTimeout`
    /// if the policy's ceiling is reached. Both carry the log tail.
    pub async fn wait_ready(&mut self, check: &HealthCheck, policy: &ReadinessPolicy) -> AppResult<u32> {
        tracing::info!(
            url = %check.url(),
            interval_secs = policy.interval().as_secs_f64(),
            max_attempts = policy.max_attempts(),
            "Waiting for server to initialize"
        );

        match wait_loop(check, policy, Some(&mut self.child)).await {
            Readiness::Ready { attempts } => Ok(attempts),
            Readiness::Exited { status } => {
                tracing::error!(
                    command = %self.command_line,
                    status = %status,
                    "Server exited before becoming ready"
                );
                Err(AppError::ServerExited {
                    status,
                    log_path: self.log_path.display().to_string(),
                    log_tail: read_log_tail(&self.log_path, LOG_TAIL_LINES),
                })
            }
            Readiness::TimedOut { attempts, elapsed } => {
                tracing::error!(
                    command = %self.command_line,
                    attempts,
                    "Server failed to start within the wait ceiling"
                );
                self.terminate().await;
                Err(AppError::ServerStartupTimeout {
                    attempts,
                    elapsed_seconds: elapsed.as_secs(),
                    log_path: self.log_path.display().to_string(),
                    log_tail: read_log_tail(&self.log_path, LOG_TAIL_LINES),
                })
            }
        }
    }

    /// Kill the process (if still running) and reap it
    pub async fn terminate(&mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(status = %status, "Server already exited");
                return;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Could not query server status"),
        }

        tracing::info!(command = %self.command_line, "Shutting down server");
        if let Err(e) = self.child.kill().await {
            tracing::warn!(error = %e, "Failed to kill server process");
        }
    }

    /// Whether the process is still running
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

/// Last `lines` lines of the log file, or a note when it cannot be read
pub fn read_log_tail(path: &Path, lines: usize) -> String {
    match std::fs::read(path) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            let all: Vec<&str> = text.lines().collect();
            all[all.len().saturating_sub(lines)..].join("\n")
        }
        Err(e) => format!("<could not read {}: {}>", path.display(), e),
    }
}

/// Start the server, wait for readiness, run `followup`, then stop the server
///
/// The server is terminated on every path. An empty `followup` just checks
/// that the server comes up.
pub async fn run_with_server(
    spec: &ServerSpec,
    check: &HealthCheck,
    policy: &ReadinessPolicy,
    followup: &[String],
) -> AppResult<()> {
    let mut server = ServerProcess::spawn(spec)?;
    server.wait_ready(check, policy).await?;

    let result = match followup.split_first() {
        Some((program, args)) => run_followup(program, args).await,
        None => Ok(()),
    };

    server.terminate().await;
    result
}

async fn run_followup(program: &str, args: &[String]) -> AppResult<()> {
    let command_line = std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(command = %command_line, "Running follow-up command");

    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|e| AppError::FollowupFailed {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

    if status.success() {
        tracing::info!(command = %command_line, "Follow-up command completed");
        Ok(())
    } else {
        Err(AppError::FollowupFailed {
            command: command_line,
            reason: status.to_string(),
        })
    }
}
