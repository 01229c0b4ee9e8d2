//! Integration tests for the supervised model-server workflow
//!
//! Uses `sh` as a stand-in server so early exits, timeouts and follow-up
//! failures can be exercised without a real model server. Unix only.

#![cfg(unix)]

use judgeprobe::error::AppError;
use judgeprobe::server::{HealthCheck, ReadinessPolicy, ServerProcess, ServerSpec, run_with_server};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

fn sh(script: &str, log_file: PathBuf) -> ServerSpec {
    ServerSpec::new("sh", vec!["-c".to_string(), script.to_string()], log_file)
}

fn fast_policy(max_attempts: u32) -> ReadinessPolicy {
    ReadinessPolicy::new(Duration::from_millis(50), max_attempts)
}

/// Server that records its pid, then sleeps under that same pid
fn sleeping_server(dir: &Path) -> (ServerSpec, PathBuf) {
    let pid_file = dir.join("server.pid");
    let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());
    (sh(&script, dir.join("server.log")), pid_file)
}

/// Shell snippet that blocks until the server has written its pid
fn wait_for_pid(pid_file: &Path) -> String {
    format!(
        "while [ ! -s '{}' ]; do sleep 0.05; done",
        pid_file.display()
    )
}

fn assert_not_running(pid_file: &Path) {
    let pid = std::fs::read_to_string(pid_file).expect("server wrote its pid");
    let alive = std::process::Command::new("kill")
        .args(["-0", pid.trim()])
        .stderr(std::process::Stdio::null())
        .status()
        .expect("kill is available")
        .success();
    assert!(!alive, "server process {} is still running", pid.trim());
}

#[tokio::test]
async fn test_early_exit_reports_log_tail() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("server.log");
    let spec = sh("echo boom; exit 3", log.clone());

    // Health URL that never answers, so only the exit can end the wait
    let check = HealthCheck::new("http://127.0.0.1:9/v1/models").unwrap();
    let mut server = ServerProcess::spawn(&spec).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let err = server.wait_ready(&check, &fast_policy(100)).await.unwrap_err();
    match err {
        AppError::ServerExited {
            status, log_tail, ..
        } => {
            assert!(status.contains('3'), "status: {}", status);
            assert!(log_tail.contains("boom"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_startup_timeout_kills_server() {
    let dir = TempDir::new().unwrap();
    let spec = sh("echo starting; sleep 30", dir.path().join("server.log"));

    let check = HealthCheck::new("http://127.0.0.1:9/v1/models").unwrap();
    let mut server = ServerProcess::spawn(&spec).unwrap();

    let err = server.wait_ready(&check, &fast_policy(3)).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::ServerStartupTimeout { attempts: 3, .. }
    ));
    assert!(!server.is_running());
}

#[tokio::test]
async fn test_followup_runs_and_server_stops() {
    let health = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&health)
        .await;

    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("followup-ran");
    let (spec, pid_file) = sleeping_server(dir.path());
    let check = HealthCheck::new(health.uri()).unwrap();
    let followup = vec![
        "sh".to_string(),
        "-c".to_string(),
        format!("{}; touch '{}'", wait_for_pid(&pid_file), marker.display()),
    ];

    run_with_server(&spec, &check, &fast_policy(5), &followup)
        .await
        .expect("workflow should succeed");

    assert!(marker.exists());
    assert_not_running(&pid_file);
}

#[tokio::test]
async fn test_followup_failure_is_reported() {
    let health = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&health)
        .await;

    let dir = TempDir::new().unwrap();
    let (spec, pid_file) = sleeping_server(dir.path());
    let check = HealthCheck::new(health.uri()).unwrap();
    let followup = vec![
        "sh".to_string(),
        "-c".to_string(),
        format!("{}; exit 2", wait_for_pid(&pid_file)),
    ];

    let err = run_with_server(&spec, &check, &fast_policy(5), &followup)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::FollowupFailed { .. }));
    assert_not_running(&pid_file);
}
