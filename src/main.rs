//! judgeprobe command-line entry point
//!
//! Probes a judge endpoint, smoke-tests registered judges, or runs a command
//! against a supervised model server.

use clap::Parser;
use judgeprobe::cli::{Cli, Command, generate_config_template};
use judgeprobe::config::Config;
use judgeprobe::error::{AppError, AppResult};
use judgeprobe::judge::JudgeConnection;
use judgeprobe::metrics::Metrics;
use judgeprobe::probe::{EndpointProbe, ProbeMode};
use judgeprobe::registry::JudgeRegistry;
use judgeprobe::server::{HealthCheck, run_with_server};
use judgeprobe::telemetry;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

/// Prompt whose answer is checked for "4"
const SMOKE_TEST_PROMPT: &str = "What is 2+2? Answer only with the number.";

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Template generation needs neither config nor logging
    if let Command::Config { output } = &cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(path, template)?;
                eprintln!("Configuration template written to: {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load(cli.config.as_deref().map(Path::new))?;
    telemetry::init(&config.observability.log_level);

    let code = match cli.command {
        Command::Probe {
            mode,
            candidates,
            versions,
            no_list_models,
            metrics,
        } => {
            let mut config = config;
            if let Some(mode) = mode {
                config.probe.mode = mode;
            }
            if !candidates.is_empty() {
                config.probe.candidates = candidates;
            }
            if !versions.is_empty() {
                config.endpoint.api_versions = versions;
            }
            if no_list_models {
                config.probe.list_models = false;
            }
            config.validate()?;
            run_probe(&config, metrics).await?
        }
        Command::Judge {
            name,
            probe,
            prompt,
            metrics,
        } => run_judge(&config, name, probe, prompt, metrics).await?,
        Command::Serve { followup, metrics } => run_serve(&config, followup, metrics).await?,
        Command::Config { .. } => ExitCode::SUCCESS,
    };

    Ok(code)
}

fn new_metrics() -> AppResult<Arc<Metrics>> {
    Metrics::new()
        .map(Arc::new)
        .map_err(|e| AppError::Internal(format!("metrics registry: {}", e)))
}

fn print_metrics(metrics: &Metrics) -> AppResult<()> {
    let text = metrics
        .gather()
        .map_err(|e| AppError::Internal(format!("metrics encoding: {}", e)))?;
    println!("{}", text);
    Ok(())
}

async fn run_probe(config: &Config, show_metrics: bool) -> AppResult<ExitCode> {
    let credential = config.resolve_credential()?;
    let endpoint = config.endpoint_spec(&config.resolve_base_url()?)?;
    let metrics = new_metrics()?;

    let probe = EndpointProbe::new(config.probe_timeout())?.with_metrics(metrics.clone());
    let report = probe
        .discover(
            &endpoint,
            &credential,
            &config.candidates(),
            config.probe.mode,
            config.listing_timeout(),
        )
        .await?;

    println!("{}", report);
    if show_metrics {
        print_metrics(&metrics)?;
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_judge(
    config: &Config,
    name: Option<String>,
    probe_first: bool,
    prompt: Option<String>,
    show_metrics: bool,
) -> AppResult<ExitCode> {
    let credential = config.resolve_credential()?;
    let endpoint = config.endpoint_spec(&config.resolve_base_url()?)?;
    let metrics = new_metrics()?;

    let mut registry = JudgeRegistry::new();
    config.judges.register_into(&mut registry);

    let mut name = name;
    let mut version = endpoint.versions()[0].map(str::to_string);

    if probe_first {
        let probe = EndpointProbe::new(config.probe_timeout())?.with_metrics(metrics.clone());
        let report = probe
            .discover(
                &endpoint,
                &credential,
                &config.candidates(),
                ProbeMode::FirstSuccess,
                None,
            )
            .await?;

        match report.recommended() {
            Some(best) => {
                let model = best.candidate().public_id();
                registry.register(model, config.judges.settings_for(model));
                version = best.version_used().map(str::to_string);
                name.get_or_insert_with(|| model.to_string());
            }
            None => {
                println!("{}", report);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    let name = name.unwrap_or_else(|| config.judges.default.clone());
    let connection = JudgeConnection::new(endpoint.versioned_base(version.as_deref()), credential)
        .with_chat_path(config.endpoint.chat_path.clone())
        .with_request_timeout(config.judges.request_timeout())
        .with_retry_backoff(config.judges.retry_backoff())
        .with_metrics(metrics.clone());

    let judge = registry.resolve(&name)?.build(&connection)?;
    tracing::info!(judge = %name, url = %judge.chat_url(), "Sending judge request");

    let reply = judge
        .generate(prompt.as_deref().unwrap_or(SMOKE_TEST_PROMPT))
        .await;
    if show_metrics {
        print_metrics(&metrics)?;
    }
    let reply = reply?;

    if prompt.is_some() {
        println!("{}", reply);
        return Ok(ExitCode::SUCCESS);
    }
    println!("Response: {}", reply.trim());
    if reply.contains('4') {
        println!("Judge '{}' is working.", name);
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Judge '{}' answered, but not with 4.", name);
        Ok(ExitCode::FAILURE)
    }
}

async fn run_serve(config: &Config, followup: Vec<String>, show_metrics: bool) -> AppResult<ExitCode> {
    let server = config
        .server
        .as_ref()
        .ok_or_else(|| AppError::Config("serve requires a [server] section".to_string()))?;

    let followup = if followup.is_empty() {
        server.followup.clone()
    } else {
        followup
    };

    let metrics = new_metrics()?;
    let check = HealthCheck::new(server.health_url.clone())?.with_metrics(metrics.clone());
    let result = run_with_server(&server.spec(), &check, &server.readiness_policy(), &followup).await;

    // Poll counts matter most when startup failed
    if show_metrics {
        print_metrics(&metrics)?;
    }
    result?;
    Ok(ExitCode::SUCCESS)
}
