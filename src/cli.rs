//! Command-line interface for judgeprobe
//!
//! Provides argument parsing and subcommand handling for the judgeprobe binary.

use crate::probe::ProbeMode;
use clap::{Parser, Subcommand};

/// Judge-model endpoint discovery for OpenAI-compatible gateways
#[derive(Parser)]
#[command(name = "judgeprobe")]
#[command(version)]
#[command(about = "Judge-model endpoint discovery for OpenAI-compatible gateways")]
#[command(
    long_about = "judgeprobe finds which (API version, model id) combinations a gateway \
    actually serves, registers judge models under public names, and supervises a local \
    model server for evaluation runs."
)]
pub struct Cli {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sweep candidate models against the configured endpoint
    Probe {
        /// Stop policy (overrides probe.mode)
        #[arg(long, value_enum)]
        mode: Option<ProbeMode>,

        /// Candidate model id, repeatable, in priority order (overrides probe.candidates)
        #[arg(long = "candidate")]
        candidates: Vec<String>,

        /// API version segment, repeatable, in priority order (overrides endpoint.api_versions)
        #[arg(long = "version")]
        versions: Vec<String>,

        /// Skip the model-listing diagnostics
        #[arg(long)]
        no_list_models: bool,

        /// Print Prometheus metrics after the summary
        #[arg(long)]
        metrics: bool,
    },

    /// Build a registered judge and send it a smoke-test prompt
    Judge {
        /// Public judge name (defaults to judges.default)
        #[arg(long)]
        name: Option<String>,

        /// Probe first and use the recommended model
        #[arg(long)]
        probe: bool,

        /// Prompt to send instead of the arithmetic smoke test
        #[arg(long)]
        prompt: Option<String>,

        /// Print Prometheus metrics after the reply
        #[arg(long)]
        metrics: bool,
    },

    /// Start the model server, wait for readiness, run a follow-up command
    Serve {
        /// Print Prometheus metrics once the server is stopped
        #[arg(long)]
        metrics: bool,

        /// Follow-up command and arguments (overrides server.followup)
        #[arg(last = true)]
        followup: Vec<String>,
    },

    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# judgeprobe Configuration
# ========================
#
# Every setting has a built-in default; this file only needs the values you
# want to change. Secrets are never stored here: the bearer token (and, unless
# endpoint.base_url is set, the base URL) are read from environment variables.

# ─────────────────────────────────────────────────────────────────────────────
# ENDPOINT
# ─────────────────────────────────────────────────────────────────────────────

[endpoint]
# Literal base URL. When omitted, the value of base_url_env is used.
# base_url = "https://chat-api.tamu.ai/v1"

# Environment variable holding the base URL
base_url_env = "OPENAI_API_BASE"

# Environment variable holding the bearer token
api_key_env = "OPENAI_API_KEY"

# API version segments to try, in priority order. Empty means the base URL is
# probed as-is.
api_versions = []

# Trailing base-URL segments treated as versions: probing `https://host/v1`
# with "v1beta" targets `https://host/v1beta`, not `https://host/v1/v1beta`.
known_versions = ["v1", "v1alpha", "v1beta", "v2", "v2beta", "v3"]

# Paths appended to the (versioned) base URL
chat_path = "chat/completions"
models_path = "models"

# ─────────────────────────────────────────────────────────────────────────────
# NORMALIZATION
# ─────────────────────────────────────────────────────────────────────────────
#
# When the base URL's host contains host_marker, the path segment `from` is
# replaced by `to`. No rule's `to` may contain another rule's `from`.

[[normalization]]
host_marker = "tamu.ai"
from = "v1"
to = "api"

# ─────────────────────────────────────────────────────────────────────────────
# PROBE
# ─────────────────────────────────────────────────────────────────────────────

[probe]
# "first-success": stop at the first working combination
# "exhaustive": try every (version, candidate) pair
mode = "first-success"

# Per-request timeouts in seconds
timeout_seconds = 10
listing_timeout_seconds = 5

# List the provider's model catalog after the sweep
list_models = true

# Candidate model ids, in priority order
candidates = [
    "protected.gemini-2.0-flash-lite",
    "protected.gemini-2.5-flash-lite",
    "protected.o3-mini",
    "protected.gpt-4o-mini",
    "protected.llama-3.2",
    "protected.claude-3.5-haiku",
]

# ─────────────────────────────────────────────────────────────────────────────
# JUDGES
# ─────────────────────────────────────────────────────────────────────────────

[judges]
# Defaults captured when a judge is registered
temperature = 0.0
retry_budget = 10
verbose = false

# Public names registered at start-up (each backed by the same model id)
names = [
    "protected.gemini-2.0-flash-lite",
    "protected.gpt-4o-mini",
]

# Judge used when none is named
default = "protected.gemini-2.0-flash-lite"

request_timeout_seconds = 60
retry_backoff_ms = 500

# ─────────────────────────────────────────────────────────────────────────────
# MODEL SERVER (Optional)
# ─────────────────────────────────────────────────────────────────────────────
#
# Used by `judgeprobe serve`. The server is polled at health_url until it
# answers 200, at most max_attempts times, poll_interval_seconds apart.

[server]
command = "lmdeploy"
args = ["serve", "api_server", "Qwen/Qwen2-VL-7B-Instruct", "--server-port", "23333"]
health_url = "http://0.0.0.0:23333/v1/models"
poll_interval_seconds = 10
max_attempts = 60
log_file = "server.log"

# Command run once the server is ready; the server is stopped afterwards
# followup = ["python", "run_eval.py"]

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"
"#
}
