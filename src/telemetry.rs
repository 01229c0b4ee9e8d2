//! Telemetry and observability setup
//!
//! Configures structured logging with tracing and tracing-subscriber.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize tracing subscriber for structured logging
///
/// This can only be called once per process. Subsequent calls are silently ignored.
///
/// Reads log level from RUST_LOG environment variable, defaulting to the
/// level specified in config (or "info" if not set). Logs go to stderr so the
/// probe summary on stdout stays clean.
///
/// # Examples
///
/// ```no_run
/// judgeprobe::telemetry::init("info");
/// tracing::info!("Probe started");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_directive(default_level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    });
}

fn filter_directive(default_level: &str) -> String {
    format!("judgeprobe={},reqwest=warn", default_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_scopes_crate() {
        assert_eq!(filter_directive("debug"), "judgeprobe=debug,reqwest=warn");
    }

    #[test]
    fn test_filter_directive_parses() {
        assert!(EnvFilter::try_new(filter_directive("info")).is_ok());
    }
}
