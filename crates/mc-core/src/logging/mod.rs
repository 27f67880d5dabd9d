//! Structured logging for mc-core.
//!
//! stdout carries command payloads (JSON/Markdown reports); every log line
//! goes to stderr, either as console text or as JSON lines.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter for the workspace crates at `level`.
///
/// `RUST_LOG` is folded into [`LogConfig`] before this point, so the
/// filter only ever names the workspace targets.
pub fn default_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::new(format!(
        "mc_core={level},mc_config={level},mc_math={level}"
    ))
}

/// Install the global subscriber.
///
/// Call once at startup. A second call (e.g. from tests) is ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = default_filter(config.level);

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Human => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}

/// Unique id for one CLI invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}
