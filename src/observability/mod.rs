//! Structured logging setup.
//!
//! The provider module logs through the `tracing` ecosystem. Hosts that embed
//! the module can install their own subscriber; [`init_logging`] is for
//! standalone use and quietly steps aside when a subscriber already exists.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// JSON output for log collectors.
    Json,
}

impl LogFormat {
    /// Read the format from `BWSP_LOG_FORMAT` (`json` selects JSON output).
    pub fn from_env() -> Self {
        match std::env::var("BWSP_LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to `debug` when `verbose` is
/// set and `info` otherwise.
pub fn init_logging(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", default_level);
    }

    let builder = FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env());
    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };
    if result.is_err() {
        // Subscriber already set elsewhere (e.g. integration tests); ignore.
    }
}
