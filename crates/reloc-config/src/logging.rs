//! Centralized logging initialization with environment variable support

use crate::{LogFormat, RelocConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Environment variables (in priority order):
/// - `RUST_LOG`: standard filter directives, take precedence over the config level
/// - `LOG_FORMAT`: override the configured format (`json`, `pretty`)
///
/// ```bash
/// RUST_LOG=reloc_services=debug LOG_FORMAT=json my-tool move libs/a/src/x.ts libs/b/src/x.ts
/// ```
///
/// Calling this more than once keeps the first subscriber.
pub fn initialize(config: &RelocConfig) {
    let log_level = config
        .logging
        .level
        .parse()
        .unwrap_or(tracing::Level::INFO);

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| match f.to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "human" => Some(LogFormat::Pretty),
            _ => None,
        })
        .unwrap_or(config.logging.format);

    // Logs always go to stderr; stdout belongs to the caller.
    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed, keeping it");
    }
}

/// Span wrapping one move invocation
///
/// ```rust
/// let span = reloc_config::logging::move_span("libs/a/src/x.ts", "libs/b/src/x.ts");
/// let _enter = span.enter();
/// tracing::info!("Moving file");
/// ```
pub fn move_span(source: &str, target: &str) -> tracing::Span {
    tracing::info_span!("move", source = %source, target = %target)
}
