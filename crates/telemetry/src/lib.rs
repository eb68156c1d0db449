//! Logging bootstrap.

use anyhow::Context;
use bookshelf_kernel::settings::{LogFormat, LogSettings};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once keeps the first subscriber.
pub fn init(settings: &LogSettings) -> anyhow::Result<()> {
    let filter = build_filter(settings)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    if installed.is_err() {
        tracing::debug!(target: "bookshelf-telemetry", "tracing subscriber already installed");
    }

    tracing::info!(
        target: "bookshelf-telemetry",
        level = %settings.level,
        format = ?settings.format,
        "logging initialized"
    );

    Ok(())
}

fn build_filter(settings: &LogSettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.level)
            .with_context(|| format!("invalid log level '{}'", settings.level)),
    }
}
