//! Logging configuration using tracing.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with the specified level.
///
/// `RUST_LOG` takes precedence over the configured level. An unrecognized
/// level falls back to `trace` so misconfiguration never hides output.
pub fn init(level: &str) -> anyhow::Result<()> {
    let (filter, bad_level) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, None),
        Err(_) => match EnvFilter::try_new(level) {
            Ok(filter) => (filter, None),
            Err(_) => (EnvFilter::new("trace"), Some(level.to_string())),
        },
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(level) = bad_level {
        tracing::warn!("Unknown log level '{}', defaulting to trace", level);
    }

    Ok(())
}
