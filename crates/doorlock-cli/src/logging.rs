use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Directive used when neither `RUST_LOG` nor the config give a valid one.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Build the filter: `RUST_LOG` wins over `configured`, which wins over
/// [`DEFAULT_DIRECTIVE`]. Unparsable directives fall through to the next.
pub fn build_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| configured.and_then(|level| EnvFilter::try_new(level).ok()))
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Initialize logging with an optional level from config.
pub fn init_logging(log_level: Option<&str>) {
    FmtSubscriber::builder()
        .with_target(true)
        .with_env_filter(build_filter(log_level))
        .init();
}
