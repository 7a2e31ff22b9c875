use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::settings::LoggingSettings;

/// Install the global subscriber. Events go to stderr so the console keeps
/// stdout for replies. `RUST_LOG` overrides the configured filter, and
/// `verbose` raises this crate to debug.
pub fn init_logger(settings: &LoggingSettings, verbose: bool) {
    let fallback = if verbose {
        format!("chessbot=debug,{}", settings.filter)
    } else {
        settings.filter.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let base = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    // A subscriber installed earlier wins.
    let registry = tracing_subscriber::registry().with(filter);
    let _ = if settings.json {
        registry.with(base.json()).try_init()
    } else {
        registry.with(base.compact()).try_init()
    };
}
