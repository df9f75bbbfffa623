use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,doc_insights=debug";

/// Initialize structured logging.
///
/// Configures:
/// - `tracing-subscriber::fmt` with the compact formatter.
/// - `EnvFilter` for dynamic log levels (`RUST_LOG`).
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact();

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}
