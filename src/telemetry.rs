// ABOUTME: Logging setup — a tracing subscriber with an env filter writing to stderr.
// ABOUTME: RUST_LOG wins when set; otherwise the debug flag picks the level.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// The filter used when RUST_LOG is unset.
pub fn default_filter(debug: bool) -> &'static str {
    if debug { "toolhost=debug,info" } else { "info" }
}

/// Install the global subscriber. Fails if one is already installed.
///
/// Hosts pass `Config::debug`, usually through [`Config::init_tracing`].
///
/// [`Config::init_tracing`]: crate::config::Config::init_tracing
pub fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_file(debug)
                .with_line_number(debug),
        )
        .try_init()?;
    Ok(())
}
