//! Tracing subscriber setup for binaries and tests embedding the factory.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `debug` when `verbose` and `info` otherwise.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), TryInitError> {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .try_init()
}
