//! Tracing setup for applications embedding the toolkit.
//!
//! The library crates only emit `tracing` events. Binaries and examples call
//! [`init_tracing`] once to print them.

#![warn(missing_docs, clippy::pedantic)]

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a formatted subscriber filtered by `RUST_LOG`, falling back to
/// [`DEFAULT_FILTER`].
///
/// Returns `false` when a global subscriber was already installed.
///
/// # Errors
///
/// Returns an error if the fallback directive cannot be parsed.
pub fn init_tracing() -> anyhow::Result<bool> {
    init_tracing_with(DEFAULT_FILTER)
}

/// Same as [`init_tracing`] with a caller-chosen fallback directive, e.g.
/// `"toolkit_mcp=debug,info"`.
///
/// # Errors
///
/// Returns an error if `fallback` is not a valid filter directive.
pub fn init_tracing_with(fallback: &str) -> anyhow::Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(fallback)
            .with_context(|| format!("invalid tracing filter `{fallback}`"))?,
    };

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok())
}
