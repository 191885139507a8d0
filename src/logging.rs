//! Tracing subscriber setup for binaries and demos
//!
//! The library only emits `tracing` events. Call [`init_tracing`] once at
//! startup to print them, filtered by `RUST_LOG` (default `info`).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global fmt subscriber filtered by `RUST_LOG`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}
