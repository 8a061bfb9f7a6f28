//! Tracing setup
//!
//! Progress of runtime calls is logged to stderr. User-facing confirmations
//! are printed separately by the command layer.

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()
        .context("failed to initialise logging")?;

    Ok(())
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "dmctl=debug,warn"
    } else {
        "dmctl=warn"
    }
}
