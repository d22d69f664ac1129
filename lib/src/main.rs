//! Trains the Iris random forest, saves it as `model.pkl` and prints one prediction.
//!
//! Diagnostics go to stderr and are controlled with `RUST_LOG` (default `warn`).

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    iris_forest::run().context("training pipeline failed")?;
    Ok(())
}
