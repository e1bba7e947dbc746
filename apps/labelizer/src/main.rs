mod barcode;
mod config;
mod errors;
mod layout;
mod orchestrator;
mod records;
mod spreadsheet;
mod state;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::orchestrator::Orchestrator;
use crate::state::RunState;

fn main() -> Result<()> {
    // Load configuration first; malformed values abort the run
    let config = Config::from_env()?;

    // Initialize structured logging (stderr, so stdout carries only the summary)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting labelizer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        input = %config.input_dir.display(),
        images = %config.image_dir.display(),
        output = %config.output_dir.display(),
        skip_cells = config.skip_cells,
        border = config.border,
        "Run configuration"
    );

    let orchestrator = Orchestrator::new(RunState::new(config)?);
    let summary = orchestrator
        .run()
        .context("failed to prepare the workspace")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
