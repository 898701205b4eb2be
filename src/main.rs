use std::env;

use anyhow::{Context, Result};
use salesprep::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();

    let cfg = PipelineConfig::default();
    let summary = run(&cfg).with_context(|| {
        format!(
            "Failed to preprocess data from {}",
            cfg.data_dir.display()
        )
    })?;

    info!(rows = summary.rows, columns = summary.columns, "Done");
    println!(
        "Preprocessing complete. File saved to: {}",
        summary.output_path.display()
    );
    Ok(())
}

// ================================================================================================
// Tracing Configuration
// ================================================================================================

fn init_tracing() {
    // Detect if running in container
    let in_container =
        env::var("CONTAINER").is_ok() || std::path::Path::new("/.dockerenv").exists();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if in_container {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_current_span(true)
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
            .init();
    }
}
