use std::path::PathBuf;

use anyhow::Result;

use oxi_dataset::config::PipelineConfig;
use oxi_dataset::data::dataset::{build_dataset, write_csv};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::from_file(&PathBuf::from(path))?,
        None => PipelineConfig::default(),
    };

    let outcome = build_dataset(&config)?;
    if outcome.dataset.is_empty() {
        log::warn!(
            "no valid data found ({} subjects skipped); nothing written",
            outcome.skipped
        );
        return Ok(());
    }

    write_csv(&outcome.dataset, &config.output_path)?;
    log::info!(
        "saved {} rows from {} subjects ({} skipped) to {}",
        outcome.dataset.len(),
        outcome.processed,
        outcome.skipped,
        config.output_path.display()
    );
    Ok(())
}
