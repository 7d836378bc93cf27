use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// Folder layout, container field keys and output location for one run.
///
/// Defaults match the HuGCDN2014-OXI corpus layout. Any subset of fields
/// can be overridden from a JSON file passed as the first CLI argument.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Folder holding per-subject RR-interval containers.
    pub rr_folder: PathBuf,
    /// Folder holding per-subject SpO2 containers.
    pub sat_folder: PathBuf,
    /// Folder holding per-subject apnea label containers.
    pub labels_folder: PathBuf,

    /// Variable name of the RR-interval series inside its container.
    pub rr_key: String,
    /// Variable name of the SpO2 series.
    pub sat_key: String,
    /// Variable name of the label series.
    pub label_key: String,

    /// Container file extension used when matching the three folders.
    pub extension: String,
    /// Path of the CSV written at the end of a successful run.
    pub output_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let base = Path::new("HuGCDN2014-OXI");
        Self {
            rr_folder: base.join("RR"),
            sat_folder: base.join("SAT"),
            labels_folder: base.join("LABELS"),
            rr_key: "RR_notch_abs_pr_ada".to_string(),
            sat_key: "SAT".to_string(),
            label_key: "salida_man_1m".to_string(),
            extension: ".mat".to_string(),
            output_path: PathBuf::from("apnea_hr_spo2_dataset.csv"),
        }
    }
}

impl PipelineConfig {
    /// Load overrides from a JSON file on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}
