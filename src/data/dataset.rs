use std::path::Path;

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::data::matcher::matched_files;
use crate::data::subject::{process_subject, SampleRow};

// ---------------------------------------------------------------------------
// Dataset Assembler
// ---------------------------------------------------------------------------

/// The final flat dataset: subject tables concatenated in sorted-identifier
/// order, no subject boundaries retained.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub rows: Vec<SampleRow>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of one assembly run.
#[derive(Debug)]
pub struct BuildOutcome {
    pub dataset: Dataset,
    /// Subjects that contributed rows.
    pub processed: usize,
    /// Subjects skipped over an empty channel.
    pub skipped: usize,
}

/// Run the whole pipeline: match, process each subject, concatenate.
///
/// A bad subject never aborts the run; it is logged and skipped. Failures
/// are static data defects, so nothing is retried. Only a missing source
/// folder propagates as an error.
pub fn build_dataset(config: &PipelineConfig) -> Result<BuildOutcome> {
    let matched = matched_files(
        &config.rr_folder,
        &config.sat_folder,
        &config.labels_folder,
        &config.extension,
    )?;
    log::info!("{} matched recording triplets", matched.len());

    let mut dataset = Dataset::default();
    let mut processed = 0;
    let mut skipped = 0;
    for file in &matched {
        match process_subject(file, config) {
            Some(table) => {
                log::info!("processed {file}: {} rows", table.len());
                dataset.rows.extend(table.rows);
                processed += 1;
            }
            None => skipped += 1,
        }
    }

    Ok(BuildOutcome { dataset, processed, skipped })
}

// ---------------------------------------------------------------------------
// CSV output
// ---------------------------------------------------------------------------

/// Write the dataset with header `heart_rate,spo2,apnea`.
pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating output file {}", path.display()))?;
    for row in &dataset.rows {
        writer.serialize(row).context("writing dataset row")?;
    }
    writer.flush().context("flushing output file")?;
    Ok(())
}

/// Read a previously written dataset back; used for verification.
pub fn read_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening dataset file {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.context("reading dataset row")?);
    }
    Ok(Dataset { rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_round_trip_preserves_rows() {
        let dataset = Dataset {
            rows: vec![
                SampleRow { heart_rate: 120.0, spo2: 98.0, apnea: 0.0 },
                SampleRow { heart_rate: 60.5, spo2: 97.25, apnea: 1.0 },
            ],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&dataset, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("heart_rate,spo2,apnea"));

        let back = read_csv(&path).unwrap();
        assert_eq!(back.rows, dataset.rows);
    }
}
