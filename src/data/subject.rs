use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::data::extract::load_field;

// ---------------------------------------------------------------------------
// Per-subject processing
// ---------------------------------------------------------------------------

/// Physiologically plausible heart-rate band; values outside it are
/// sensor artifacts and get clipped to the nearest bound.
const HR_MIN_BPM: f64 = 40.0;
const HR_MAX_BPM: f64 = 180.0;

/// One retained sample: derived heart rate, oxygen saturation, apnea label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub heart_rate: f64,
    pub spo2: f64,
    pub apnea: f64,
}

/// All samples of one subject after truncation and heart-rate conversion.
#[derive(Debug, Clone, Default)]
pub struct SubjectTable {
    pub rows: Vec<SampleRow>,
}

impl SubjectTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Convert one RR interval (milliseconds) to beats per minute, clipped to
/// the plausible band. An RR of zero divides to `+inf` and clips to the
/// ceiling; this must never panic.
pub fn heart_rate_from_rr(rr_ms: f64) -> f64 {
    (60_000.0 / rr_ms).clamp(HR_MIN_BPM, HR_MAX_BPM)
}

/// Build the record table for one matched file, or `None` when any of the
/// three channels comes back empty.
///
/// The three channels are truncated to the minimum shared length: the
/// recording subsystems drift by a few samples per session, which is a
/// property of the instrumentation rather than a data error.
pub fn process_subject(file: &str, config: &PipelineConfig) -> Option<SubjectTable> {
    let rr = load_field(&config.rr_folder.join(file), &config.rr_key);
    let sat = load_field(&config.sat_folder.join(file), &config.sat_key);
    let labels = load_field(&config.labels_folder.join(file), &config.label_key);

    log::info!(
        "{file}: RR={}, SAT={}, LABELS={}",
        rr.len(),
        sat.len(),
        labels.len()
    );

    if rr.is_empty() || sat.is_empty() || labels.is_empty() {
        log::warn!(
            "skipping {file}: empty channel (RR={}, SAT={}, LABELS={})",
            rr.len(),
            sat.len(),
            labels.len()
        );
        return None;
    }

    let len = rr.len().min(sat.len()).min(labels.len());
    let rows = (0..len)
        .map(|i| SampleRow {
            heart_rate: heart_rate_from_rr(rr[i]),
            spo2: sat[i],
            apnea: labels[i],
        })
        .collect();

    Some(SubjectTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat::{write_file, MatValue};
    use std::path::Path;

    fn config_in(root: &Path) -> PipelineConfig {
        let mut cfg = PipelineConfig::default();
        cfg.rr_folder = root.join("RR");
        cfg.sat_folder = root.join("SAT");
        cfg.labels_folder = root.join("LABELS");
        for d in [&cfg.rr_folder, &cfg.sat_folder, &cfg.labels_folder] {
            std::fs::create_dir_all(d).unwrap();
        }
        cfg
    }

    fn write_subject(cfg: &PipelineConfig, file: &str, rr: &[f64], sat: &[f64], labels: &[f64]) {
        write_file(
            &cfg.rr_folder.join(file),
            &[(cfg.rr_key.as_str(), &MatValue::Numeric(rr.to_vec()))],
        )
        .unwrap();
        write_file(
            &cfg.sat_folder.join(file),
            &[(cfg.sat_key.as_str(), &MatValue::Numeric(sat.to_vec()))],
        )
        .unwrap();
        write_file(
            &cfg.labels_folder.join(file),
            &[(cfg.label_key.as_str(), &MatValue::Numeric(labels.to_vec()))],
        )
        .unwrap();
    }

    #[test]
    fn converts_rr_to_clipped_bpm() {
        assert_eq!(heart_rate_from_rr(500.0), 120.0);
        assert_eq!(heart_rate_from_rr(1000.0), 60.0);
        // 240 bpm clips to the ceiling, 30 bpm to the floor.
        assert_eq!(heart_rate_from_rr(250.0), 180.0);
        assert_eq!(heart_rate_from_rr(2000.0), 40.0);
    }

    #[test]
    fn zero_rr_maps_to_ceiling_without_panicking() {
        assert_eq!(heart_rate_from_rr(0.0), 180.0);
    }

    #[test]
    fn truncates_to_minimum_shared_length() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        write_subject(
            &cfg,
            "s1.mat",
            &[600.0, 600.0, 600.0, 600.0, 600.0],
            &[98.0, 97.0, 96.0],
            &[0.0, 1.0, 0.0, 1.0],
        );

        let table = process_subject("s1.mat", &cfg).unwrap();
        assert_eq!(table.len(), 3);
        // All channels keep their first samples.
        assert_eq!(table.rows[0], SampleRow { heart_rate: 100.0, spo2: 98.0, apnea: 0.0 });
        assert_eq!(table.rows[2], SampleRow { heart_rate: 100.0, spo2: 96.0, apnea: 0.0 });
    }

    #[test]
    fn empty_channel_signals_skip() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        write_subject(&cfg, "s1.mat", &[600.0, 700.0], &[], &[0.0, 1.0]);
        assert!(process_subject("s1.mat", &cfg).is_none());
    }

    #[test]
    fn missing_container_signals_skip() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        write_subject(&cfg, "s1.mat", &[600.0], &[98.0], &[0.0]);
        std::fs::remove_file(cfg.sat_folder.join("s1.mat")).unwrap();
        assert!(process_subject("s1.mat", &cfg).is_none());
    }
}
