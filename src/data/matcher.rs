use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// File-Set Matcher
// ---------------------------------------------------------------------------

/// File names with the container extension present in all three folders.
///
/// A missing or unreadable folder is a configuration error and propagates;
/// the run must not start against a broken layout. The `BTreeSet` gives the
/// assembler its deterministic iteration order.
pub fn matched_files(
    rr_folder: &Path,
    sat_folder: &Path,
    labels_folder: &Path,
    extension: &str,
) -> Result<BTreeSet<String>> {
    let rr = container_names(rr_folder, extension)?;
    let sat = container_names(sat_folder, extension)?;
    let labels = container_names(labels_folder, extension)?;

    Ok(rr
        .intersection(&sat)
        .filter(|name| labels.contains(*name))
        .cloned()
        .collect())
}

fn container_names(folder: &Path, extension: &str) -> Result<BTreeSet<String>> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("listing recording folder {}", folder.display()))?;

    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading entry in {}", folder.display()))?;
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(extension) {
                names.insert(name.to_string());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn intersects_three_folders() {
        let root = tempfile::tempdir().unwrap();
        let (rr, sat, labels) = (
            root.path().join("RR"),
            root.path().join("SAT"),
            root.path().join("LABELS"),
        );
        for d in [&rr, &sat, &labels] {
            fs::create_dir(d).unwrap();
        }
        for name in ["a.mat", "b.mat", "c.mat"] {
            touch(&rr, name);
        }
        for name in ["b.mat", "c.mat", "d.mat"] {
            touch(&sat, name);
        }
        for name in ["c.mat", "b.mat"] {
            touch(&labels, name);
        }
        touch(&rr, "notes.txt");

        let matched = matched_files(&rr, &sat, &labels, ".mat").unwrap();
        assert_eq!(
            matched.into_iter().collect::<Vec<_>>(),
            vec!["b.mat".to_string(), "c.mat".to_string()]
        );
    }

    #[test]
    fn extension_filter_applies_everywhere() {
        let root = tempfile::tempdir().unwrap();
        let (rr, sat, labels) = (
            root.path().join("RR"),
            root.path().join("SAT"),
            root.path().join("LABELS"),
        );
        for d in [&rr, &sat, &labels] {
            fs::create_dir(d).unwrap();
        }
        touch(&rr, "a.csv");
        touch(&sat, "a.csv");
        touch(&labels, "a.csv");

        let matched = matched_files(&rr, &sat, &labels, ".mat").unwrap();
        assert!(matched.is_empty());
    }

    #[test]
    fn missing_folder_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let rr = root.path().join("RR");
        fs::create_dir(&rr).unwrap();
        let err = matched_files(&rr, &root.path().join("SAT"), &rr, ".mat");
        assert!(err.is_err());
    }
}
