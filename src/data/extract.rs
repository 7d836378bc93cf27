use std::path::Path;

use crate::mat::{MatFile, MatValue};

// ---------------------------------------------------------------------------
// Array Extractor
// ---------------------------------------------------------------------------

/// Extract the named field of a container as a flat `f64` sequence.
///
/// Never fails toward the caller: an unreadable file, a decode error or a
/// missing field all come back as an empty sequence, with a diagnostic in
/// the log. Nested cell arrays are flattened depth-first in order;
/// non-numeric leaves are dropped silently.
pub fn load_field(path: &Path, key: &str) -> Vec<f64> {
    let mat = match MatFile::open(path) {
        Ok(mat) => mat,
        Err(e) => {
            log::error!("failed to load '{key}' from {}: {e}", path.display());
            return Vec::new();
        }
    };
    match mat.get(key) {
        Some(value) => {
            let mut out = Vec::new();
            flatten_into(value, &mut out);
            out
        }
        None => {
            log::warn!("field '{key}' not present in {}", path.display());
            Vec::new()
        }
    }
}

/// Depth-first traversal of the value tree, appending numeric leaves.
fn flatten_into(value: &MatValue, out: &mut Vec<f64>) {
    match value {
        MatValue::Numeric(values) => out.extend_from_slice(values),
        MatValue::Cell(entries) => {
            for entry in entries {
                flatten_into(entry, out);
            }
        }
        MatValue::Unsupported(_) => {}
    }
}
