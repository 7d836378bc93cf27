/// Data layer: extraction, matching, per-subject processing, assembly.
///
/// Pipeline:
/// ```text
///  RR/  SAT/  LABELS/   (matched .mat triplets)
///        │
///        ▼
///   ┌──────────┐
///   │ matcher   │  file names present in all three folders
///   └──────────┘
///        │  (sorted, per file)
///        ▼
///   ┌──────────┐
///   │ subject   │  extract ×3 → truncate → RR→bpm → SubjectTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ dataset   │  concatenate surviving tables → CSV
///   └──────────┘
/// ```
pub mod dataset;
pub mod extract;
pub mod matcher;
pub mod subject;
