//! Writer for the provenance mapping artifact.
//!
//! Alongside the primary COCO document the pipeline emits a flat JSON
//! array of [`MappingRecord`]s linking every annotation back to its source
//! CSV row and source image. The primary document stays free of
//! provenance; this file is the audit side-channel.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::model::MappingRecord;
use crate::error::Geo2CocoError;

/// Derives the mapping path from the COCO output path:
/// `dataset.json` -> `dataset_mapping.json`.
pub fn mapping_path_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    output.with_file_name(format!("{stem}_mapping.json"))
}

/// Writes the mapping records to a JSON file, sorted by annotation ID for
/// deterministic output.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_mapping_json(path: &Path, records: &[MappingRecord]) -> Result<(), Geo2CocoError> {
    let mut sorted: Vec<&MappingRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.annotation_id);

    let file = File::create(path).map_err(Geo2CocoError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &sorted).map_err(|source| {
        Geo2CocoError::MappingJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}
