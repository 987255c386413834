use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for geo2coco operations.
///
/// Per-candidate failures (`MalformedGeometry`, `Projection`) and
/// per-image failures (`UnreadableImage`) are caught at the assembler
/// boundary and counted; only run-level failures propagate out of the
/// pipeline.
#[derive(Debug, Error)]
pub enum Geo2CocoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unreadable image {path}: {reason}")]
    UnreadableImage { path: PathBuf, reason: String },

    #[error("Malformed geometry in row {row}: {reason}")]
    MalformedGeometry { row: u64, reason: String },

    #[error("Projection failed: {0}")]
    Projection(String),

    #[error("Unsupported coordinate reference system EPSG:{0}")]
    UnsupportedCrs(u32),

    #[error("Degenerate affine transform for {path}: determinant is zero")]
    DegenerateTransform { path: PathBuf },

    #[error("Failed to parse world file {path}: {reason}")]
    WorldFileParse { path: PathBuf, reason: String },

    #[error("Failed to parse vector CSV {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Vector CSV {path} is missing required column '{column}'")]
    CsvMissingColumn { path: PathBuf, column: String },

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write COCO JSON to {path}: {source}")]
    CocoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write mapping JSON to {path}: {source}")]
    MappingJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No images found under {path}")]
    NoImagesFound { path: PathBuf },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}
