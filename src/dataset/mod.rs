//! Dataset model for geo2coco.
//!
//! This module defines the in-memory representation the pipeline
//! assembles into, plus the writers for the COCO document and the
//! provenance mapping artifact.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: Use newtypes and marker types to prevent common
//!    errors at compile time (e.g., mixing pixel and world coordinates,
//!    or image and annotation ids).
//!
//! 2. **Permissive Construction**: model types allow "invalid" data to be
//!    represented (e.g., an out-of-bounds bbox), so that validation can
//!    report issues rather than panic during assembly.

mod bbox;
mod coord;
mod ids;
pub mod io_coco_json;
pub mod io_mapping_json;
mod model;
mod space;

// Re-export core types for convenient access
pub use bbox::BBoxXYXY;
pub use coord::Coord;
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{
    Annotation, Category, Dataset, DatasetInfo, Image, MappingRecord, Provenance,
};
pub use space::{Pixel, World};
