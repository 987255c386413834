//! Core dataset model for the assembled annotation dataset.
//!
//! This module defines the in-memory representation that the pipeline
//! accumulates into: image records, category records, annotation records,
//! plus the provenance side-channel. The COCO writer renders this model
//! out to the final document.

use serde::{Deserialize, Serialize};

use super::bbox::BBoxXYXY;
use super::ids::{AnnotationId, CategoryId, ImageId};
use super::space::Pixel;

/// A complete dataset assembled by one pipeline run.
///
/// All entities are owned exclusively by this structure for the duration
/// of one run; a full rebuild replaces the whole dataset.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Metadata about the dataset (description, contributor, etc.)
    #[serde(default)]
    pub info: DatasetInfo,

    /// All images in the dataset. Images that produced zero annotations
    /// are still present, per the COCO convention.
    pub images: Vec<Image>,

    /// All category definitions, in first-seen order.
    pub categories: Vec<Category>,

    /// All annotations (segmentation polygons with labels).
    pub annotations: Vec<Annotation>,
}

/// Metadata about the dataset.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional year the dataset was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,

    /// Optional contributor name or organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor: Option<String>,

    /// Optional date the dataset was created (ISO 8601 or similar).
    ///
    /// Injected by the caller rather than sampled internally, so that a
    /// re-run on identical inputs can produce an identical document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
}

/// An image record in the dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Image {
    /// Unique identifier for this image, assigned in enumeration order
    /// starting at 1.
    pub id: ImageId,

    /// Filename of the image (basename, not the full path).
    pub file_name: String,

    /// Width of the image in pixels.
    pub width: u32,

    /// Height of the image in pixels.
    pub height: u32,
}

impl Image {
    /// Creates a new image record with the given properties.
    pub fn new(
        id: impl Into<ImageId>,
        file_name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }
}

/// A category (building-type label) in the dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier for this category, assigned in first-seen order
    /// starting at 1.
    pub id: CategoryId,

    /// Normalized name of the category (trimmed, case-folded).
    pub name: String,

    /// Optional supercategory for hierarchical taxonomies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercategory: Option<String>,
}

impl Category {
    /// Creates a new category with the given properties.
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: None,
        }
    }

    /// Creates a new category with a supercategory.
    pub fn with_supercategory(
        id: impl Into<CategoryId>,
        name: impl Into<String>,
        supercategory: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: Some(supercategory.into()),
        }
    }
}

/// Where an annotation came from: the source table row and source image.
///
/// Provenance feeds the mapping side-channel only; it is not rendered
/// into the primary COCO document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Zero-based row index in the vector source table.
    pub source_row: u64,

    /// Filename of the raster the annotation was clipped against.
    pub source_image: String,
}

/// An annotation record: one clipped building footprint in one image.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique identifier for this annotation, globally unique across the
    /// whole dataset.
    pub id: AnnotationId,

    /// ID of the image this annotation belongs to.
    pub image_id: ImageId,

    /// ID of the category (building type) for this annotation.
    pub category_id: CategoryId,

    /// Segmentation rings in pixel space, each flattened as
    /// `[x0, y0, x1, y1, ...]` without a repeated closing vertex.
    ///
    /// A source polygon split by the clip boundary contributes one ring
    /// per fragment (and per hole), so this is always non-empty for a
    /// built annotation but may hold more than one ring.
    pub segmentation: Vec<Vec<f64>>,

    /// Tight axis-aligned bounding box over all segmentation vertices.
    pub bbox: BBoxXYXY<Pixel>,

    /// Polygon area in pixels squared, summed across fragments, holes
    /// subtracted.
    pub area: f64,

    /// Traceability back to the source row and image.
    pub provenance: Provenance,
}

/// One row of the human-inspectable mapping artifact written alongside
/// the COCO document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MappingRecord {
    pub annotation_id: AnnotationId,
    pub image_id: ImageId,
    pub image_file_name: String,
    /// Zero-based row index in the vector source table.
    pub source_row: u64,
    pub category_id: CategoryId,
    pub category_name: String,
    /// COCO-style bbox: `[x, y, width, height]`.
    pub bbox: [f64; 4],
    pub area: f64,
}

impl MappingRecord {
    /// Builds the mapping row for an annotation.
    pub fn for_annotation(annotation: &Annotation, category_name: &str) -> Self {
        let (x, y, w, h) = annotation.bbox.to_xywh();
        Self {
            annotation_id: annotation.id,
            image_id: annotation.image_id,
            image_file_name: annotation.provenance.source_image.clone(),
            source_row: annotation.provenance.source_row,
            category_id: annotation.category_id,
            category_name: category_name.to_string(),
            bbox: [x, y, w, h],
            area: annotation.area,
        }
    }
}
