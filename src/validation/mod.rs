//! Dataset validation.
//!
//! Validates a finished dataset before it is written (or any dataset
//! loaded from disk), checking for:
//! - Structural integrity (unique IDs, valid references)
//! - Data quality (non-empty names, valid dimensions)
//! - Geometric validity (segmentations inside the frame, bounding boxes
//!   that tightly bound them, areas above the configured minimum)

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{HashMap, HashSet};

use crate::dataset::{Annotation, AnnotationId, CategoryId, Dataset, ImageId};

/// Tolerance for bounds and tightness comparisons. Pixel coordinates are
/// produced by clamping, so exact equality is expected; the epsilon only
/// absorbs serialization round-trips.
const COORD_TOLERANCE: f64 = 1e-6;

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
    /// When set, annotations with area below this value are errors.
    pub min_area: Option<f64>,
}

/// Validates a dataset and returns a report of all issues found.
///
/// This function performs comprehensive validation including:
/// - Checking for duplicate IDs (images, annotations, categories)
/// - Verifying all references are valid (image_id, category_id in annotations)
/// - Validating image dimensions are positive
/// - Validating category and file names are non-empty
/// - Checking segmentation rings are well-formed and inside image bounds
/// - Checking bounding boxes are finite, ordered, in bounds, and tight
/// - Checking areas are positive and at least the configured minimum
pub fn validate_dataset(dataset: &Dataset, opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    let image_ids: HashSet<ImageId> = dataset.images.iter().map(|i| i.id).collect();
    let category_ids: HashSet<CategoryId> = dataset.categories.iter().map(|c| c.id).collect();

    validate_images(dataset, &mut report);
    validate_categories(dataset, &mut report);
    validate_annotations(dataset, &image_ids, &category_ids, opts, &mut report);

    if opts.strict {
        for issue in &mut report.issues {
            issue.severity = Severity::Error;
        }
    }

    report
}

/// Validates all images in the dataset.
fn validate_images(dataset: &Dataset, report: &mut ValidationReport) {
    let mut seen_ids: HashMap<ImageId, usize> = HashMap::new();

    for (idx, image) in dataset.images.iter().enumerate() {
        let id = image.id.as_u64();

        if let Some(first_idx) = seen_ids.get(&image.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateImageId,
                format!(
                    "Duplicate image ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Image { id },
            ));
        } else {
            seen_ids.insert(image.id, idx);
        }

        if image.width == 0 || image.height == 0 {
            report.add(ValidationIssue::error(
                IssueCode::InvalidImageDimensions,
                format!(
                    "Invalid dimensions {}x{} (must be positive)",
                    image.width, image.height
                ),
                IssueContext::Image { id },
            ));
        }

        if image.file_name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyFileName,
                "Empty filename",
                IssueContext::Image { id },
            ));
        }
    }
}

/// Validates all categories in the dataset.
fn validate_categories(dataset: &Dataset, report: &mut ValidationReport) {
    let mut seen_ids: HashMap<CategoryId, usize> = HashMap::new();
    let mut seen_names: HashMap<&str, CategoryId> = HashMap::new();

    for (idx, category) in dataset.categories.iter().enumerate() {
        let id = category.id.as_u64();

        if let Some(first_idx) = seen_ids.get(&category.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateCategoryId,
                format!(
                    "Duplicate category ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Category { id },
            ));
        } else {
            seen_ids.insert(category.id, idx);
        }

        if category.name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyCategoryName,
                "Empty category name",
                IssueContext::Category { id },
            ));
        } else if let Some(first_id) = seen_names.get(category.name.as_str()) {
            // Two ids for one normalized name breaks the name->id
            // bijection the registry guarantees.
            report.add(ValidationIssue::error(
                IssueCode::DuplicateCategoryName,
                format!(
                    "Duplicate category name '{}' (also used by category {})",
                    category.name, first_id
                ),
                IssueContext::Category { id },
            ));
        } else {
            seen_names.insert(&category.name, category.id);
        }
    }
}

/// Validates all annotations in the dataset.
fn validate_annotations(
    dataset: &Dataset,
    image_ids: &HashSet<ImageId>,
    category_ids: &HashSet<CategoryId>,
    opts: &ValidateOptions,
    report: &mut ValidationReport,
) {
    let mut seen_ids: HashMap<AnnotationId, usize> = HashMap::new();

    let image_dims: HashMap<ImageId, (u32, u32)> = dataset
        .images
        .iter()
        .map(|i| (i.id, (i.width, i.height)))
        .collect();

    for (idx, annotation) in dataset.annotations.iter().enumerate() {
        let id = annotation.id.as_u64();

        if let Some(first_idx) = seen_ids.get(&annotation.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateAnnotationId,
                format!(
                    "Duplicate annotation ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Annotation { id },
            ));
        } else {
            seen_ids.insert(annotation.id, idx);
        }

        if !image_ids.contains(&annotation.image_id) {
            report.add(ValidationIssue::error(
                IssueCode::MissingImageRef,
                format!("References non-existent image {}", annotation.image_id),
                IssueContext::Annotation { id },
            ));
        }

        if !category_ids.contains(&annotation.category_id) {
            report.add(ValidationIssue::error(
                IssueCode::MissingCategoryRef,
                format!(
                    "References non-existent category {}",
                    annotation.category_id
                ),
                IssueContext::Annotation { id },
            ));
        }

        validate_segmentation(annotation, &image_dims, report);
        validate_bbox(annotation, &image_dims, report);
        validate_area(annotation, opts, report);
    }
}

/// Checks each segmentation ring is well-formed and inside the frame.
fn validate_segmentation(
    annotation: &Annotation,
    image_dims: &HashMap<ImageId, (u32, u32)>,
    report: &mut ValidationReport,
) {
    let id = annotation.id.as_u64();

    if annotation.segmentation.is_empty() {
        report.add(ValidationIssue::error(
            IssueCode::DegenerateRing,
            "Annotation has no segmentation rings",
            IssueContext::Annotation { id },
        ));
        return;
    }

    for (ring_idx, ring) in annotation.segmentation.iter().enumerate() {
        if ring.len() % 2 != 0 || ring.len() < 6 {
            report.add(ValidationIssue::error(
                IssueCode::DegenerateRing,
                format!(
                    "Ring {} has {} value(s); need an even count of at least 6",
                    ring_idx,
                    ring.len()
                ),
                IssueContext::Annotation { id },
            ));
            continue;
        }
        if ring.iter().any(|v| !v.is_finite()) {
            report.add(ValidationIssue::error(
                IssueCode::DegenerateRing,
                format!("Ring {} contains non-finite coordinates", ring_idx),
                IssueContext::Annotation { id },
            ));
            continue;
        }

        if let Some((width, height)) = image_dims.get(&annotation.image_id) {
            let (w, h) = (f64::from(*width), f64::from(*height));
            let out_of_bounds = ring.chunks_exact(2).any(|pair| {
                pair[0] < -COORD_TOLERANCE
                    || pair[0] > w + COORD_TOLERANCE
                    || pair[1] < -COORD_TOLERANCE
                    || pair[1] > h + COORD_TOLERANCE
            });
            if out_of_bounds {
                report.add(ValidationIssue::error(
                    IssueCode::SegmentationOutOfBounds,
                    format!(
                        "Ring {} has vertices outside image bounds (0, 0, {}, {})",
                        ring_idx, width, height
                    ),
                    IssueContext::Annotation { id },
                ));
            }
        }
    }
}

/// Checks the bounding box is finite, ordered, inside the frame, and the
/// tight bound of the segmentation vertices.
fn validate_bbox(
    annotation: &Annotation,
    image_dims: &HashMap<ImageId, (u32, u32)>,
    report: &mut ValidationReport,
) {
    let id = annotation.id.as_u64();
    let bbox = &annotation.bbox;

    if !bbox.is_finite() {
        report.add(ValidationIssue::error(
            IssueCode::BBoxNotFinite,
            format!(
                "Non-finite coordinates ({}, {}, {}, {})",
                bbox.xmin(),
                bbox.ymin(),
                bbox.xmax(),
                bbox.ymax()
            ),
            IssueContext::Annotation { id },
        ));
        return;
    }

    if !bbox.is_ordered() {
        report.add(ValidationIssue::error(
            IssueCode::InvalidBBoxOrdering,
            format!(
                "Invalid ordering: min ({}, {}) should be <= max ({}, {})",
                bbox.xmin(),
                bbox.ymin(),
                bbox.xmax(),
                bbox.ymax()
            ),
            IssueContext::Annotation { id },
        ));
        return;
    }

    if let Some((width, height)) = image_dims.get(&annotation.image_id) {
        let (w, h) = (f64::from(*width), f64::from(*height));
        if bbox.xmin() < -COORD_TOLERANCE
            || bbox.ymin() < -COORD_TOLERANCE
            || bbox.xmax() > w + COORD_TOLERANCE
            || bbox.ymax() > h + COORD_TOLERANCE
        {
            report.add(ValidationIssue::error(
                IssueCode::BBoxOutOfBounds,
                format!(
                    "Bounding box ({:.1}, {:.1}, {:.1}, {:.1}) extends outside image bounds (0, 0, {}, {})",
                    bbox.xmin(), bbox.ymin(), bbox.xmax(), bbox.ymax(), width, height
                ),
                IssueContext::Annotation { id },
            ));
        }
    }

    // Tightness: the box must equal the bounds of the segmentation
    // vertices. Skipped if any ring is malformed; that is already an
    // error above.
    let mut bounds: Option<(f64, f64, f64, f64)> = None;
    for ring in &annotation.segmentation {
        if ring.len() % 2 != 0 || ring.iter().any(|v| !v.is_finite()) {
            return;
        }
        for pair in ring.chunks_exact(2) {
            bounds = Some(match bounds {
                None => (pair[0], pair[1], pair[0], pair[1]),
                Some((xmin, ymin, xmax, ymax)) => (
                    xmin.min(pair[0]),
                    ymin.min(pair[1]),
                    xmax.max(pair[0]),
                    ymax.max(pair[1]),
                ),
            });
        }
    }

    if let Some((xmin, ymin, xmax, ymax)) = bounds {
        let tight = (bbox.xmin() - xmin).abs() <= COORD_TOLERANCE
            && (bbox.ymin() - ymin).abs() <= COORD_TOLERANCE
            && (bbox.xmax() - xmax).abs() <= COORD_TOLERANCE
            && (bbox.ymax() - ymax).abs() <= COORD_TOLERANCE;
        if !tight {
            report.add(ValidationIssue::error(
                IssueCode::BBoxNotTight,
                format!(
                    "Bounding box ({:.1}, {:.1}, {:.1}, {:.1}) is not the tight bound of the segmentation ({:.1}, {:.1}, {:.1}, {:.1})",
                    bbox.xmin(), bbox.ymin(), bbox.xmax(), bbox.ymax(), xmin, ymin, xmax, ymax
                ),
                IssueContext::Annotation { id },
            ));
        }
    }
}

/// Checks the annotation's area is positive and above the minimum.
fn validate_area(annotation: &Annotation, opts: &ValidateOptions, report: &mut ValidationReport) {
    let id = annotation.id.as_u64();

    if !annotation.area.is_finite() || annotation.area <= 0.0 {
        report.add(ValidationIssue::error(
            IssueCode::NonPositiveArea,
            format!("Zero, negative, or non-finite area: {}", annotation.area),
            IssueContext::Annotation { id },
        ));
        return;
    }

    if let Some(min_area) = opts.min_area {
        // Area exactly at the minimum is acceptable.
        if annotation.area < min_area {
            report.add(ValidationIssue::error(
                IssueCode::BelowMinArea,
                format!(
                    "Area {:.2} is below the configured minimum {:.2}",
                    annotation.area, min_area
                ),
                IssueContext::Annotation { id },
            ));
        }
    }
}
