//! The dataset assembler: drives the geometry pipeline per image and
//! accumulates the final dataset.
//!
//! Each image advances Pending -> Loaded -> Scanned -> Finalized: frame
//! metadata is loaded, every candidate footprint is reprojected, clipped
//! and built into an annotation, then the image record is appended --
//! even when the image produced zero annotations. Failures are isolated:
//! a bad image or a bad candidate is counted and skipped, never aborting
//! sibling work. Only a validation failure aborts the run.

pub mod annotate;
pub mod registry;

use std::fmt;
use std::path::PathBuf;

use geo::BoundingRect;
use tracing::{debug, info, warn};

use crate::dataset::{
    BBoxXYXY, Dataset, DatasetInfo, Image, ImageId, MappingRecord, Provenance, World,
};
use crate::error::Geo2CocoError;
use crate::geometry::{clip_to_frame, reproject_polygon, transformer_between, DEFAULT_MIN_AREA};
use crate::raster::{enumerate_images, load_frame, RasterFrame};
use crate::validation::{validate_dataset, ValidateOptions};
use crate::vector::{read_footprints_csv, FootprintRow};

pub use annotate::build_annotation;
pub use registry::{AnnotationIdAllocator, CategoryRegistry};

/// Options recognized by the assembler.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// Minimum clipped polygon area in pixels squared. Results with area
    /// exactly equal to the threshold are retained.
    pub min_area: f64,
    /// EPSG code of the vector source geometry.
    pub vector_epsg: u32,
    /// Supercategory attached to every category record.
    pub supercategory: Option<String>,
    /// Dataset-level metadata to embed in the output document.
    pub info: DatasetInfo,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            min_area: DEFAULT_MIN_AREA,
            vector_epsg: crate::geometry::EPSG_WGS84,
            supercategory: Some("building".to_string()),
            info: DatasetInfo::default(),
        }
    }
}

/// Configuration for a full file-driven conversion run.
#[derive(Clone, Debug)]
pub struct ConvertConfig {
    pub images_dir: PathBuf,
    pub csv_path: PathBuf,
    /// EPSG code of the rasters (world files carry no CRS).
    pub image_epsg: u32,
    pub options: PipelineOptions,
}

/// Per-run skip counters, surfaced as a summary instead of individual
/// errors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub images_loaded: u64,
    pub images_unreadable: u64,
    pub rows_malformed: u64,
    pub projection_failures: u64,
    pub candidates_dropped: u64,
    pub annotations_built: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} image(s) loaded ({} unreadable), {} annotation(s) built, \
             {} malformed row(s), {} projection failure(s), {} candidate(s) dropped",
            self.images_loaded,
            self.images_unreadable,
            self.annotations_built,
            self.rows_malformed,
            self.projection_failures,
            self.candidates_dropped,
        )
    }
}

/// The assembled output of one run: the dataset, the provenance mapping
/// table, and the skip summary.
#[derive(Debug)]
pub struct AssembledDataset {
    pub dataset: Dataset,
    pub mapping: Vec<MappingRecord>,
    pub summary: RunSummary,
}

/// Runs the full file-driven pipeline: enumerate and load rasters, load
/// the vector source, assemble, validate.
///
/// # Errors
/// Fails on configuration-level problems (no images, unreadable CSV,
/// unsupported CRS) and on validation failure. Per-image and per-row
/// problems are counted in the summary instead.
pub fn convert(config: &ConvertConfig) -> Result<AssembledDataset, Geo2CocoError> {
    let image_paths = enumerate_images(&config.images_dir)?;
    info!(count = image_paths.len(), "found candidate images");

    let mut frames = Vec::new();
    let mut images_unreadable = 0u64;
    for path in &image_paths {
        match load_frame(path, config.image_epsg) {
            Ok(frame) => frames.push(frame),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable image");
                images_unreadable += 1;
            }
        }
    }

    let vectors = read_footprints_csv(&config.csv_path)?;
    info!(
        rows = vectors.rows.len(),
        skipped = vectors.skipped,
        "loaded building footprints"
    );

    let mut assembled = assemble(&frames, &vectors.rows, &config.options)?;
    assembled.summary.images_unreadable = images_unreadable;
    assembled.summary.rows_malformed = vectors.skipped;
    info!(summary = %assembled.summary, "conversion finished");

    Ok(assembled)
}

/// Assembles a dataset from already-loaded frames and footprint rows.
///
/// This is the in-memory entry point the integration tests drive; the
/// summary's `images_unreadable` / `rows_malformed` counters belong to
/// the file-loading layer and stay zero here.
pub fn assemble(
    frames: &[RasterFrame],
    rows: &[FootprintRow],
    options: &PipelineOptions,
) -> Result<AssembledDataset, Geo2CocoError> {
    let mut registry = match &options.supercategory {
        Some(supercategory) => CategoryRegistry::with_supercategory(supercategory.clone()),
        None => CategoryRegistry::new(),
    };
    let mut ids = AnnotationIdAllocator::new();

    let mut dataset = Dataset {
        info: options.info.clone(),
        ..Dataset::default()
    };
    let mut mapping = Vec::new();
    let mut summary = RunSummary::default();

    for (index, frame) in frames.iter().enumerate() {
        let image_id = ImageId::new(index as u64 + 1);
        debug!(image = %frame.file_name, id = %image_id, "image loaded");

        process_image(
            frame,
            image_id,
            rows,
            options,
            &mut registry,
            &mut ids,
            &mut dataset,
            &mut mapping,
            &mut summary,
        )?;

        // Scanned -> Finalized: the image record is appended even when
        // zero annotations were produced for it.
        dataset
            .images
            .push(Image::new(image_id, frame.file_name.clone(), frame.width, frame.height));
        summary.images_loaded += 1;
        debug!(image = %frame.file_name, id = %image_id, "image finalized");
    }

    dataset.categories = registry.into_categories();

    let report = validate_dataset(
        &dataset,
        &ValidateOptions {
            min_area: Some(options.min_area),
            ..Default::default()
        },
    );
    if !report.is_ok() {
        return Err(Geo2CocoError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        });
    }

    Ok(AssembledDataset {
        dataset,
        mapping,
        summary,
    })
}

/// Scans all candidate footprints against one frame.
#[allow(clippy::too_many_arguments)]
fn process_image(
    frame: &RasterFrame,
    image_id: ImageId,
    rows: &[FootprintRow],
    options: &PipelineOptions,
    registry: &mut CategoryRegistry,
    ids: &mut AnnotationIdAllocator,
    dataset: &mut Dataset,
    mapping: &mut Vec<MappingRecord>,
    summary: &mut RunSummary,
) -> Result<(), Geo2CocoError> {
    // Unsupported CRS pairs are a configuration problem, surfaced
    // immediately rather than once per candidate.
    let to_pixel_crs = transformer_between(options.vector_epsg, frame.epsg)?;
    let to_vector_crs = transformer_between(frame.epsg, options.vector_epsg)?;

    // Coarse prefilter: the frame footprint in the vector CRS. Purely an
    // efficiency step; if it cannot be computed the scan just considers
    // every row.
    let prefilter: Option<BBoxXYXY<World>> = match frame.bounds_in_crs(to_vector_crs.as_ref()) {
        Ok(bounds) => Some(bounds),
        Err(err) => {
            warn!(image = %frame.file_name, error = %err, "prefilter disabled for image");
            None
        }
    };

    let mut built = 0u64;
    for row in rows {
        if let (Some(bounds), Some(rect)) = (&prefilter, row.polygon.bounding_rect()) {
            let row_bounds: BBoxXYXY<World> =
                BBoxXYXY::from_xyxy(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
            if !bounds.intersects(&row_bounds) {
                continue;
            }
        }

        let pixel_polygon =
            match reproject_polygon(&row.polygon, to_pixel_crs.as_ref(), &frame.transform) {
                Ok(polygon) => polygon,
                Err(err) => {
                    warn!(
                        image = %frame.file_name,
                        row = row.index,
                        error = %err,
                        "skipping candidate: reprojection failed"
                    );
                    summary.projection_failures += 1;
                    continue;
                }
            };

        let parts = clip_to_frame(&pixel_polygon, frame.width, frame.height, options.min_area);
        if parts.is_empty() {
            // No meaningful intersection with this frame. Not an error.
            summary.candidates_dropped += 1;
            continue;
        }

        let category_id = registry.resolve(&row.label);
        let provenance = Provenance {
            source_row: row.index,
            source_image: frame.file_name.clone(),
        };

        if let Some(annotation) = build_annotation(&parts, category_id, provenance, image_id, ids)
        {
            let category_name = registry
                .name_of(category_id)
                .unwrap_or_default()
                .to_string();
            mapping.push(MappingRecord::for_annotation(&annotation, &category_name));
            dataset.annotations.push(annotation);
            summary.annotations_built += 1;
            built += 1;
        }
    }

    debug!(image = %frame.file_name, annotations = built, "image scanned");
    Ok(())
}
