//! COCO JSON writer and reader for the assembled dataset.
//!
//! The pipeline assembles a [`Dataset`] in memory; this module renders it
//! to a COCO instance-segmentation document and reads such documents back
//! for the `validate` subcommand.
//!
//! # COCO Format Reference
//!
//! COCO bounding boxes use `[x, y, width, height]` format where `(x, y)`
//! is the top-left corner in absolute pixel coordinates. Segmentations are
//! arrays of flattened polygon rings `[x0, y0, x1, y1, ...]`.
//!
//! # Deterministic Output
//!
//! The writer produces deterministic output by sorting all lists by ID.
//! This ensures reproducible builds and meaningful diffs.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::model::{Annotation, Category, Dataset, DatasetInfo, Image, Provenance};
use super::{AnnotationId, BBoxXYXY, CategoryId, ImageId, Pixel};
use crate::error::Geo2CocoError;

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

/// Top-level COCO dataset structure.
#[derive(Debug, Serialize, Deserialize)]
struct CocoDataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    info: Option<CocoInfo>,

    /// Always emitted (possibly empty) for COCO tooling compatibility.
    #[serde(default)]
    licenses: Vec<serde_json::Value>,

    images: Vec<CocoImage>,

    annotations: Vec<CocoAnnotation>,

    categories: Vec<CocoCategory>,
}

/// COCO dataset info block.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CocoInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    contributor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_created: Option<String>,
}

/// COCO image entry.
#[derive(Debug, Serialize, Deserialize)]
struct CocoImage {
    id: u64,
    width: u32,
    height: u32,
    file_name: String,
}

/// COCO category entry.
#[derive(Debug, Serialize, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    supercategory: Option<String>,
}

/// COCO annotation entry.
#[derive(Debug, Serialize, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u64,

    /// Flattened polygon rings, one `[x0, y0, x1, y1, ...]` per ring.
    segmentation: Vec<Vec<f64>>,

    /// Polygon area in pixels squared (not the bbox area).
    area: f64,

    /// COCO bbox format: [x, y, width, height] with (x,y) as top-left corner
    bbox: [f64; 4],

    #[serde(default)]
    iscrowd: u8,
}

// ============================================================================
// Public API
// ============================================================================

/// Reads a dataset from a COCO JSON file.
///
/// Provenance cannot be recovered from a COCO document; annotations read
/// back carry a placeholder pointing at the owning image, which is enough
/// for structural validation.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_coco_json(path: &Path) -> Result<Dataset, Geo2CocoError> {
    let file = File::open(path).map_err(Geo2CocoError::Io)?;
    let reader = BufReader::new(file);

    let coco: CocoDataset =
        serde_json::from_reader(reader).map_err(|source| Geo2CocoError::CocoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(coco_to_model(coco))
}

/// Writes a dataset to a COCO JSON file.
///
/// The output is deterministic: all lists are sorted by ID to ensure
/// reproducible output and meaningful diffs.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_coco_json(path: &Path, dataset: &Dataset, pretty: bool) -> Result<(), Geo2CocoError> {
    let file = File::create(path).map_err(Geo2CocoError::Io)?;
    let writer = BufWriter::new(file);

    let coco = model_to_coco(dataset);

    let result = if pretty {
        serde_json::to_writer_pretty(writer, &coco)
    } else {
        serde_json::to_writer(writer, &coco)
    };

    result.map_err(|source| Geo2CocoError::CocoJsonWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a dataset from a COCO JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<Dataset, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_str(json)?;
    Ok(coco_to_model(coco))
}

/// Writes a dataset to a COCO JSON string.
///
/// Useful for testing without file I/O.
pub fn to_coco_string(dataset: &Dataset) -> Result<String, serde_json::Error> {
    let coco = model_to_coco(dataset);
    serde_json::to_string_pretty(&coco)
}

// ============================================================================
// Conversion: COCO -> model
// ============================================================================

fn coco_to_model(coco: CocoDataset) -> Dataset {
    let info = if let Some(coco_info) = coco.info {
        DatasetInfo {
            description: coco_info.description,
            version: coco_info.version,
            year: coco_info.year,
            contributor: coco_info.contributor,
            date_created: coco_info.date_created,
        }
    } else {
        DatasetInfo::default()
    };

    let images: Vec<Image> = coco
        .images
        .into_iter()
        .map(|img| Image {
            id: ImageId::new(img.id),
            file_name: img.file_name,
            width: img.width,
            height: img.height,
        })
        .collect();

    let categories = coco
        .categories
        .into_iter()
        .map(|cat| Category {
            id: CategoryId::new(cat.id),
            name: cat.name,
            supercategory: cat.supercategory,
        })
        .collect();

    let annotations = coco
        .annotations
        .into_iter()
        .map(|ann| {
            let [x, y, w, h] = ann.bbox;
            let image_id = ImageId::new(ann.image_id);
            let source_image = images
                .iter()
                .find(|img| img.id == image_id)
                .map(|img| img.file_name.clone())
                .unwrap_or_default();

            Annotation {
                id: AnnotationId::new(ann.id),
                image_id,
                category_id: CategoryId::new(ann.category_id),
                segmentation: ann.segmentation,
                bbox: BBoxXYXY::<Pixel>::from_xywh(x, y, w, h),
                area: ann.area,
                provenance: Provenance {
                    source_row: 0,
                    source_image,
                },
            }
        })
        .collect();

    Dataset {
        info,
        images,
        categories,
        annotations,
    }
}

// ============================================================================
// Conversion: model -> COCO
// ============================================================================

fn model_to_coco(dataset: &Dataset) -> CocoDataset {
    let info = Some(CocoInfo {
        description: dataset.info.description.clone(),
        version: dataset.info.version.clone(),
        year: dataset.info.year,
        contributor: dataset.info.contributor.clone(),
        date_created: dataset.info.date_created.clone(),
    });

    // Convert and sort images by ID
    let mut images: Vec<CocoImage> = dataset
        .images
        .iter()
        .map(|img| CocoImage {
            id: img.id.as_u64(),
            width: img.width,
            height: img.height,
            file_name: img.file_name.clone(),
        })
        .collect();
    images.sort_by_key(|i| i.id);

    // Convert and sort categories by ID
    let mut categories: Vec<CocoCategory> = dataset
        .categories
        .iter()
        .map(|cat| CocoCategory {
            id: cat.id.as_u64(),
            name: cat.name.clone(),
            supercategory: cat.supercategory.clone(),
        })
        .collect();
    categories.sort_by_key(|c| c.id);

    // Convert and sort annotations by ID
    let mut annotations: Vec<CocoAnnotation> = dataset
        .annotations
        .iter()
        .map(|ann| {
            let (x, y, w, h) = ann.bbox.to_xywh();
            CocoAnnotation {
                id: ann.id.as_u64(),
                image_id: ann.image_id.as_u64(),
                category_id: ann.category_id.as_u64(),
                segmentation: ann.segmentation.clone(),
                area: ann.area,
                bbox: [x, y, w, h],
                iscrowd: 0,
            }
        })
        .collect();
    annotations.sort_by_key(|a| a.id);

    CocoDataset {
        info,
        licenses: Vec::new(),
        images,
        annotations,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> Dataset {
        Dataset {
            info: DatasetInfo {
                description: Some("Building footprints".into()),
                version: Some("1.0".into()),
                year: Some(2025),
                contributor: None,
                date_created: None,
            },
            images: vec![
                Image::new(2u64, "tile_0002.tif", 640, 640),
                Image::new(1u64, "tile_0001.tif", 640, 640),
            ],
            categories: vec![Category::with_supercategory(1u64, "residential", "building")],
            annotations: vec![Annotation {
                id: AnnotationId(1),
                image_id: ImageId(1),
                category_id: CategoryId(1),
                segmentation: vec![vec![10.0, 10.0, 30.0, 10.0, 30.0, 20.0, 10.0, 20.0]],
                bbox: BBoxXYXY::from_xyxy(10.0, 10.0, 30.0, 20.0),
                area: 200.0,
                provenance: Provenance {
                    source_row: 5,
                    source_image: "tile_0001.tif".into(),
                },
            }],
        }
    }

    #[test]
    fn writer_sorts_images_by_id() {
        let json = to_coco_string(&sample_dataset()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let ids: Vec<u64> = value["images"]
            .as_array()
            .unwrap()
            .iter()
            .map(|img| img["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn writer_emits_coco_fields() {
        let json = to_coco_string(&sample_dataset()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let ann = &value["annotations"][0];
        assert_eq!(ann["bbox"], serde_json::json!([10.0, 10.0, 20.0, 10.0]));
        assert_eq!(ann["iscrowd"], 0);
        assert_eq!(ann["area"], 200.0);
        assert_eq!(ann["segmentation"].as_array().unwrap().len(), 1);

        // Provenance must not leak into the primary document.
        assert!(ann.get("provenance").is_none());
        assert!(value["licenses"].as_array().unwrap().is_empty());
        assert_eq!(value["categories"][0]["supercategory"], "building");
    }

    #[test]
    fn roundtrip_preserves_counts_and_geometry() {
        let original = sample_dataset();
        let json = to_coco_string(&original).unwrap();
        let restored = from_coco_str(&json).unwrap();

        assert_eq!(restored.images.len(), original.images.len());
        assert_eq!(restored.categories.len(), original.categories.len());
        assert_eq!(restored.annotations.len(), original.annotations.len());

        let ann = &restored.annotations[0];
        assert_eq!(ann.segmentation, original.annotations[0].segmentation);
        assert_eq!(ann.bbox, original.annotations[0].bbox);
        assert_eq!(ann.area, original.annotations[0].area);
        // Reader resolves the owning image for placeholder provenance.
        assert_eq!(ann.provenance.source_image, "tile_0001.tif");
    }

    #[test]
    fn writer_is_deterministic() {
        let dataset = sample_dataset();
        let first = to_coco_string(&dataset).unwrap();
        let second = to_coco_string(&dataset).unwrap();
        assert_eq!(first, second);
    }
}
