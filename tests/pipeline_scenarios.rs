//! End-to-end assembler scenarios on a synthetic 640x640 WGS84 tile.
//!
//! The tile's top-left corner sits at (10.0 E, 50.0 N) with a pixel size
//! of 1e-5 degrees, so pixel (col, row) maps to world
//! (10.0 + 1e-5 * col, 50.0 - 1e-5 * row).

use geo2coco::dataset::io_coco_json::to_coco_string;
use geo2coco::geometry::AffineTransform;
use geo2coco::pipeline::{assemble, PipelineOptions};
use geo2coco::raster::RasterFrame;
use geo2coco::vector::FootprintRow;
use geo_types::{polygon, Polygon};

const PIXEL: f64 = 0.00001;

fn tile(name: &str, origin_x: f64, origin_y: f64) -> RasterFrame {
    RasterFrame::new(
        name,
        640,
        640,
        AffineTransform::north_up(origin_x, origin_y, PIXEL, -PIXEL),
        4326,
    )
    .unwrap()
}

/// A rectangular footprint given in pixel coordinates of the tile at
/// (10.0, 50.0), expressed in world coordinates.
fn footprint_px(index: u64, label: &str, col0: f64, row0: f64, col1: f64, row1: f64) -> FootprintRow {
    let x0 = 10.0 + PIXEL * col0;
    let x1 = 10.0 + PIXEL * col1;
    let y0 = 50.0 - PIXEL * row0;
    let y1 = 50.0 - PIXEL * row1;
    let polygon: Polygon<f64> = polygon![
        (x: x0, y: y0),
        (x: x1, y: y0),
        (x: x1, y: y1),
        (x: x0, y: y1),
        (x: x0, y: y0),
    ];
    FootprintRow {
        index,
        label: label.to_string(),
        polygon,
    }
}

#[test]
fn building_inside_the_tile_becomes_one_annotation() {
    let frames = vec![tile("tile_0001.png", 10.0, 50.0)];
    // 20 x 10 pixels = 200 px².
    let rows = vec![footprint_px(0, "residential", 100.0, 100.0, 120.0, 110.0)];

    let assembled = assemble(&frames, &rows, &PipelineOptions::default()).unwrap();
    let dataset = &assembled.dataset;

    assert_eq!(dataset.images.len(), 1);
    assert_eq!(dataset.annotations.len(), 1);
    assert_eq!(dataset.categories.len(), 1);
    assert_eq!(dataset.categories[0].name, "residential");
    assert_eq!(dataset.categories[0].supercategory.as_deref(), Some("building"));

    let annotation = &dataset.annotations[0];
    assert_eq!(annotation.id.as_u64(), 1);
    assert_eq!(annotation.image_id, dataset.images[0].id);
    assert!((annotation.area - 200.0).abs() < 1e-6);
    assert!((annotation.bbox.xmin() - 100.0).abs() < 1e-6);
    assert!((annotation.bbox.ymin() - 100.0).abs() < 1e-6);
    assert!((annotation.bbox.xmax() - 120.0).abs() < 1e-6);
    assert!((annotation.bbox.ymax() - 110.0).abs() < 1e-6);
    assert_eq!(annotation.provenance.source_row, 0);
    assert_eq!(annotation.provenance.source_image, "tile_0001.png");

    assert_eq!(assembled.mapping.len(), 1);
    assert_eq!(assembled.mapping[0].category_name, "residential");
    assert_eq!(assembled.summary.annotations_built, 1);
}

#[test]
fn building_outside_the_tile_produces_no_annotation_and_no_error() {
    let frames = vec![tile("tile_0001.png", 10.0, 50.0)];
    // Far west of the tile.
    let rows = vec![footprint_px(0, "residential", -5000.0, 100.0, -4900.0, 200.0)];

    let assembled = assemble(&frames, &rows, &PipelineOptions::default()).unwrap();

    assert_eq!(assembled.dataset.images.len(), 1);
    assert!(assembled.dataset.annotations.is_empty());
    assert_eq!(assembled.summary.annotations_built, 0);
}

#[test]
fn building_straddling_the_right_edge_is_clamped_to_it() {
    let frames = vec![tile("tile_0001.png", 10.0, 50.0)];
    // Pixel columns 600..700, clipped at 640.
    let rows = vec![footprint_px(0, "industrial", 600.0, 100.0, 700.0, 200.0)];

    let assembled = assemble(&frames, &rows, &PipelineOptions::default()).unwrap();
    let annotation = &assembled.dataset.annotations[0];

    assert_eq!(annotation.bbox.xmax(), 640.0);
    let max_x = annotation
        .segmentation
        .iter()
        .flat_map(|ring| ring.chunks_exact(2).map(|pair| pair[0]))
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(max_x, 640.0);
    // 40 x 100 pixels survive.
    assert!((annotation.area - 4000.0).abs() < 1e-6);
}

#[test]
fn sliver_below_min_area_is_dropped() {
    let frames = vec![tile("tile_0001.png", 10.0, 50.0)];
    // 3 x 3 pixels = 9 px², below the default threshold of 10.
    let rows = vec![footprint_px(0, "hut", 10.0, 10.0, 13.0, 13.0)];

    let assembled = assemble(&frames, &rows, &PipelineOptions::default()).unwrap();

    assert!(assembled.dataset.annotations.is_empty());
    assert_eq!(assembled.summary.candidates_dropped, 1);
}

#[test]
fn area_exactly_at_min_area_is_retained() {
    let frames = vec![tile("tile_0001.png", 10.0, 50.0)];
    // 5 x 2 pixels = exactly 10 px².
    let rows = vec![footprint_px(0, "hut", 10.0, 10.0, 15.0, 12.0)];

    let assembled = assemble(&frames, &rows, &PipelineOptions::default()).unwrap();

    assert_eq!(assembled.dataset.annotations.len(), 1);
    assert!((assembled.dataset.annotations[0].area - 10.0).abs() < 1e-6);
}

#[test]
fn building_overlapping_two_tiles_is_annotated_in_both() {
    // Second tile starts 320 pixels east of the first.
    let frames = vec![
        tile("tile_0001.png", 10.0, 50.0),
        tile("tile_0002.png", 10.0 + PIXEL * 320.0, 50.0),
    ];
    // Columns 300..340 of the first tile straddle the seam at 320.
    let rows = vec![footprint_px(0, "residential", 300.0, 100.0, 340.0, 150.0)];

    let assembled = assemble(&frames, &rows, &PipelineOptions::default()).unwrap();
    let annotations = &assembled.dataset.annotations;

    assert_eq!(annotations.len(), 2);
    assert_ne!(annotations[0].id, annotations[1].id);
    assert_ne!(annotations[0].image_id, annotations[1].image_id);
    assert_eq!(annotations[0].provenance.source_row, 0);
    assert_eq!(annotations[1].provenance.source_row, 0);
    // Both halves reference the single shared category.
    assert_eq!(assembled.dataset.categories.len(), 1);
    assert_eq!(annotations[0].category_id, annotations[1].category_id);
}

#[test]
fn labels_are_normalized_into_one_category() {
    let frames = vec![tile("tile_0001.png", 10.0, 50.0)];
    let rows = vec![
        footprint_px(0, "Residential", 10.0, 10.0, 40.0, 40.0),
        footprint_px(1, "  residential  ", 100.0, 100.0, 140.0, 140.0),
        footprint_px(2, "mosque", 200.0, 200.0, 240.0, 240.0),
    ];

    let assembled = assemble(&frames, &rows, &PipelineOptions::default()).unwrap();
    let dataset = &assembled.dataset;

    assert_eq!(dataset.categories.len(), 2);
    assert_eq!(dataset.categories[0].name, "residential");
    assert_eq!(dataset.categories[0].id.as_u64(), 1);
    assert_eq!(dataset.categories[1].name, "mosque");
    assert_eq!(dataset.categories[1].id.as_u64(), 2);
    assert_eq!(
        dataset.annotations[0].category_id,
        dataset.annotations[1].category_id
    );
}

#[test]
fn annotation_ids_are_global_and_monotonic() {
    let frames = vec![
        tile("tile_0001.png", 10.0, 50.0),
        tile("tile_0002.png", 10.0, 50.0),
    ];
    let rows = vec![
        footprint_px(0, "residential", 10.0, 10.0, 40.0, 40.0),
        footprint_px(1, "mosque", 100.0, 100.0, 140.0, 140.0),
    ];

    let assembled = assemble(&frames, &rows, &PipelineOptions::default()).unwrap();
    let ids: Vec<u64> = assembled
        .dataset
        .annotations
        .iter()
        .map(|annotation| annotation.id.as_u64())
        .collect();

    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[test]
fn reruns_on_identical_input_are_byte_identical() {
    let frames = vec![
        tile("tile_0001.png", 10.0, 50.0),
        tile("tile_0002.png", 10.0 + PIXEL * 320.0, 50.0),
    ];
    let rows = vec![
        footprint_px(0, "residential", 300.0, 100.0, 340.0, 150.0),
        footprint_px(1, "mosque", 50.0, 50.0, 90.0, 90.0),
    ];
    let options = PipelineOptions::default();

    let first = assemble(&frames, &rows, &options).unwrap();
    let second = assemble(&frames, &rows, &options).unwrap();

    let first_json = to_coco_string(&first.dataset).unwrap();
    let second_json = to_coco_string(&second.dataset).unwrap();
    assert_eq!(first_json, second_json);
}

#[test]
fn image_record_is_kept_even_when_empty() {
    let frames = vec![
        tile("tile_0001.png", 10.0, 50.0),
        // No footprints anywhere near this one.
        tile("tile_0002.png", 20.0, 40.0),
    ];
    let rows = vec![footprint_px(0, "residential", 10.0, 10.0, 40.0, 40.0)];

    let assembled = assemble(&frames, &rows, &PipelineOptions::default()).unwrap();

    assert_eq!(assembled.dataset.images.len(), 2);
    assert_eq!(assembled.dataset.annotations.len(), 1);
    assert_eq!(assembled.dataset.images[1].id.as_u64(), 2);
}
