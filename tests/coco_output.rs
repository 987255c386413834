//! On-disk shape of the COCO document and the provenance mapping file.

use geo2coco::dataset::io_coco_json::{read_coco_json, write_coco_json};
use geo2coco::dataset::io_mapping_json::{mapping_path_for, write_mapping_json};
use geo2coco::dataset::{
    Annotation, AnnotationId, BBoxXYXY, Category, CategoryId, Dataset, DatasetInfo, Image,
    ImageId, MappingRecord, Pixel, Provenance,
};

fn sample_dataset() -> Dataset {
    let bbox = BBoxXYXY::<Pixel>::from_xyxy(100.0, 100.0, 120.0, 110.0);
    Dataset {
        info: DatasetInfo {
            description: Some("test tiles".into()),
            version: Some("1.0".into()),
            year: Some(2026),
            contributor: Some("geo2coco tests".into()),
            date_created: Some("2026-01-15".into()),
        },
        images: vec![Image::new(1u64, "tile_0001.png", 640, 640)],
        categories: vec![Category::with_supercategory(1u64, "residential", "building")],
        annotations: vec![Annotation {
            id: AnnotationId::new(1),
            image_id: ImageId::new(1),
            category_id: CategoryId::new(1),
            segmentation: vec![vec![
                100.0, 100.0, 120.0, 100.0, 120.0, 110.0, 100.0, 110.0,
            ]],
            bbox,
            area: 200.0,
            provenance: Provenance {
                source_row: 7,
                source_image: "tile_0001.png".into(),
            },
        }],
    }
}

#[test]
fn written_document_has_the_coco_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.json");

    write_coco_json(&path, &sample_dataset(), false).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert!(value.get("info").is_some());
    assert_eq!(value["images"].as_array().unwrap().len(), 1);
    assert_eq!(value["categories"][0]["supercategory"], "building");

    let annotation = &value["annotations"][0];
    // COCO bbox is [x, y, width, height].
    assert_eq!(annotation["bbox"][0], 100.0);
    assert_eq!(annotation["bbox"][1], 100.0);
    assert_eq!(annotation["bbox"][2], 20.0);
    assert_eq!(annotation["bbox"][3], 10.0);
    assert_eq!(annotation["iscrowd"], 0);
    assert_eq!(annotation["area"], 200.0);
    assert_eq!(
        annotation["segmentation"][0].as_array().unwrap().len(),
        8
    );
}

#[test]
fn document_roundtrips_through_the_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.json");
    let dataset = sample_dataset();

    write_coco_json(&path, &dataset, true).unwrap();
    let restored = read_coco_json(&path).unwrap();

    assert_eq!(restored.images.len(), 1);
    assert_eq!(restored.images[0].file_name, "tile_0001.png");
    assert_eq!(restored.categories[0].name, "residential");
    assert_eq!(restored.annotations[0].id, AnnotationId::new(1));
    assert_eq!(restored.annotations[0].segmentation, dataset.annotations[0].segmentation);
    assert!((restored.annotations[0].area - 200.0).abs() < 1e-9);
}

#[test]
fn mapping_file_sits_next_to_the_dataset() {
    assert_eq!(
        mapping_path_for(std::path::Path::new("out/dataset.json")),
        std::path::PathBuf::from("out/dataset_mapping.json")
    );
}

#[test]
fn mapping_records_link_annotations_to_source_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset_mapping.json");
    let dataset = sample_dataset();

    let records: Vec<MappingRecord> = dataset
        .annotations
        .iter()
        .map(|annotation| MappingRecord::for_annotation(annotation, "residential"))
        .collect();
    write_mapping_json(&path, &records).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value[0];

    assert_eq!(record["annotation_id"], 1);
    assert_eq!(record["image_id"], 1);
    assert_eq!(record["image_file_name"], "tile_0001.png");
    assert_eq!(record["source_row"], 7);
    assert_eq!(record["category_name"], "residential");
}

#[test]
fn writer_output_is_deterministic_regardless_of_input_order() {
    let dir = tempfile::tempdir().unwrap();

    let mut dataset = sample_dataset();
    dataset.images.push(Image::new(2u64, "tile_0002.png", 640, 640));
    dataset.categories.push(Category::new(2u64, "mosque"));

    let sorted_path = dir.path().join("sorted.json");
    write_coco_json(&sorted_path, &dataset, false).unwrap();

    dataset.images.reverse();
    dataset.categories.reverse();
    let reversed_path = dir.path().join("reversed.json");
    write_coco_json(&reversed_path, &dataset, false).unwrap();

    assert_eq!(
        std::fs::read_to_string(&sorted_path).unwrap(),
        std::fs::read_to_string(&reversed_path).unwrap()
    );
}
