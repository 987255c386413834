//! Annotation assembly from clipped polygon fragments.
//!
//! One source row produces at most one annotation per image, regardless
//! of how many fragments clipping produced: the fragments become a
//! multi-part segmentation under a single id, preserving the 1:1 mapping
//! between source building rows and annotation identifiers.

use geo_types::{LineString, Polygon};

use crate::dataset::{Annotation, BBoxXYXY, CategoryId, ImageId, Pixel, Provenance};
use crate::geometry::ClippedPart;
use crate::pipeline::registry::AnnotationIdAllocator;

/// Builds one annotation from the clipped fragments of a source polygon.
///
/// Returns `None` when `parts` is empty (the candidate was filtered out
/// upstream). Id issuance is the only observable mutation and happens
/// exactly once per call that returns `Some`.
pub fn build_annotation(
    parts: &[ClippedPart],
    category_id: CategoryId,
    provenance: Provenance,
    image_id: ImageId,
    ids: &mut AnnotationIdAllocator,
) -> Option<Annotation> {
    if parts.is_empty() {
        return None;
    }

    let mut segmentation: Vec<Vec<f64>> = Vec::new();
    let mut vertices: Vec<(f64, f64)> = Vec::new();
    let mut area = 0.0;

    for part in parts {
        collect_polygon(&part.polygon, &mut segmentation, &mut vertices);
        area += part.area;
    }

    // Parts are non-empty polygons, so there is always at least one vertex.
    let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_points(vertices)?;

    Some(Annotation {
        id: ids.next_id(),
        image_id,
        category_id,
        segmentation,
        bbox,
        area,
        provenance,
    })
}

fn collect_polygon(
    polygon: &Polygon<f64>,
    segmentation: &mut Vec<Vec<f64>>,
    vertices: &mut Vec<(f64, f64)>,
) {
    segmentation.push(flatten_ring(polygon.exterior(), vertices));
    for hole in polygon.interiors() {
        segmentation.push(flatten_ring(hole, vertices));
    }
}

/// Flattens a ring to `[x0, y0, x1, y1, ...]`, dropping the repeated
/// closing vertex per the COCO convention.
fn flatten_ring(ring: &LineString<f64>, vertices: &mut Vec<(f64, f64)>) -> Vec<f64> {
    let coords = &ring.0;
    let open = if coords.len() > 1 && coords.first() == coords.last() {
        &coords[..coords.len() - 1]
    } else {
        &coords[..]
    };

    let mut flat = Vec::with_capacity(open.len() * 2);
    for coord in open {
        flat.push(coord.x);
        flat.push(coord.y);
        vertices.push((coord.x, coord.y));
    }
    flat
}
