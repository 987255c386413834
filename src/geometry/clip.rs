//! Clipping of pixel-space polygons to the image rectangle.
//!
//! A reprojected polygon is intersected against `[0, width] x [0, height]`
//! with holes honored. The intersection can split one source polygon into
//! several disjoint fragments; each fragment is returned separately and
//! the annotation builder reassembles them into one multi-part
//! segmentation.

use geo::orient::{Direction, Orient};
use geo::{Area, BooleanOps, BoundingRect};
use geo_types::{Coord, LineString, MultiPolygon, Polygon, Rect};

/// Default minimum polygon area in pixels squared.
pub const DEFAULT_MIN_AREA: f64 = 10.0;

/// One clipped fragment of a source polygon, with its area precomputed.
///
/// Every vertex lies within `[0, width] x [0, height]`, boundary
/// inclusive; the area is shoelace with hole subtraction.
#[derive(Clone, Debug)]
pub struct ClippedPart {
    pub polygon: Polygon<f64>,
    pub area: f64,
}

/// Intersects `polygon` with the image rectangle and filters the result.
///
/// Returns the surviving fragments, or an empty vector when the polygon
/// does not intersect the rectangle meaningfully: no overlap, only
/// degenerate fragments (fewer than 3 distinct vertices or zero area), or
/// a total area below `min_area`. A total area exactly equal to
/// `min_area` is retained.
pub fn clip_to_frame(
    polygon: &Polygon<f64>,
    width: u32,
    height: u32,
    min_area: f64,
) -> Vec<ClippedPart> {
    let (w, h) = (f64::from(width), f64::from(height));
    let frame_rect = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: w, y: h }).to_polygon();

    let intersection: MultiPolygon<f64> = polygon.intersection(&frame_rect);

    let mut parts: Vec<ClippedPart> = intersection
        .into_iter()
        .filter_map(|part| normalize_part(part, w, h))
        .collect();

    let total_area: f64 = parts.iter().map(|part| part.area).sum();
    if parts.is_empty() || total_area < min_area {
        return Vec::new();
    }

    // Boolean-op output order is not guaranteed; sort fragments so the
    // emitted segmentation is identical across runs.
    parts.sort_by(|left, right| {
        let lb = part_sort_key(left);
        let rb = part_sort_key(right);
        lb.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
    });

    parts
}

/// Computes the shoelace area of a polygon, holes subtracted.
pub fn polygon_area(polygon: &Polygon<f64>) -> f64 {
    polygon.unsigned_area()
}

fn part_sort_key(part: &ClippedPart) -> (f64, f64, usize) {
    match part.polygon.bounding_rect() {
        Some(rect) => (rect.min().x, rect.min().y, part.polygon.exterior().0.len()),
        None => (f64::MAX, f64::MAX, 0),
    }
}

/// Canonicalizes one intersection fragment: clamps residual float
/// overshoot to the rectangle, enforces winding (exterior CCW, holes CW),
/// and drops degenerate rings. Returns `None` for fragments that are not
/// a meaningful polygon.
fn normalize_part(part: Polygon<f64>, w: f64, h: f64) -> Option<ClippedPart> {
    let oriented = part.orient(Direction::Default);

    let exterior = clamp_ring(oriented.exterior(), w, h);
    if distinct_vertex_count(&exterior) < 3 {
        return None;
    }

    let interiors: Vec<LineString<f64>> = oriented
        .interiors()
        .iter()
        .map(|ring| clamp_ring(ring, w, h))
        .filter(|ring| distinct_vertex_count(ring) >= 3)
        .collect();

    let polygon = Polygon::new(exterior, interiors);
    let area = polygon.unsigned_area();
    if area <= 0.0 {
        return None;
    }

    Some(ClippedPart { polygon, area })
}

fn clamp_ring(ring: &LineString<f64>, w: f64, h: f64) -> LineString<f64> {
    LineString::new(
        ring.coords()
            .map(|coord| Coord {
                x: coord.x.clamp(0.0, w),
                y: coord.y.clamp(0.0, h),
            })
            .collect(),
    )
}

/// Number of distinct vertices, ignoring the closing duplicate.
fn distinct_vertex_count(ring: &LineString<f64>) -> usize {
    let coords = &ring.0;
    let open = if coords.len() > 1 && coords.first() == coords.last() {
        &coords[..coords.len() - 1]
    } else {
        &coords[..]
    };

    let mut distinct = 0;
    for (idx, coord) in open.iter().enumerate() {
        if open[..idx].iter().all(|prior| prior != coord) {
            distinct += 1;
        }
    }
    distinct
}
