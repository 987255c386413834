//! Reprojection of source polygons into raster pixel space.
//!
//! Two hops: an optional CRS transform from the vector source CRS into
//! the raster's CRS, then the inverse affine transform down to
//! fractional pixel coordinates. The result is not yet clipped to the
//! image rectangle.

use geo_types::{Coord, LineString, Polygon};

use super::affine::AffineTransform;
use super::crs::CrsTransformer;
use crate::error::Geo2CocoError;

/// Reprojects one polygon (exterior + holes) into pixel space.
///
/// `transformer` is `None` when the vector source CRS and the raster CRS
/// are the same. Pure function of its inputs; fails with
/// [`Geo2CocoError::Projection`] when the CRS transform is undefined for
/// a vertex or any output coordinate is non-finite.
pub fn reproject_polygon(
    polygon: &Polygon<f64>,
    transformer: Option<&CrsTransformer>,
    raster_transform: &AffineTransform,
) -> Result<Polygon<f64>, Geo2CocoError> {
    let exterior = reproject_ring(polygon.exterior(), transformer, raster_transform)?;
    let interiors = polygon
        .interiors()
        .iter()
        .map(|ring| reproject_ring(ring, transformer, raster_transform))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Polygon::new(exterior, interiors))
}

fn reproject_ring(
    ring: &LineString<f64>,
    transformer: Option<&CrsTransformer>,
    raster_transform: &AffineTransform,
) -> Result<LineString<f64>, Geo2CocoError> {
    let coords = ring
        .coords()
        .map(|coord| reproject_point(coord.x, coord.y, transformer, raster_transform))
        .collect::<Result<Vec<Coord<f64>>, _>>()?;

    Ok(LineString::new(coords))
}

fn reproject_point(
    x: f64,
    y: f64,
    transformer: Option<&CrsTransformer>,
    raster_transform: &AffineTransform,
) -> Result<Coord<f64>, Geo2CocoError> {
    let (wx, wy) = match transformer {
        Some(t) => t.transform(x, y)?,
        None => (x, y),
    };

    let (col, row) = raster_transform.world_to_pixel(wx, wy);
    if !col.is_finite() || !row.is_finite() {
        return Err(Geo2CocoError::Projection(format!(
            "world ({wx}, {wy}) mapped to non-finite pixel coordinates"
        )));
    }

    Ok(Coord { x: col, y: row })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    fn frame_transform() -> AffineTransform {
        // 640x640 tile over [10.0, 10.0064] x [50.0, 49.9936]: pixel
        // (0,0) -> (10.0, 50.0), 1e-5 degrees per pixel, north-up.
        AffineTransform::north_up(10.0, 50.0, 0.00001, -0.00001)
    }

    #[test]
    fn same_crs_polygon_maps_through_inverse_affine() {
        let polygon: Polygon<f64> = polygon![
            (x: 10.001, y: 49.999),
            (x: 10.002, y: 49.999),
            (x: 10.002, y: 49.998),
            (x: 10.001, y: 49.998),
            (x: 10.001, y: 49.999),
        ];

        let pixel = reproject_polygon(&polygon, None, &frame_transform()).unwrap();
        let coords: Vec<_> = pixel.exterior().coords().copied().collect();

        assert!((coords[0].x - 100.0).abs() < 1e-6);
        assert!((coords[0].y - 100.0).abs() < 1e-6);
        assert!((coords[2].x - 200.0).abs() < 1e-6);
        assert!((coords[2].y - 200.0).abs() < 1e-6);
    }

    #[test]
    fn holes_are_reprojected_too() {
        let polygon = Polygon::new(
            LineString::from(vec![
                (10.000, 50.000),
                (10.004, 50.000),
                (10.004, 49.996),
                (10.000, 49.996),
                (10.000, 50.000),
            ]),
            vec![LineString::from(vec![
                (10.001, 49.999),
                (10.002, 49.999),
                (10.002, 49.998),
                (10.001, 49.998),
                (10.001, 49.999),
            ])],
        );

        let pixel = reproject_polygon(&polygon, None, &frame_transform()).unwrap();
        assert_eq!(pixel.interiors().len(), 1);
        let hole: Vec<_> = pixel.interiors()[0].coords().copied().collect();
        assert!((hole[0].x - 100.0).abs() < 1e-6);
        assert!((hole[0].y - 100.0).abs() < 1e-6);
    }

    #[test]
    fn cross_crs_reprojection_lands_in_frame() {
        use crate::geometry::crs::{CrsTransformer, EPSG_WEB_MERCATOR, EPSG_WGS84};

        // The same tile georeferenced in Web Mercator meters.
        let forward = CrsTransformer::new(EPSG_WGS84, EPSG_WEB_MERCATOR).unwrap();
        let (origin_x, origin_y) = forward.transform(10.0, 50.0).unwrap();
        let (far_x, far_y) = forward.transform(10.0064, 49.9936).unwrap();
        let raster_transform = AffineTransform::north_up(
            origin_x,
            origin_y,
            (far_x - origin_x) / 640.0,
            (far_y - origin_y) / 640.0,
        );

        let polygon: Polygon<f64> = polygon![
            (x: 10.0032, y: 49.9968),
            (x: 10.0033, y: 49.9968),
            (x: 10.0033, y: 49.9967),
            (x: 10.0032, y: 49.9967),
            (x: 10.0032, y: 49.9968),
        ];

        let pixel = reproject_polygon(&polygon, Some(&forward), &raster_transform).unwrap();
        for coord in pixel.exterior().coords() {
            assert!(coord.x > 300.0 && coord.x < 340.0, "x = {}", coord.x);
            assert!(coord.y > 300.0 && coord.y < 340.0, "y = {}", coord.y);
        }
    }

    #[test]
    fn degenerate_transform_is_a_projection_error() {
        let polygon: Polygon<f64> = polygon![
            (x: 1.0, y: 1.0),
            (x: 2.0, y: 1.0),
            (x: 2.0, y: 2.0),
            (x: 1.0, y: 1.0),
        ];
        let degenerate = AffineTransform::north_up(0.0, 0.0, 1.0, 0.0);

        let err = reproject_polygon(&polygon, None, &degenerate).unwrap_err();
        assert!(matches!(err, Geo2CocoError::Projection(_)));
    }
}
