//! Raster frame metadata: the narrow image-loader collaborator.
//!
//! No pixel data is ever decoded. A frame is its dimensions (read from
//! the image header via `imagesize`), its pixel-to-world affine transform
//! (read from an ESRI world file next to the image), and its CRS (a
//! run-level EPSG code, since world files carry no CRS information).

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::dataset::{BBoxXYXY, World};
use crate::error::Geo2CocoError;
use crate::geometry::{parse_world_file, AffineTransform, CrsTransformer};

/// Raster extensions recognized during folder enumeration.
const IMAGE_EXTENSIONS: &[&str] = &["tif", "tiff", "jpg", "jpeg", "png"];

/// One source image's geospatial context.
///
/// Immutable once constructed; read-only input to the pipeline.
#[derive(Clone, Debug)]
pub struct RasterFrame {
    pub path: PathBuf,
    /// Basename used for the image record and provenance.
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    /// Pixel (col, row) -> world (x, y) in the frame's CRS.
    pub transform: AffineTransform,
    /// EPSG code of the frame's CRS.
    pub epsg: u32,
}

impl RasterFrame {
    /// Constructs a frame, enforcing positive dimensions and an
    /// invertible transform.
    pub fn new(
        path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        transform: AffineTransform,
        epsg: u32,
    ) -> Result<Self, Geo2CocoError> {
        let path = path.into();
        if width == 0 || height == 0 {
            return Err(Geo2CocoError::UnreadableImage {
                path,
                reason: format!("invalid dimensions {width}x{height}"),
            });
        }
        if !transform.is_invertible() {
            return Err(Geo2CocoError::DegenerateTransform { path });
        }

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            path,
            file_name,
            width,
            height,
            transform,
            epsg,
        })
    }

    /// The frame's footprint in its own CRS: the bounding box of the four
    /// image corners (min/max handles rotated transforms).
    pub fn world_bounds(&self) -> BBoxXYXY<World> {
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let corners = [
            self.transform.pixel_to_world(0.0, 0.0),
            self.transform.pixel_to_world(w, 0.0),
            self.transform.pixel_to_world(0.0, h),
            self.transform.pixel_to_world(w, h),
        ];
        points_bbox(&corners)
    }

    /// The frame's footprint expressed in another CRS, for the coarse
    /// candidate prefilter. `to_other` transforms frame-CRS points into
    /// the target CRS; `None` means the CRSs already agree.
    ///
    /// A straight frame edge maps to a curve under a non-conformal CRS
    /// pair, so the corners alone can under-cover the footprint. Edge
    /// midpoints are sampled as well and the result is padded by a
    /// relative margin, making the box an over-approximation: the
    /// prefilter may let extra candidates through (clipping discards
    /// them) but never skips one the frame actually touches.
    pub fn bounds_in_crs(
        &self,
        to_other: Option<&CrsTransformer>,
    ) -> Result<BBoxXYXY<World>, Geo2CocoError> {
        let bounds = self.world_bounds();
        let Some(transformer) = to_other else {
            return Ok(bounds);
        };

        let (xmin, ymin, xmax, ymax) = (
            bounds.xmin(),
            bounds.ymin(),
            bounds.xmax(),
            bounds.ymax(),
        );
        let (xmid, ymid) = ((xmin + xmax) / 2.0, (ymin + ymax) / 2.0);
        let samples = [
            transformer.transform(xmin, ymin)?,
            transformer.transform(xmax, ymin)?,
            transformer.transform(xmin, ymax)?,
            transformer.transform(xmax, ymax)?,
            transformer.transform(xmid, ymin)?,
            transformer.transform(xmid, ymax)?,
            transformer.transform(xmin, ymid)?,
            transformer.transform(xmax, ymid)?,
        ];
        Ok(pad_bbox(points_bbox(&samples), EDGE_CURVATURE_MARGIN))
    }
}

/// Relative padding applied to a reprojected footprint. Edge-midpoint
/// sampling captures the bulk of any edge curvature; this margin absorbs
/// the residual between samples.
const EDGE_CURVATURE_MARGIN: f64 = 0.01;

fn points_bbox(points: &[(f64, f64)]) -> BBoxXYXY<World> {
    let (mut xmin, mut ymin) = points[0];
    let (mut xmax, mut ymax) = points[0];
    for &(x, y) in &points[1..] {
        xmin = xmin.min(x);
        ymin = ymin.min(y);
        xmax = xmax.max(x);
        ymax = ymax.max(y);
    }
    BBoxXYXY::from_xyxy(xmin, ymin, xmax, ymax)
}

fn pad_bbox(bounds: BBoxXYXY<World>, margin: f64) -> BBoxXYXY<World> {
    let pad_x = bounds.width() * margin;
    let pad_y = bounds.height() * margin;
    BBoxXYXY::from_xyxy(
        bounds.xmin() - pad_x,
        bounds.ymin() - pad_y,
        bounds.xmax() + pad_x,
        bounds.ymax() + pad_y,
    )
}

/// Enumerates raster files under a directory, recursively, sorted by path
/// for deterministic image ids.
pub fn enumerate_images(dir: &Path) -> Result<Vec<PathBuf>, Geo2CocoError> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    let lower = ext.to_ascii_lowercase();
                    IMAGE_EXTENSIONS.contains(&lower.as_str())
                })
                .unwrap_or(false)
        })
        .collect();

    paths.sort();

    if paths.is_empty() {
        return Err(Geo2CocoError::NoImagesFound {
            path: dir.to_path_buf(),
        });
    }

    Ok(paths)
}

/// Loads one frame's metadata: dimensions from the image header, affine
/// transform from the companion world file.
pub fn load_frame(path: &Path, epsg: u32) -> Result<RasterFrame, Geo2CocoError> {
    let size = imagesize::size(path).map_err(|err| Geo2CocoError::UnreadableImage {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    let world_path = find_world_file(path).ok_or_else(|| Geo2CocoError::UnreadableImage {
        path: path.to_path_buf(),
        reason: "no companion world file (.wld/.tfw/.jgw/.pgw)".to_string(),
    })?;

    let contents = fs::read_to_string(&world_path)?;
    let transform = parse_world_file(&world_path, &contents)?;

    RasterFrame::new(
        path,
        u32::try_from(size.width).unwrap_or(0),
        u32::try_from(size.height).unwrap_or(0),
        transform,
        epsg,
    )
}

/// Looks for a world file next to the image: the generic `.wld` first,
/// then the extension-derived form (`.tfw` for TIFF, `.jgw` for JPEG,
/// `.pgw` for PNG).
fn find_world_file(image_path: &Path) -> Option<PathBuf> {
    let mut candidates = vec![image_path.with_extension("wld")];

    if let Some(ext) = image_path.extension().and_then(|e| e.to_str()) {
        let derived = match ext.to_ascii_lowercase().as_str() {
            "tif" | "tiff" => Some("tfw"),
            "jpg" | "jpeg" => Some("jgw"),
            "png" => Some("pgw"),
            _ => None,
        };
        if let Some(world_ext) = derived {
            candidates.push(image_path.with_extension(world_ext));
        }
    }

    candidates.into_iter().find(|candidate| candidate.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame() -> RasterFrame {
        RasterFrame::new(
            "tiles/tile_0001.tif",
            640,
            640,
            AffineTransform::north_up(10.0, 50.0, 0.00001, -0.00001),
            4326,
        )
        .unwrap()
    }

    #[test]
    fn frame_rejects_zero_dimensions() {
        let result = RasterFrame::new(
            "bad.tif",
            0,
            640,
            AffineTransform::north_up(0.0, 0.0, 1.0, -1.0),
            4326,
        );
        assert!(matches!(
            result,
            Err(Geo2CocoError::UnreadableImage { .. })
        ));
    }

    #[test]
    fn frame_rejects_degenerate_transform() {
        let result = RasterFrame::new(
            "bad.tif",
            640,
            640,
            AffineTransform::north_up(0.0, 0.0, 1.0, 0.0),
            4326,
        );
        assert!(matches!(
            result,
            Err(Geo2CocoError::DegenerateTransform { .. })
        ));
    }

    #[test]
    fn world_bounds_covers_the_tile() {
        let bounds = test_frame().world_bounds();
        assert!((bounds.xmin() - 10.0).abs() < 1e-12);
        assert!((bounds.xmax() - 10.0064).abs() < 1e-12);
        assert!((bounds.ymin() - 49.9936).abs() < 1e-12);
        assert!((bounds.ymax() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn file_name_is_the_basename() {
        assert_eq!(test_frame().file_name, "tile_0001.tif");
    }

    #[test]
    fn reprojected_bounds_cover_edge_bulges() {
        // UTM 31N tile straddling the central meridian (500 km easting)
        // at high latitude: along the constant-northing top edge the
        // latitude peaks at the meridian, above both corner latitudes,
        // so a corner-only bounding box would under-cover the footprint.
        let frame = RasterFrame::new(
            "tiles/utm_tile.tif",
            640,
            640,
            AffineTransform::north_up(468_000.0, 6_000_000.0, 100.0, -100.0),
            32631,
        )
        .unwrap();
        let to_wgs84 = CrsTransformer::new(32631, 4326).unwrap();

        let (_, corner_lat) = to_wgs84.transform(468_000.0, 6_000_000.0).unwrap();
        let (_, bulge_lat) = to_wgs84.transform(500_000.0, 6_000_000.0).unwrap();
        assert!(bulge_lat > corner_lat);

        let bounds = frame.bounds_in_crs(Some(&to_wgs84)).unwrap();
        assert!(bounds.ymax() >= bulge_lat);

        // Padding makes the box strictly larger than the sampled points.
        for (x, y) in [
            to_wgs84.transform(468_000.0, 6_000_000.0).unwrap(),
            to_wgs84.transform(532_000.0, 5_936_000.0).unwrap(),
        ] {
            assert!(bounds.xmin() < x && x < bounds.xmax());
            assert!(bounds.ymin() < y && y < bounds.ymax());
        }
    }

    #[test]
    fn same_crs_bounds_are_exact() {
        let bounds = test_frame().bounds_in_crs(None).unwrap();
        assert_eq!(bounds.xmin(), test_frame().world_bounds().xmin());
        assert_eq!(bounds.ymax(), test_frame().world_bounds().ymax());
    }

    #[test]
    fn world_file_candidates_prefer_wld() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("tile.tif");
        std::fs::write(&image, b"stub").unwrap();

        assert!(find_world_file(&image).is_none());

        let tfw = dir.path().join("tile.tfw");
        std::fs::write(&tfw, "1 0 0 -1 0.5 0.5").unwrap();
        assert_eq!(find_world_file(&image).unwrap(), tfw);

        let wld = dir.path().join("tile.wld");
        std::fs::write(&wld, "1 0 0 -1 0.5 0.5").unwrap();
        assert_eq!(find_world_file(&image).unwrap(), wld);
    }
}
