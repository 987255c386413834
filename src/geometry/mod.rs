//! The geometry pipeline: reprojection, clipping, and the supporting
//! affine/CRS machinery.
//!
//! Polygons flow through this module in `geo-types` form: source
//! (world-space) polygon -> [`reproject::reproject_polygon`] ->
//! pixel-space polygon -> [`clip::clip_to_frame`] -> clipped fragments
//! ready for annotation assembly.

pub mod affine;
pub mod clip;
pub mod crs;
pub mod reproject;

pub use affine::{parse_world_file, AffineTransform};
pub use clip::{clip_to_frame, polygon_area, ClippedPart, DEFAULT_MIN_AREA};
pub use crs::{transformer_between, CrsTransformer, EPSG_WEB_MERCATOR, EPSG_WGS84};
pub use reproject::reproject_polygon;
