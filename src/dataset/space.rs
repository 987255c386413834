//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! between different coordinate systems at compile time.

use std::fmt;

/// Marker type for pixel coordinates.
///
/// Pixel coordinates are real-valued offsets within an image, where (0, 0)
/// is the top-left corner and units are pixels.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for world coordinates.
///
/// World coordinates are positions in some coordinate reference system
/// (degrees for geographic CRSs, meters for projected ones). A value in
/// this space is only meaningful alongside the CRS it was expressed in.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum World {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // This is unreachable since Pixel has no variants
    }
}

impl fmt::Debug for World {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // This is unreachable since World has no variants
    }
}
