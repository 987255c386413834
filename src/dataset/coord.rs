//! Space-tagged 2D coordinates.
//!
//! Pixel columns/rows and world eastings/northings are both just pairs
//! of `f64`, which makes them easy to swap by accident halfway through
//! the reprojection chain. Tagging the pair with a zero-sized space
//! marker turns that mistake into a type error.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// A 2D point tagged with the coordinate space it lives in.
///
/// `TSpace` is one of the markers in [`space`](super::space): `Pixel`
/// for (column, row) positions on a raster, `World` for positions in a
/// geographic or projected CRS. The tag exists only at compile time.
#[derive(Clone, Copy, PartialEq)]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }

    /// True when neither component is NaN or infinite. Projection math
    /// can produce non-finite values; callers check here before letting
    /// a point into the dataset.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl<TSpace> std::fmt::Debug for Coord<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coord")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl<TSpace> Default for Coord<TSpace> {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

// Hand-rolled serde impls: deriving would demand TSpace itself be
// (de)serializable, but the marker never appears on the wire.
impl<TSpace> Serialize for Coord<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Coord", 2)?;
        state.serialize_field("x", &self.x)?;
        state.serialize_field("y", &self.y)?;
        state.end()
    }
}

impl<'de, TSpace> Deserialize<'de> for Coord<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct CoordData {
            x: f64,
            y: f64,
        }
        let data = CoordData::deserialize(deserializer)?;
        Ok(Coord::new(data.x, data.y))
    }
}
