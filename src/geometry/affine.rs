//! Affine pixel/world transforms and ESRI world-file parsing.
//!
//! A georeferenced raster carries six coefficients mapping pixel
//! `(col, row)` to world `(x, y)`:
//!
//! ```text
//! x = a * col + b * row + c
//! y = d * col + e * row + f
//! ```
//!
//! The inverse mapping (world to fractional pixel) exists whenever the
//! determinant `a*e - b*d` is non-zero.

use std::path::Path;

use crate::error::Geo2CocoError;

/// A 6-coefficient affine transform from pixel space to world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    /// x scale (world units per pixel column).
    pub a: f64,
    /// x skew (row rotation term).
    pub b: f64,
    /// x of the top-left corner of pixel (0, 0).
    pub c: f64,
    /// y skew (column rotation term).
    pub d: f64,
    /// y scale (world units per pixel row, negative for north-up rasters).
    pub e: f64,
    /// y of the top-left corner of pixel (0, 0).
    pub f: f64,
}

impl AffineTransform {
    /// Creates a north-up transform without rotation terms.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            a: pixel_width,
            b: 0.0,
            c: origin_x,
            d: 0.0,
            e: pixel_height,
            f: origin_y,
        }
    }

    /// The determinant of the linear part. Zero means the transform is
    /// degenerate and cannot be inverted.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Returns true if the transform can be inverted.
    #[inline]
    pub fn is_invertible(&self) -> bool {
        self.determinant() != 0.0
    }

    /// Maps a pixel coordinate `(col, row)` to world coordinates.
    #[inline]
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Maps a world coordinate to fractional pixel coordinates.
    ///
    /// The caller is expected to have checked [`is_invertible`]; on a
    /// degenerate transform the result is non-finite, which downstream
    /// code treats as a projection failure.
    ///
    /// [`is_invertible`]: AffineTransform::is_invertible
    #[inline]
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.determinant();
        let dx = x - self.c;
        let dy = y - self.f;
        (
            (self.e * dx - self.b * dy) / det,
            (self.a * dy - self.d * dx) / det,
        )
    }
}

/// Parses an ESRI world file (`.wld`, `.tfw`, `.jgw`, `.pgw`).
///
/// World files carry six lines: x scale, y skew, x skew, y scale, then
/// the world coordinates of the *center* of the top-left pixel. The
/// returned transform is shifted by half a pixel so that `c`/`f` refer
/// to the top-left corner of pixel (0, 0), matching the raster
/// convention used everywhere else in this crate.
pub fn parse_world_file(path: &Path, contents: &str) -> Result<AffineTransform, Geo2CocoError> {
    let values: Vec<f64> = contents
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| Geo2CocoError::WorldFileParse {
                path: path.to_path_buf(),
                reason: format!("invalid number '{token}'"),
            })
        })
        .collect::<Result<_, _>>()?;

    if values.len() < 6 {
        return Err(Geo2CocoError::WorldFileParse {
            path: path.to_path_buf(),
            reason: format!("expected 6 coefficients, found {}", values.len()),
        });
    }

    // World-file line order: A (x scale), D (y skew), B (x skew),
    // E (y scale), C (center x), F (center y).
    let (a, d, b, e, cx, cy) = (
        values[0], values[1], values[2], values[3], values[4], values[5],
    );

    let transform = AffineTransform {
        a,
        b,
        c: cx - a / 2.0 - b / 2.0,
        d,
        e,
        f: cy - d / 2.0 - e / 2.0,
    };

    if !transform.is_invertible() {
        return Err(Geo2CocoError::WorldFileParse {
            path: path.to_path_buf(),
            reason: "degenerate transform (zero determinant)".to_string(),
        });
    }

    Ok(transform)
}
