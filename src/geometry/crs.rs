//! Coordinate reference system transforms.
//!
//! CRSs are identified by EPSG code and resolved to proj strings handled
//! by `proj4rs` (pure Rust, no system PROJ installation). The supported
//! table covers the CRSs this tool encounters in practice: WGS84
//! geographic, Web Mercator, and the WGS84 UTM zones.

use std::borrow::Cow;

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::error::Geo2CocoError;

/// WGS84 geographic (longitude/latitude in degrees).
pub const EPSG_WGS84: u32 = 4326;
/// Web Mercator (Spherical Mercator).
pub const EPSG_WEB_MERCATOR: u32 = 3857;

/// Returns the proj string for a supported EPSG code.
fn proj_string_for(epsg: u32) -> Option<Cow<'static, str>> {
    match epsg {
        EPSG_WGS84 => Some(Cow::Borrowed("+proj=longlat +datum=WGS84 +no_defs")),
        EPSG_WEB_MERCATOR => Some(Cow::Borrowed(
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +no_defs",
        )),
        // WGS84 UTM: 32601..32660 north, 32701..32760 south.
        32601..=32660 => Some(Cow::Owned(format!(
            "+proj=utm +zone={} +datum=WGS84 +units=m +no_defs",
            epsg - 32600
        ))),
        32701..=32760 => Some(Cow::Owned(format!(
            "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
            epsg - 32700
        ))),
        _ => None,
    }
}

/// Returns true if the CRS expresses coordinates in degrees.
fn is_geographic(epsg: u32) -> bool {
    epsg == EPSG_WGS84
}

/// A reusable point transform between two EPSG-identified CRSs.
///
/// Construction fails with [`Geo2CocoError::UnsupportedCrs`] for EPSG
/// codes outside the supported table; a per-point transform fails with
/// [`Geo2CocoError::Projection`] when the underlying projection math is
/// undefined for the input.
pub struct CrsTransformer {
    source: Proj,
    target: Proj,
    source_epsg: u32,
    target_epsg: u32,
    source_is_geographic: bool,
    target_is_geographic: bool,
}

impl std::fmt::Debug for CrsTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsTransformer")
            .field("source_epsg", &self.source_epsg)
            .field("target_epsg", &self.target_epsg)
            .finish_non_exhaustive()
    }
}

impl CrsTransformer {
    /// Creates a transformer between two EPSG codes.
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, Geo2CocoError> {
        let source_str =
            proj_string_for(source_epsg).ok_or(Geo2CocoError::UnsupportedCrs(source_epsg))?;
        let target_str =
            proj_string_for(target_epsg).ok_or(Geo2CocoError::UnsupportedCrs(target_epsg))?;

        let source = Proj::from_proj_string(&source_str).map_err(|e| {
            Geo2CocoError::Projection(format!("invalid projection EPSG:{source_epsg}: {e:?}"))
        })?;
        let target = Proj::from_proj_string(&target_str).map_err(|e| {
            Geo2CocoError::Projection(format!("invalid projection EPSG:{target_epsg}: {e:?}"))
        })?;

        Ok(Self {
            source,
            target,
            source_epsg,
            target_epsg,
            source_is_geographic: is_geographic(source_epsg),
            target_is_geographic: is_geographic(target_epsg),
        })
    }

    /// Transforms one point from the source CRS to the target CRS.
    ///
    /// Handles radian/degree conversion automatically for geographic CRSs.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), Geo2CocoError> {
        let (in_x, in_y) = if self.source_is_geographic {
            (x.to_radians(), y.to_radians())
        } else {
            (x, y)
        };

        let mut point = (in_x, in_y, 0.0);
        transform(&self.source, &self.target, &mut point).map_err(|e| {
            Geo2CocoError::Projection(format!(
                "EPSG:{} -> EPSG:{} failed for ({x}, {y}): {e:?}",
                self.source_epsg, self.target_epsg
            ))
        })?;

        let (out_x, out_y) = if self.target_is_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(Geo2CocoError::Projection(format!(
                "EPSG:{} -> EPSG:{} produced non-finite result for ({x}, {y})",
                self.source_epsg, self.target_epsg
            )));
        }

        Ok((out_x, out_y))
    }

    /// The EPSG code of the source CRS.
    #[inline]
    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    /// The EPSG code of the target CRS.
    #[inline]
    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }
}

/// Builds a transformer only when the two CRSs differ.
///
/// Same-CRS pipelines skip the projection hop entirely, which is both
/// faster and exact.
pub fn transformer_between(
    source_epsg: u32,
    target_epsg: u32,
) -> Result<Option<CrsTransformer>, Geo2CocoError> {
    if source_epsg == target_epsg {
        // Still reject codes outside the supported table so the failure
        // surfaces at configuration time, not mid-run.
        proj_string_for(source_epsg).ok_or(Geo2CocoError::UnsupportedCrs(source_epsg))?;
        Ok(None)
    } else {
        CrsTransformer::new(source_epsg, target_epsg).map(Some)
    }
}
