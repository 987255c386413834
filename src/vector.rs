//! Vector data loader: building footprints from CSV.
//!
//! The expected schema matches the OSM building extracts this tool was
//! built for: a `building` column (free-text type label) and a `geometry`
//! column holding a WKT POLYGON in the vector source CRS.
//!
//! Bad rows are skipped with a warning, not fatal to the run; a missing
//! required column is a file-level error.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geo_types::{Geometry, Polygon};
use tracing::warn;
use wkt::TryFromWkt;

use crate::error::Geo2CocoError;

/// One candidate building footprint, still in the vector source CRS.
#[derive(Clone, Debug)]
pub struct FootprintRow {
    /// Zero-based row index in the source table, used for provenance.
    pub index: u64,
    /// Raw building-type label, not yet normalized.
    pub label: String,
    /// Exterior ring plus optional holes.
    pub polygon: Polygon<f64>,
}

/// The outcome of loading a vector source: surviving rows plus the count
/// of rows skipped as malformed.
#[derive(Debug, Default)]
pub struct VectorLoadResult {
    pub rows: Vec<FootprintRow>,
    pub skipped: u64,
}

/// Reads building footprints from a CSV file.
///
/// # Errors
/// Returns an error if the file cannot be opened or is missing a
/// required column. Individual malformed rows are skipped and counted,
/// never fatal.
pub fn read_footprints_csv(path: &Path) -> Result<VectorLoadResult, Geo2CocoError> {
    let file = File::open(path).map_err(Geo2CocoError::Io)?;
    let reader = BufReader::new(file);
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| Geo2CocoError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?;

    let building_idx = column_index(headers, "building").ok_or_else(|| {
        Geo2CocoError::CsvMissingColumn {
            path: path.to_path_buf(),
            column: "building".to_string(),
        }
    })?;
    let geometry_idx = column_index(headers, "geometry").ok_or_else(|| {
        Geo2CocoError::CsvMissingColumn {
            path: path.to_path_buf(),
            column: "geometry".to_string(),
        }
    })?;

    let mut result = VectorLoadResult::default();

    for (row_number, record) in csv_reader.records().enumerate() {
        let index = row_number as u64;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!(row = index, error = %err, "skipping unreadable CSV row");
                result.skipped += 1;
                continue;
            }
        };

        match parse_row(index, &record, building_idx, geometry_idx) {
            Ok(row) => result.rows.push(row),
            Err(err) => {
                warn!(row = index, error = %err, "skipping malformed footprint row");
                result.skipped += 1;
            }
        }
    }

    Ok(result)
}

/// Parses one record into a footprint row.
///
/// Exposed at crate level so tests can exercise the per-row policy
/// without a file.
pub(crate) fn parse_row(
    index: u64,
    record: &csv::StringRecord,
    building_idx: usize,
    geometry_idx: usize,
) -> Result<FootprintRow, Geo2CocoError> {
    let label = record
        .get(building_idx)
        .unwrap_or_default()
        .trim()
        .to_string();
    let raw_wkt = record.get(geometry_idx).unwrap_or_default().trim();

    if label.is_empty() {
        return Err(Geo2CocoError::MalformedGeometry {
            row: index,
            reason: "empty building label".to_string(),
        });
    }
    if raw_wkt.is_empty() {
        return Err(Geo2CocoError::MalformedGeometry {
            row: index,
            reason: "empty geometry".to_string(),
        });
    }

    let geometry = Geometry::<f64>::try_from_wkt_str(raw_wkt).map_err(|err| {
        Geo2CocoError::MalformedGeometry {
            row: index,
            reason: format!("invalid WKT: {err:?}"),
        }
    })?;

    let polygon = match geometry {
        Geometry::Polygon(polygon) => polygon,
        other => {
            return Err(Geo2CocoError::MalformedGeometry {
                row: index,
                reason: format!("expected POLYGON, found {}", geometry_kind(&other)),
            });
        }
    };

    if distinct_exterior_vertices(&polygon) < 3 {
        return Err(Geo2CocoError::MalformedGeometry {
            row: index,
            reason: "exterior ring has fewer than 3 distinct vertices".to_string(),
        });
    }

    Ok(FootprintRow {
        index,
        label,
        polygon,
    })
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::Line(_) => "LINE",
        Geometry::LineString(_) => "LINESTRING",
        Geometry::Polygon(_) => "POLYGON",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        Geometry::Rect(_) => "RECT",
        Geometry::Triangle(_) => "TRIANGLE",
    }
}

fn distinct_exterior_vertices(polygon: &Polygon<f64>) -> usize {
    let coords = &polygon.exterior().0;
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
