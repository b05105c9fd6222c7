//! Cell covering generation.
//!
//! The coarse index stage works on hierarchical prefix cells (geohash):
//! the cell at level `l` containing a point is the length-`l` prefix of
//! any finer cell containing it, so the ancestor walk the token scheme
//! needs is plain string truncation.
//!
//! A covering is computed over the region's bounding rect: every cell at
//! the chosen level that touches the rect is emitted. That makes the
//! covering conservative (a superset of the region) and makes the
//! cover/ancestor duality exact: any region contained in the query region
//! has, at the query's covering level, only ancestor cells that appear in
//! the query's covering.

use crate::cap::Cap;
use crate::config::CoveringConfig;
use crate::error::{GeoFilterError, Result};
use crate::geometry::SphericalRegion;
use geo_types::{Coord, Rect};
use std::fmt;

/// An opaque hierarchical cell identifier.
///
/// Cells are comparable tokens with a well-defined parent at every
/// coarser level (a prefix of the identifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cell(String);

impl Cell {
    /// The cell identifier string.
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Hierarchy level of this cell (1 = coarsest).
    pub fn level(&self) -> usize {
        self.0.len()
    }

    /// Ancestor of this cell at the given coarser (or equal) level.
    pub fn parent(&self, level: usize) -> Cell {
        debug_assert!(level >= 1 && level <= self.level());
        Cell(self.0[..level].to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the covering of a normalized query region.
pub fn covering_for_region(
    region: &SphericalRegion,
    config: &CoveringConfig,
) -> Result<Vec<Cell>> {
    covering_for_rect(&region.bounding_rect(), config)
}

/// Compute the covering of a proximity cap.
///
/// A cap straddling the anti-meridian is covered piecewise, one grid per
/// bounding sub-rect, deduplicated.
pub fn covering_for_cap(cap: &Cap, config: &CoveringConfig) -> Result<Vec<Cell>> {
    let mut cells = Vec::new();
    for rect in cap.bounding_rects() {
        for cell in covering_for_rect(&rect, config)? {
            if !cells.contains(&cell) {
                cells.push(cell);
            }
        }
    }
    Ok(cells)
}

/// Walk every cover cell up to `min_level` (inclusive of the cell's own
/// level), deduplicated, preserving first-seen order.
pub fn ancestor_cells(cover: &[Cell], min_level: usize) -> Vec<Cell> {
    let mut parents: Vec<Cell> = Vec::new();
    for cell in cover {
        for level in min_level..=cell.level() {
            let parent = cell.parent(level);
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }
    }
    parents
}

/// Cover a lat/lng rect with cells at an adaptive level: the finest level
/// within `[min_level, max_level]` whose grid for this rect stays inside
/// `max_cells`. Very large regions may exceed `max_cells` at `min_level`;
/// the full grid is still emitted since dropping cells would lose
/// candidates.
fn covering_for_rect(rect: &Rect<f64>, config: &CoveringConfig) -> Result<Vec<Cell>> {
    let mut level = config.min_level;
    for l in config.min_level..=config.max_level {
        let (nx, ny) = grid_size(rect, l)?;
        if nx * ny <= config.max_cells {
            level = l;
        } else {
            break;
        }
    }

    let first = cell_rect(rect.min().x, rect.min().y, level)?;
    let (width, height) = (first.width(), first.height());

    let mut cells = Vec::new();
    let mut lat = first.min().y + height / 2.0;
    while lat - height / 2.0 <= rect.max().y && lat < 90.0 {
        let mut lng = first.min().x + width / 2.0;
        while lng - width / 2.0 <= rect.max().x && lng < 180.0 {
            let cell = cell_at(lng, lat, level)?;
            if !cells.contains(&cell) {
                cells.push(cell);
            }
            lng += width;
        }
        lat += height;
    }
    Ok(cells)
}

/// Number of grid columns and rows the rect spans at the given level.
fn grid_size(rect: &Rect<f64>, level: usize) -> Result<(usize, usize)> {
    let first = cell_rect(rect.min().x, rect.min().y, level)?;
    let nx = ((rect.max().x - first.min().x) / first.width()).floor() as usize + 1;
    let ny = ((rect.max().y - first.min().y) / first.height()).floor() as usize + 1;
    Ok((nx, ny))
}

/// The cell containing the given coordinate at the given level.
fn cell_at(lng: f64, lat: f64, level: usize) -> Result<Cell> {
    let (lng, lat) = clamp_coord(lng, lat);
    let id = geohash::encode(Coord { x: lng, y: lat }, level)
        .map_err(|e| GeoFilterError::Internal(format!("cell encoding failed: {}", e)))?;
    Ok(Cell(id))
}

/// Extent of the cell containing the given coordinate at the given level.
fn cell_rect(lng: f64, lat: f64, level: usize) -> Result<Rect<f64>> {
    let cell = cell_at(lng, lat, level)?;
    geohash::decode_bbox(cell.id())
        .map_err(|e| GeoFilterError::Internal(format!("cell decoding failed: {}", e)))
}

/// Keep sample coordinates strictly inside the valid lat/lng domain.
fn clamp_coord(lng: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-89.999_999, 89.999_999);
    let mut lng = lng;
    if lng >= 180.0 || lng < -180.0 {
        lng = ((lng + 180.0).rem_euclid(360.0)) - 180.0;
    }
    (lng.clamp(-179.999_999, 179.999_999), lat)
}
