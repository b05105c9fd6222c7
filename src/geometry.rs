//! Geometry normalization and ring predicates.
//!
//! This module converts parsed geometry values into the canonical query
//! representation used by token derivation and exact filtering: a single
//! point, or a non-empty ordered set of closed rings ("loops"). It also
//! provides the narrow predicate surface (point-in-loop, loop-in-loop,
//! loop-intersects-loop) the evaluator is built on, so the underlying
//! geometry library stays swappable without touching predicate logic.

use crate::error::{GeoFilterError, Result};
use geo::{Area, BoundingRect, Contains, Intersects};
use geo_types::{Geometry, Point, Polygon, Rect};

/// Tolerance for approximate point equality, in degrees.
///
/// Roughly 0.1mm of ground distance; stored points that survived an
/// encode/decode round trip compare equal under this tolerance.
const POINT_EQ_EPSILON_DEG: f64 = 1e-9;

/// A validated closed ring: the boundary of one polygon or one
/// constituent of a multi-polygon.
#[derive(Debug, Clone)]
pub struct Loop {
    ring: Polygon<f64>,
}

impl Loop {
    /// Convert a polygon into a loop.
    ///
    /// Fails for polygons with interior rings, open rings, rings with
    /// fewer than four coordinates, and degenerate (zero-area) rings.
    pub fn from_polygon(poly: &Polygon<f64>) -> Result<Self> {
        if !poly.interiors().is_empty() {
            return Err(GeoFilterError::GeometryDecode(
                "polygons with holes are not supported".to_string(),
            ));
        }
        let exterior = poly.exterior();
        if exterior.0.len() < 4 {
            return Err(GeoFilterError::GeometryDecode(format!(
                "ring has {} coordinates, need at least 4",
                exterior.0.len()
            )));
        }
        if !exterior.is_closed() {
            return Err(GeoFilterError::GeometryDecode(
                "ring is not closed".to_string(),
            ));
        }
        if poly.unsigned_area() == 0.0 {
            return Err(GeoFilterError::GeometryDecode(
                "ring is degenerate (zero area)".to_string(),
            ));
        }
        Ok(Self {
            ring: Polygon::new(exterior.clone(), vec![]),
        })
    }

    /// True if the point lies in the loop's interior.
    pub fn contains_point(&self, point: &Point<f64>) -> bool {
        self.ring.contains(point)
    }

    /// True if `other` lies entirely within this loop (boundary contact
    /// allowed; a loop contains itself).
    pub fn contains_loop(&self, other: &Loop) -> bool {
        self.ring.contains(&other.ring)
    }

    /// True if the two loops share any boundary or interior.
    pub fn intersects_loop(&self, other: &Loop) -> bool {
        self.ring.intersects(&other.ring)
    }

    /// Axis-aligned bounding rect of the ring.
    pub fn bounding_rect(&self) -> Rect<f64> {
        // A validated ring always has a bounding rect.
        self.ring
            .bounding_rect()
            .unwrap_or_else(|| Rect::new((0.0, 0.0), (0.0, 0.0)))
    }
}

/// Canonical query region: a single point or a non-empty loop set.
///
/// Exactly one variant is populated by construction; `normalize` never
/// produces an empty loop set.
#[derive(Debug, Clone)]
pub enum SphericalRegion {
    /// A single point (lng = x, lat = y).
    Point(Point<f64>),
    /// One loop per polygon / multi-polygon constituent, in input order.
    /// Must not be empty; [`normalize`] is the checked constructor.
    Loops(Vec<Loop>),
}

impl SphericalRegion {
    /// Bounding rect of the whole region.
    pub fn bounding_rect(&self) -> Rect<f64> {
        match self {
            SphericalRegion::Point(p) => Rect::new(p.0, p.0),
            SphericalRegion::Loops(loops) => {
                debug_assert!(!loops.is_empty(), "region must have at least one loop");
                let mut rect = loops[0].bounding_rect();
                for l in &loops[1..] {
                    let r = l.bounding_rect();
                    rect = Rect::new(
                        (rect.min().x.min(r.min().x), rect.min().y.min(r.min().y)),
                        (rect.max().x.max(r.max().x), rect.max().y.max(r.max().y)),
                    );
                }
                rect
            }
        }
    }
}

/// Normalize a parsed geometry value into a [`SphericalRegion`].
///
/// Point, Polygon and MultiPolygon are supported; any other geometry
/// kind is rejected. If any constituent ring of a multi-polygon fails
/// to convert, the whole call fails.
pub fn normalize(geom: &Geometry<f64>) -> Result<SphericalRegion> {
    match geom {
        Geometry::Point(p) => Ok(SphericalRegion::Point(*p)),
        Geometry::Polygon(poly) => Ok(SphericalRegion::Loops(vec![Loop::from_polygon(poly)?])),
        Geometry::MultiPolygon(mp) => {
            if mp.0.is_empty() {
                return Err(GeoFilterError::GeometryDecode(
                    "empty multi-polygon".to_string(),
                ));
            }
            let loops = mp
                .0
                .iter()
                .map(Loop::from_polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(SphericalRegion::Loops(loops))
        }
        other => Err(GeoFilterError::UnsupportedGeometry(format!(
            "cannot query using a geometry of type {}",
            geometry_kind(other)
        ))),
    }
}

/// Approximate point equality under a coordinate tolerance.
pub fn points_approx_equal(a: &Point<f64>, b: &Point<f64>) -> bool {
    (a.x() - b.x()).abs() <= POINT_EQ_EPSILON_DEG && (a.y() - b.y()).abs() <= POINT_EQ_EPSILON_DEG
}

/// Parse a WKT string into a geo-types Geometry.
pub fn parse_wkt(wkt_str: &str) -> Result<Geometry<f64>> {
    use std::str::FromStr;
    wkt::Wkt::from_str(wkt_str)
        .map_err(|e| GeoFilterError::GeometryDecode(format!("WKT parse error: {:?}", e)))
        .and_then(|w| {
            w.try_into().map_err(|e: wkt::conversion::Error| {
                GeoFilterError::GeometryDecode(format!("WKT conversion error: {:?}", e))
            })
        })
}

fn geometry_kind(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
