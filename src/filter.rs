//! Exact-match predicate evaluation.
//!
//! The coarse cell index returns a superset of the true matches; the
//! [`QueryFilter`] produced at token-derivation time is applied to each
//! candidate's decoded geometry to remove the false positives. The
//! evaluation is total: a candidate that cannot be classified is simply
//! not a match.

use crate::cap::Cap;
use crate::geometry::{points_approx_equal, Loop, SphericalRegion};
use geo_types::{Geometry, MultiPolygon, Point};

/// The kind of geo predicate being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// Entities whose geometry lies within the query region.
    Within,
    /// Entities whose geometry contains the query point/region.
    Contains,
    /// Entities whose geometry intersects the query region.
    Intersects,
    /// Entities within a given ground distance of the query point.
    Near,
}

impl QueryType {
    /// Parse a predicate name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "within" => Some(QueryType::Within),
            "contains" => Some(QueryType::Contains),
            "intersects" => Some(QueryType::Intersects),
            "near" => Some(QueryType::Near),
            _ => None,
        }
    }

    /// Predicate name as written in queries.
    pub fn name(&self) -> &'static str {
        match self {
            QueryType::Within => "within",
            QueryType::Contains => "contains",
            QueryType::Intersects => "intersects",
            QueryType::Near => "near",
        }
    }
}

/// The query shape carried from planning to evaluation.
///
/// Exactly one of point / loop set / cap, by construction. The loop set
/// is never empty.
#[derive(Debug, Clone)]
pub enum FilterShape {
    Point(Point<f64>),
    Loops(Vec<Loop>),
    Cap(Cap),
}

impl From<SphericalRegion> for FilterShape {
    fn from(region: SphericalRegion) -> Self {
        match region {
            SphericalRegion::Point(p) => FilterShape::Point(p),
            SphericalRegion::Loops(loops) => FilterShape::Loops(loops),
        }
    }
}

/// Immutable exact-match filter for one predicate invocation.
///
/// Safe to share read-only across concurrent evaluations; `matches` is
/// pure.
#[derive(Debug, Clone)]
pub struct QueryFilter {
    shape: FilterShape,
    query_type: QueryType,
}

impl QueryFilter {
    pub(crate) fn new(shape: FilterShape, query_type: QueryType) -> Self {
        Self { shape, query_type }
    }

    /// The predicate kind this filter evaluates.
    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// The query shape this filter evaluates against.
    pub fn shape(&self) -> &FilterShape {
        &self.shape
    }

    /// Apply the filter to a candidate's decoded geometry.
    ///
    /// Total and side-effect free; never fails. A candidate that cannot
    /// be classified (unknown kind, undecodable ring) returns `false`.
    pub fn matches(&self, value: &Geometry<f64>) -> bool {
        match self.query_type {
            QueryType::Within | QueryType::Near => self.matches_within(value),
            QueryType::Contains => self.matches_contains(value),
            QueryType::Intersects => self.matches_intersects(value),
        }
    }

    /// Is the candidate inside the filter's region (loop set or cap)?
    fn matches_within(&self, value: &Geometry<f64>) -> bool {
        match value {
            Geometry::Point(p) => match &self.shape {
                FilterShape::Point(q) => points_approx_equal(q, p),
                FilterShape::Loops(loops) => loops.iter().any(|l| l.contains_point(p)),
                FilterShape::Cap(cap) => cap.contains_point(p),
            },
            Geometry::Polygon(poly) => {
                let Ok(ring) = Loop::from_polygon(poly) else {
                    return false;
                };
                match &self.shape {
                    FilterShape::Loops(loops) => loops.iter().any(|l| l.contains_loop(&ring)),
                    // Conservative: tests the ring's bounding cap, not the
                    // exact ring, against the query cap.
                    FilterShape::Cap(cap) => {
                        cap.contains_cap(&Cap::bounding_rect_cap(&ring.bounding_rect()))
                    }
                    FilterShape::Point(_) => false,
                }
            }
            Geometry::MultiPolygon(mp) => match &self.shape {
                FilterShape::Loops(loops) => {
                    // Every constituent ring must lie within some query loop.
                    for poly in &mp.0 {
                        let Ok(ring) = Loop::from_polygon(poly) else {
                            return false;
                        };
                        if !loops.iter().any(|l| l.contains_loop(&ring)) {
                            return false;
                        }
                    }
                    true
                }
                FilterShape::Cap(cap) => {
                    for poly in &mp.0 {
                        let Ok(ring) = Loop::from_polygon(poly) else {
                            return false;
                        };
                        if !cap.contains_cap(&Cap::bounding_rect_cap(&ring.bounding_rect())) {
                            return false;
                        }
                    }
                    true
                }
                FilterShape::Point(_) => false,
            },
            _ => false,
        }
    }

    /// Does the candidate enclose the filter's point/region? Only polygon
    /// and multi-polygon candidates are eligible.
    fn matches_contains(&self, value: &Geometry<f64>) -> bool {
        match value {
            Geometry::Polygon(poly) => {
                let Ok(ring) = Loop::from_polygon(poly) else {
                    return false;
                };
                match &self.shape {
                    FilterShape::Point(p) => ring.contains_point(p),
                    // The query may have been a multi-polygon; the candidate
                    // ring must contain every query loop.
                    FilterShape::Loops(loops) => loops.iter().all(|l| ring.contains_loop(l)),
                    FilterShape::Cap(_) => false,
                }
            }
            Geometry::MultiPolygon(mp) => match &self.shape {
                FilterShape::Point(p) => multi_polygon_contains_point(mp, p),
                FilterShape::Loops(loops) => {
                    // Every query loop must lie in some constituent ring;
                    // different loops may use different rings.
                    loops.iter().all(|l| multi_polygon_contains_loop(mp, l))
                }
                FilterShape::Cap(_) => false,
            },
            _ => false,
        }
    }

    /// Does the candidate share boundary or interior with any query loop?
    fn matches_intersects(&self, value: &Geometry<f64>) -> bool {
        let FilterShape::Loops(loops) = &self.shape else {
            // Intersects filters are built with a loop set; anything else
            // cannot match.
            return false;
        };
        match value {
            Geometry::Point(p) => loops.iter().any(|l| l.contains_point(p)),
            Geometry::Polygon(poly) => {
                let Ok(ring) = Loop::from_polygon(poly) else {
                    return false;
                };
                loops.iter().any(|l| l.intersects_loop(&ring))
            }
            Geometry::MultiPolygon(mp) => {
                // Full cross product, short-circuiting on the first hit.
                // One undecodable ring fails the whole candidate.
                for poly in &mp.0 {
                    let Ok(ring) = Loop::from_polygon(poly) else {
                        return false;
                    };
                    if loops.iter().any(|l| l.intersects_loop(&ring)) {
                        return true;
                    }
                }
                false
            }
            _ => false,
        }
    }
}

fn multi_polygon_contains_point(mp: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
    for poly in &mp.0 {
        let Ok(ring) = Loop::from_polygon(poly) else {
            return false;
        };
        if ring.contains_point(point) {
            return true;
        }
    }
    false
}

fn multi_polygon_contains_loop(mp: &MultiPolygon<f64>, l: &Loop) -> bool {
    for poly in &mp.0 {
        let Ok(ring) = Loop::from_polygon(poly) else {
            return false;
        };
        if ring.contains_loop(l) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{normalize, parse_wkt, SphericalRegion};

    fn loops_of(wkt: &str) -> Vec<Loop> {
        match normalize(&parse_wkt(wkt).unwrap()).unwrap() {
            SphericalRegion::Loops(loops) => loops,
            _ => panic!("expected loops"),
        }
    }

    fn within_filter(wkt: &str) -> QueryFilter {
        QueryFilter::new(FilterShape::Loops(loops_of(wkt)), QueryType::Within)
    }

    const SQUARE: &str = "POLYGON((0 0, 0 10, 10 10, 10 0, 0 0))";

    #[test]
    fn test_within_point_candidate() {
        let filter = within_filter(SQUARE);
        assert!(filter.matches(&parse_wkt("POINT(5 5)").unwrap()));
        assert!(!filter.matches(&parse_wkt("POINT(50 50)").unwrap()));
    }

    #[test]
    fn test_within_polygon_candidate() {
        let filter = within_filter(SQUARE);
        let inner = parse_wkt("POLYGON((2 2, 2 4, 4 4, 4 2, 2 2))").unwrap();
        let straddling = parse_wkt("POLYGON((8 8, 8 12, 12 12, 12 8, 8 8))").unwrap();
        assert!(filter.matches(&inner));
        assert!(!filter.matches(&straddling));
        // A shape is within itself.
        assert!(filter.matches(&parse_wkt(SQUARE).unwrap()));
    }

    #[test]
    fn test_within_multipolygon_requires_every_ring() {
        // Query loops: two disjoint squares A and B.
        let filter = within_filter(
            "MULTIPOLYGON(((0 0, 0 10, 10 10, 10 0, 0 0)), ((20 0, 20 10, 30 10, 30 0, 20 0)))",
        );
        // Both rings inside some query loop.
        let ok = parse_wkt(
            "MULTIPOLYGON(((1 1, 1 2, 2 2, 2 1, 1 1)), ((21 1, 21 2, 22 2, 22 1, 21 1)))",
        )
        .unwrap();
        // Second ring inside neither A nor B.
        let bad = parse_wkt(
            "MULTIPOLYGON(((1 1, 1 2, 2 2, 2 1, 1 1)), ((41 1, 41 2, 42 2, 42 1, 41 1)))",
        )
        .unwrap();
        assert!(filter.matches(&ok));
        assert!(!filter.matches(&bad));
    }

    #[test]
    fn test_within_ignores_unsupported_candidate() {
        let filter = within_filter(SQUARE);
        assert!(!filter.matches(&parse_wkt("LINESTRING(1 1, 2 2)").unwrap()));
    }

    #[test]
    fn test_contains_point_target() {
        let filter = QueryFilter::new(
            FilterShape::Point(Point::new(5.0, 5.0)),
            QueryType::Contains,
        );
        assert!(filter.matches(&parse_wkt(SQUARE).unwrap()));
        let elsewhere = parse_wkt("POLYGON((20 20, 20 30, 30 30, 30 20, 20 20))").unwrap();
        assert!(!filter.matches(&elsewhere));
        // Point candidates are never eligible for contains.
        assert!(!filter.matches(&parse_wkt("POINT(5 5)").unwrap()));
    }

    #[test]
    fn test_contains_multipolygon_point_union() {
        let filter = QueryFilter::new(
            FilterShape::Point(Point::new(25.0, 5.0)),
            QueryType::Contains,
        );
        let mp = parse_wkt(
            "MULTIPOLYGON(((0 0, 0 10, 10 10, 10 0, 0 0)), ((20 0, 20 10, 30 10, 30 0, 20 0)))",
        )
        .unwrap();
        assert!(filter.matches(&mp));
    }

    #[test]
    fn test_contains_loop_targets_all_required() {
        // Query region was a multi-polygon: both loops must be enclosed.
        let filter = QueryFilter::new(
            FilterShape::Loops(loops_of(
                "MULTIPOLYGON(((1 1, 1 2, 2 2, 2 1, 1 1)), ((7 7, 7 8, 8 8, 8 7, 7 7)))",
            )),
            QueryType::Contains,
        );
        assert!(filter.matches(&parse_wkt(SQUARE).unwrap()));

        let small = parse_wkt("POLYGON((0 0, 0 5, 5 5, 5 0, 0 0))").unwrap();
        assert!(!filter.matches(&small));
    }

    #[test]
    fn test_contains_multipolygon_loops_any_ring() {
        // Two query loops, each inside a *different* candidate ring.
        let filter = QueryFilter::new(
            FilterShape::Loops(loops_of(
                "MULTIPOLYGON(((1 1, 1 2, 2 2, 2 1, 1 1)), ((21 1, 21 2, 22 2, 22 1, 21 1)))",
            )),
            QueryType::Contains,
        );
        let mp = parse_wkt(
            "MULTIPOLYGON(((0 0, 0 10, 10 10, 10 0, 0 0)), ((20 0, 20 10, 30 10, 30 0, 20 0)))",
        )
        .unwrap();
        assert!(filter.matches(&mp));
    }

    #[test]
    fn test_intersects_candidates() {
        let filter = QueryFilter::new(FilterShape::Loops(loops_of(SQUARE)), QueryType::Intersects);

        assert!(filter.matches(&parse_wkt("POINT(5 5)").unwrap()));
        assert!(!filter.matches(&parse_wkt("POINT(50 50)").unwrap()));

        let overlapping = parse_wkt("POLYGON((8 8, 8 12, 12 12, 12 8, 8 8))").unwrap();
        let disjoint = parse_wkt("POLYGON((20 20, 20 30, 30 30, 30 20, 20 20))").unwrap();
        assert!(filter.matches(&overlapping));
        assert!(!filter.matches(&disjoint));

        let mp = parse_wkt(
            "MULTIPOLYGON(((40 40, 40 41, 41 41, 41 40, 40 40)), ((8 8, 8 12, 12 12, 12 8, 8 8)))",
        )
        .unwrap();
        assert!(filter.matches(&mp));
    }

    #[test]
    fn test_intersects_multipolygon_undecodable_ring_rejects() {
        let filter = QueryFilter::new(FilterShape::Loops(loops_of(SQUARE)), QueryType::Intersects);
        // The second ring overlaps the query square, but the degenerate
        // first ring fails to decode and drops the whole candidate.
        let broken = parse_wkt(
            "MULTIPOLYGON(((50 50, 51 51, 52 52, 50 50)), ((8 8, 8 12, 12 12, 12 8, 8 8)))",
        )
        .unwrap();
        assert!(!filter.matches(&broken));
    }

    #[test]
    fn test_near_cap_point_and_polygon() {
        let cap = Cap::from_distance(Point::new(0.0, 0.0), 200_000.0).unwrap();
        let filter = QueryFilter::new(FilterShape::Cap(cap), QueryType::Near);

        assert!(filter.matches(&parse_wkt("POINT(0.5 0.5)").unwrap()));
        assert!(!filter.matches(&parse_wkt("POINT(10 10)").unwrap()));

        // Small polygon near the center: its bounding cap fits.
        let near_poly =
            parse_wkt("POLYGON((0.1 0.1, 0.1 0.2, 0.2 0.2, 0.2 0.1, 0.1 0.1))").unwrap();
        assert!(filter.matches(&near_poly));

        let far_poly = parse_wkt("POLYGON((10 10, 10 11, 11 11, 11 10, 10 10))").unwrap();
        assert!(!filter.matches(&far_poly));
    }

    #[test]
    fn test_query_type_from_name_case_insensitive() {
        assert_eq!(QueryType::from_name("NEAR"), Some(QueryType::Near));
        assert_eq!(QueryType::from_name("Within"), Some(QueryType::Within));
        assert_eq!(QueryType::from_name("overlaps"), None);
    }
}
