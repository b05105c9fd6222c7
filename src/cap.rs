//! Bounding caps for proximity queries.
//!
//! A cap is a circular region on the sphere: a center point plus an
//! angular radius. `near` queries are planned and evaluated as "within
//! this cap".

use crate::error::{GeoFilterError, Result};
use geo_types::{Point, Rect};

/// Mean Earth radius in meters, used to convert linear ground distance
/// to an angular radius.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Slack applied to boundary comparisons so a candidate at exactly the
/// query distance is not dropped to floating point rounding.
const DISTANCE_EPSILON_METERS: f64 = 1e-6;

/// Haversine distance between two (lat, lng) points in meters.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Convert a linear ground distance in meters to an angular radius in
/// radians.
pub fn earth_angle(meters: f64) -> f64 {
    meters / EARTH_RADIUS_METERS
}

/// A circular region on the sphere: center point + angular radius.
#[derive(Debug, Clone)]
pub struct Cap {
    center: Point<f64>,
    radius_rad: f64,
}

impl Cap {
    /// Build a cap from a center point and a linear ground distance.
    ///
    /// Fails with `InvalidDistance` when the distance is not positive.
    pub fn from_distance(center: Point<f64>, distance_meters: f64) -> Result<Self> {
        if distance_meters <= 0.0 {
            return Err(GeoFilterError::InvalidDistance(format!(
                "max distance must be positive, got {}",
                distance_meters
            )));
        }
        Ok(Self {
            center,
            radius_rad: earth_angle(distance_meters),
        })
    }

    /// Build a cap directly from an angular radius in radians.
    pub fn from_angle(center: Point<f64>, radius_rad: f64) -> Self {
        Self { center, radius_rad }
    }

    /// Center point of the cap.
    pub fn center(&self) -> Point<f64> {
        self.center
    }

    /// Cap radius as a linear ground distance in meters.
    pub fn radius_meters(&self) -> f64 {
        self.radius_rad * EARTH_RADIUS_METERS
    }

    /// True if the point lies within the cap (boundary inclusive).
    pub fn contains_point(&self, point: &Point<f64>) -> bool {
        let d = haversine_distance(self.center.y(), self.center.x(), point.y(), point.x());
        d <= self.radius_meters() + DISTANCE_EPSILON_METERS
    }

    /// True if `other` lies entirely within this cap.
    pub fn contains_cap(&self, other: &Cap) -> bool {
        let d = haversine_distance(
            self.center.y(),
            self.center.x(),
            other.center.y(),
            other.center.x(),
        );
        d + other.radius_meters() <= self.radius_meters() + DISTANCE_EPSILON_METERS
    }

    /// Conservative lat/lng bounding rects of the cap.
    ///
    /// Usually a single rect. A cap straddling the anti-meridian yields
    /// two rects, one ending at 180 and one starting at -180, so every
    /// piece stays inside the valid longitude domain. Near the poles the
    /// longitude span degenerates; the rect widens to the full longitude
    /// range there, which only costs extra candidate cells, never missed
    /// ones.
    pub fn bounding_rects(&self) -> Vec<Rect<f64>> {
        let lat = self.center.y();
        let lng = self.center.x();
        let delta_lat = self.radius_rad.to_degrees();

        let min_lat = (lat - delta_lat).max(-90.0);
        let max_lat = (lat + delta_lat).min(90.0);

        // Longitude span grows with latitude; take the worst case over
        // the rect's latitude range.
        let worst_lat = min_lat.abs().max(max_lat.abs()).min(89.9);
        let delta_lng = delta_lat / worst_lat.to_radians().cos();

        if max_lat >= 89.9 || min_lat <= -89.9 || delta_lng >= 180.0 {
            return vec![Rect::new((-180.0, min_lat), (180.0, max_lat))];
        }

        let min_lng = lng - delta_lng;
        let max_lng = lng + delta_lng;
        if min_lng < -180.0 {
            vec![
                Rect::new((min_lng + 360.0, min_lat), (180.0, max_lat)),
                Rect::new((-180.0, min_lat), (max_lng, max_lat)),
            ]
        } else if max_lng > 180.0 {
            vec![
                Rect::new((min_lng, min_lat), (180.0, max_lat)),
                Rect::new((-180.0, min_lat), (max_lng - 360.0, max_lat)),
            ]
        } else {
            vec![Rect::new((min_lng, min_lat), (max_lng, max_lat))]
        }
    }

    /// Bounding cap of a lat/lng rect: centered on the rect, with radius
    /// reaching the farthest corner. Conservative for any geometry whose
    /// bounding rect this is.
    pub fn bounding_rect_cap(rect: &Rect<f64>) -> Cap {
        let center = Point::new(
            (rect.min().x + rect.max().x) / 2.0,
            (rect.min().y + rect.max().y) / 2.0,
        );
        let corners = [
            (rect.min().y, rect.min().x),
            (rect.min().y, rect.max().x),
            (rect.max().y, rect.min().x),
            (rect.max().y, rect.max().x),
        ];
        let radius_meters = corners
            .iter()
            .map(|(lat, lng)| haversine_distance(center.y(), center.x(), *lat, *lng))
            .fold(0.0, f64::max);
        Cap::from_angle(center, earth_angle(radius_meters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_haversine_paris_london() {
        // Paris: 48.8566N, 2.3522E / London: 51.5074N, 0.1278W
        let d = haversine_distance(48.8566, 2.3522, 51.5074, -0.1278);
        // Roughly 343-344 km.
        assert!(d > 340_000.0 && d < 350_000.0, "got {}", d);
    }

    #[test]
    fn test_haversine_along_meridian() {
        let delta_deg = earth_angle(1000.0).to_degrees();
        let d = haversine_distance(10.0, 20.0, 10.0 + delta_deg, 20.0);
        assert_relative_eq!(d, 1000.0, max_relative = 1e-9);
    }

    #[test]
    fn test_cap_rejects_non_positive_distance() {
        let c = Point::new(0.0, 0.0);
        assert!(Cap::from_distance(c, 0.0).is_err());
        assert!(Cap::from_distance(c, -5.0).is_err());
        assert!(Cap::from_distance(c, 100.0).is_ok());
    }

    #[test]
    fn test_cap_contains_point_boundary_inclusive() {
        let center = Point::new(20.0, 10.0);
        let cap = Cap::from_distance(center, 1000.0).unwrap();

        let delta_deg = earth_angle(1000.0).to_degrees();
        let on_boundary = Point::new(20.0, 10.0 + delta_deg);
        let inside = Point::new(20.0, 10.0 + delta_deg / 2.0);
        let outside = Point::new(20.0, 10.0 + delta_deg * 2.0);

        assert!(cap.contains_point(&inside));
        assert!(cap.contains_point(&on_boundary));
        assert!(!cap.contains_point(&outside));
    }

    #[test]
    fn test_cap_contains_cap() {
        let big = Cap::from_distance(Point::new(0.0, 0.0), 10_000.0).unwrap();
        let small = Cap::from_distance(Point::new(0.0, 0.0), 1_000.0).unwrap();
        let shifted = Cap::from_distance(Point::new(0.5, 0.0), 1_000.0).unwrap();

        assert!(big.contains_cap(&small));
        assert!(big.contains_cap(&big));
        assert!(!small.contains_cap(&big));
        // ~55km away with 1km radius does not fit in 10km.
        assert!(!big.contains_cap(&shifted));
    }

    #[test]
    fn test_bounding_rects_span_radius() {
        let cap = Cap::from_distance(Point::new(10.0, 45.0), 5_000.0).unwrap();
        let rects = cap.bounding_rects();
        assert_eq!(rects.len(), 1);
        let rect = &rects[0];
        assert!(rect.min().y < 45.0 && rect.max().y > 45.0);
        assert!(rect.min().x < 10.0 && rect.max().x > 10.0);
        // Longitude span must be wider than latitude span at 45N.
        assert!(rect.width() > rect.height());
    }

    #[test]
    fn test_bounding_rects_split_at_antimeridian() {
        let cap = Cap::from_distance(Point::new(179.999, 0.0), 1000.0).unwrap();
        let rects = cap.bounding_rects();
        assert_eq!(rects.len(), 2);

        let (east, west) = (&rects[0], &rects[1]);
        assert_eq!(east.max().x, 180.0);
        assert!(east.min().x < 179.999);
        assert_eq!(west.min().x, -180.0);
        assert!(west.max().x > -180.0 && west.max().x < -179.99);

        // And the mirror case, crossing westward.
        let cap = Cap::from_distance(Point::new(-179.999, 0.0), 1000.0).unwrap();
        let rects = cap.bounding_rects();
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].max().x, 180.0);
        assert_eq!(rects[1].min().x, -180.0);
    }
}
