//! Great-circle distance on a spherical Earth.
//!
//! The Haversine formula is written out explicitly rather than going through
//! `geo`'s `Haversine` metric: that metric uses the IUGG mean radius
//! (6 371 008.8 m) while this dataset's distance contract is defined against
//! a 6371 km sphere, and downstream consumers compare rounded kilometre
//! values. Points follow the `geo` convention of x = longitude,
//! y = latitude.

use geo::Point;

/// Earth radius used for all distance computations, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance between two points, in kilometres.
///
/// Symmetric, and exactly zero for identical points. Coordinate ranges are
/// not validated here; out-of-range values produce a numerically defined
/// but meaningless result. Range checks are the caller's job.
///
/// # Examples
///
/// ```rust
/// use geo::Point;
/// use tempo_grid::spatial::haversine_km;
///
/// let nyc = Point::new(-74.0060, 40.7128);
/// let la = Point::new(-118.2437, 34.0522);
///
/// let dist = haversine_km(&nyc, &la);
/// assert!(dist > 3_900.0 && dist < 4_000.0); // ~3,936 km
/// ```
pub fn haversine_km(a: &Point, b: &Point) -> f64 {
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lon = (b.x() - a.x()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.y().to_radians().cos() * b.y().to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Round a distance to two decimal places, the display convention used by
/// every reply that carries a `distance_km` field.
pub fn round_km(distance: f64) -> f64 {
    (distance * 100.0).round() / 100.0
}
