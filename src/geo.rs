//! Geographic distance helpers.
//!
//! Circle containment for geofences needs great-circle distance; at fence
//! scale (meters to a few kilometers) the haversine approximation is more
//! than accurate enough.

use crate::GeoPoint;

/// Earth's mean radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two points in meters.
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lng = (p2.longitude - p1.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Whether `point` lies within `radius` meters of `center`.
pub fn within_radius(center: &GeoPoint, point: &GeoPoint, radius: f64) -> bool {
    haversine_distance(center, point) <= radius
}
