//! Geocentric latitude/longitude to world-space conversion.
//!
//! The world frame is Y-up. Longitude is measured so that the land map's
//! prime meridian sits at `LONGITUDE_BIAS` degrees.

use nalgebra::{UnitQuaternion, Vector3};
use std::f64::consts::PI;

/// Degrees subtracted from every longitude before placement. Keeps points
/// registered against the land map.
pub const LONGITUDE_BIAS: f64 = 0.5;

/// Convert a latitude/longitude (degrees) on a sphere of `radius` into a
/// Cartesian point.
pub fn to_cartesian(latitude: f64, longitude: f64, radius: f64) -> Vector3<f64> {
    let phi = (90.0 - latitude) * PI / 180.0;
    let theta = (longitude - LONGITUDE_BIAS) * PI / 180.0;
    let x = -radius * phi.sin() * theta.cos();
    let z = radius * phi.sin() * theta.sin();
    let y = radius * phi.cos();
    Vector3::new(x, y, z)
}

/// Inverse of [`to_cartesian`]: returns `(latitude, longitude)` in degrees,
/// longitude in `(-180 + bias, 180 + bias]`. The origin maps to (0, bias).
pub fn to_geographic(point: &Vector3<f64>) -> (f64, f64) {
    let r = point.norm();
    if r == 0.0 {
        return (0.0, LONGITUDE_BIAS);
    }
    let phi = (point.y / r).clamp(-1.0, 1.0).acos();
    let theta = point.z.atan2(-point.x);
    (90.0 - phi.to_degrees(), theta.to_degrees() + LONGITUDE_BIAS)
}

/// Rotation taking the local +Y axis onto the outward surface normal.
pub fn surface_orientation(normal: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::rotation_between(&Vector3::y(), normal)
        // Antiparallel (south pole): any half-turn about a horizontal axis works.
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI))
}
