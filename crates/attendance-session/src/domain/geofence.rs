//! Geofence distance validation
//!
//! Great-circle distance over WGS-84 degrees. Classroom-scale distances need
//! no antimeridian or pole handling.

use crate::error::{SessionError, SessionResult};
use shared_types::GeoPoint;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Haversine distance between two points, in meters.
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Circle around a classroom inside which redemptions are accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    center: GeoPoint,
    radius_m: f64,
}

impl Geofence {
    pub fn new(center: GeoPoint, radius_m: f64) -> Self {
        Self { center, radius_m }
    }

    /// Distance from the center rounded to whole meters.
    pub fn distance_m(&self, at: GeoPoint) -> u32 {
        haversine_distance_m(self.center, at).round() as u32
    }

    /// Check a location against the fence.
    ///
    /// The boundary is inclusive on the rounded distance. Returns that
    /// distance on success.
    pub fn check(&self, at: GeoPoint) -> SessionResult<u32> {
        let distance_m = self.distance_m(at);
        if f64::from(distance_m) <= self.radius_m {
            Ok(distance_m)
        } else {
            Err(SessionError::TooFarFromClassroom {
                distance_m,
                radius_m: self.radius_m.round() as u32,
            })
        }
    }
}
