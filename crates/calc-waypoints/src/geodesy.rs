//! Spherical-earth geodesy for turning world offsets into GPS positions.
//!
//! The world frame is North-West-Up: `x` points north and `y` points west.
//! Projection converts that to North-East-Down and solves the direct geodesic
//! problem on a sphere of radius [`EARTH_RADIUS_M`].

use sdf_world::{PlanarOffset, ScenePose};
use serde::Serialize;
use std::fmt;

/// Mean earth radius used by the spherical approximation, in metres.
pub const EARTH_RADIUS_M: f64 = 6.37e6;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lat {:.7}, lon {:.7}", self.lat, self.lon)
    }
}

/// Horizontal displacement in North-East-Down, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    pub north: f64,
    pub east: f64,
}

impl Displacement {
    pub fn distance(&self) -> f64 {
        self.north.hypot(self.east)
    }

    /// Bearing clockwise from north, in radians.
    pub fn bearing(&self) -> f64 {
        self.east.atan2(self.north)
    }
}

impl From<PlanarOffset> for Displacement {
    // NWU -> NED
    fn from(offset: PlanarOffset) -> Self {
        Self {
            north: offset.x,
            east: -offset.y,
        }
    }
}

/// Projects world offsets relative to a fixed origin.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    origin: LatLon,
}

impl Projector {
    pub fn new(origin: LatLon) -> Self {
        Self { origin }
    }

    pub fn origin(&self) -> LatLon {
        self.origin
    }

    pub fn project(&self, offset: PlanarOffset) -> LatLon {
        let displacement = Displacement::from(offset);
        destination(self.origin, displacement.distance(), displacement.bearing())
    }

    pub fn locate(&self, pose: ScenePose) -> Waypoint {
        let position = self.project(pose.offset);
        Waypoint {
            name: pose.name,
            offset: pose.offset,
            position,
        }
    }
}

/// A world model placed on the globe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub name: String,
    pub offset: PlanarOffset,
    #[serde(flatten)]
    pub position: LatLon,
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate for {} is {}", self.name, self.position)
    }
}

/// Solve the direct problem: travel `distance_m` from `origin` along `bearing` (radians).
pub fn destination(origin: LatLon, distance_m: f64, bearing: f64) -> LatLon {
    if distance_m == 0.0 {
        return origin;
    }

    let lat1 = origin.lat.to_radians();
    let delta = distance_m / EARTH_RADIUS_M;

    let lat2 = clamped_asin(lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing.cos());
    let dlon =
        (bearing.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    LatLon {
        lat: lat2.to_degrees(),
        lon: wrap_longitude(origin.lon + dlon.to_degrees()),
    }
}

/// Solve the inverse problem: great-circle distance (metres) and initial bearing (radians).
pub fn inverse(from: LatLon, to: LatLon) -> (f64, f64) {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (to.lon - from.lon).to_radians();

    let a = ((dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);
    let central_angle = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    let bearing = (dlon.sin() * lat2.cos())
        .atan2(lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos());

    (EARTH_RADIUS_M * central_angle, bearing)
}

// Rounding can push the sine just past ±1 near the poles
fn clamped_asin(sin: f64) -> f64 {
    sin.clamp(-1.0, 1.0).asin()
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}
