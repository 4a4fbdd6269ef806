pub mod geodesy;
pub mod origin;
pub mod report;

pub use geodesy::{LatLon, Projector, Waypoint};
pub use origin::UsageError;
pub use report::{write_json_report, write_origin, write_report, write_waypoints};

// Re-export sdf-world for external use
pub use sdf_world;

/// World file the SITL runway setup ships with, relative to the working directory.
pub const DEFAULT_WORLD: &str = "worlds/iris_arducopter_runway.world";
