use std::io::Write;

use anyhow::Result;
use sdf_world::ScenePose;
use serde::Serialize;

use crate::geodesy::{LatLon, Projector, Waypoint};

#[derive(Serialize)]
struct JsonReport {
    origin: LatLon,
    waypoints: Vec<Waypoint>,
}

/// Confirm the origin the waypoints are projected from.
pub fn write_origin<W: Write>(projector: &Projector, out: &mut W) -> Result<()> {
    writeln!(out, "Origin 0,0 specified as {}", projector.origin())?;
    Ok(())
}

/// Project every extracted pose and write one line per waypoint.
///
/// Lines are streamed, so an extraction error surfaces after the lines that
/// preceded it. Returns the number of waypoints written.
pub fn write_waypoints<I, W>(projector: &Projector, poses: I, out: &mut W) -> Result<usize>
where
    I: IntoIterator<Item = sdf_world::Result<ScenePose>>,
    W: Write,
{
    let mut count = 0;
    for pose in poses {
        let waypoint = projector.locate(pose?);
        log::debug!(
            "{} offset {} is {:.4} m from origin",
            waypoint.name,
            waypoint.offset,
            waypoint.offset.x.hypot(waypoint.offset.y)
        );
        writeln!(out, "{waypoint}")?;
        count += 1;
    }
    Ok(count)
}

/// Origin line followed by every waypoint line.
pub fn write_report<I, W>(origin: LatLon, poses: I, out: &mut W) -> Result<usize>
where
    I: IntoIterator<Item = sdf_world::Result<ScenePose>>,
    W: Write,
{
    let projector = Projector::new(origin);
    write_origin(&projector, out)?;
    write_waypoints(&projector, poses, out)
}

/// Same conversion as [`write_report`], as one pretty JSON document.
///
/// Nothing is written unless every pose converted.
pub fn write_json_report<I, W>(origin: LatLon, poses: I, out: &mut W) -> Result<usize>
where
    I: IntoIterator<Item = sdf_world::Result<ScenePose>>,
    W: Write,
{
    let projector = Projector::new(origin);
    let waypoints = poses
        .into_iter()
        .map(|pose| pose.map(|pose| projector.locate(pose)))
        .collect::<sdf_world::Result<Vec<_>>>()?;
    let count = waypoints.len();
    serde_json::to_writer_pretty(&mut *out, &JsonReport { origin, waypoints })?;
    writeln!(out)?;
    Ok(count)
}
