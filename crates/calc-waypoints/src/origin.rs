use std::str::FromStr;
use thiserror::Error;

use crate::geodesy::LatLon;

/// Why a `--location` argument was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UsageError {
    #[error("expected LAT,LON with exactly two comma-separated fields, got {0}")]
    FieldCount(usize),

    #[error("{axis} {value:?} is not a number")]
    InvalidNumber { axis: &'static str, value: String },

    #[error("{axis} {value} is outside [-{limit}, {limit}]")]
    OutOfRange {
        axis: &'static str,
        value: f64,
        limit: f64,
    },
}

impl FromStr for LatLon {
    type Err = UsageError;

    /// Parse `LAT,LON` in degrees, the same form `sim_vehicle.py -l` takes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').collect();
        let [lat, lon] = fields.as_slice() else {
            return Err(UsageError::FieldCount(fields.len()));
        };

        Ok(LatLon {
            lat: parse_degrees(lat, "latitude", 90.0)?,
            lon: parse_degrees(lon, "longitude", 180.0)?,
        })
    }
}

fn parse_degrees(value: &str, axis: &'static str, limit: f64) -> Result<f64, UsageError> {
    let degrees = value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| UsageError::InvalidNumber {
            axis,
            value: value.to_string(),
        })?;

    if degrees.abs() > limit {
        return Err(UsageError::OutOfRange {
            axis,
            value: degrees,
            limit,
        });
    }
    Ok(degrees)
}
