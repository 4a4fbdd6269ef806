use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoseFormatError {
    #[error("expected at least two fields, found {0}")]
    TooFewFields(usize),

    #[error("field {index} is not a finite number: {value:?}")]
    InvalidNumber { index: usize, value: String },
}

/// Horizontal part of an SDF `<pose>`, in metres.
///
/// SDF poses are `x y z roll pitch yaw` in the world's North-West-Up frame.
/// Only `x` and `y` are kept; the remaining fields are neither parsed nor validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanarOffset {
    pub x: f64,
    pub y: f64,
}

impl PlanarOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Parse whitespace-separated pose text.
    pub fn parse(text: &str) -> Result<Self, PoseFormatError> {
        let fields: Vec<&str> = text.split_whitespace().take(2).collect();
        if fields.len() < 2 {
            return Err(PoseFormatError::TooFewFields(fields.len()));
        }

        Ok(Self {
            x: parse_field(fields[0], 0)?,
            y: parse_field(fields[1], 1)?,
        })
    }

    /// True when the offset sits exactly on the world origin.
    ///
    /// Exact comparison: an object placed a hair away from 0,0 still counts.
    pub fn is_origin(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl fmt::Display for PlanarOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

fn parse_field(value: &str, index: usize) -> Result<f64, PoseFormatError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PoseFormatError::InvalidNumber {
            index,
            value: value.to_string(),
        })
}

/// A named model placement extracted from a world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenePose {
    pub name: String,
    pub offset: PlanarOffset,
}
