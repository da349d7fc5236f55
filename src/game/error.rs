use std::fmt;

use thiserror::Error;

use crate::game::grid::Direction;
use crate::game::math::FixedNum;

pub type Result<T> = std::result::Result<T, NavError>;

/// Which end of a path request a rejection refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    Goal,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Start => f.write_str("start"),
            Endpoint::Goal => f.write_str("goal"),
        }
    }
}

/// Why an endpoint was refused before any search ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    OutOfBounds,
    Blocked,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::OutOfBounds => f.write_str("outside the grid"),
            Rejection::Blocked => f.write_str("not walkable"),
        }
    }
}

#[derive(Error, Debug)]
pub enum NavError {
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
    #[error("{endpoint} cell ({x}, {y}) is {rejection}")]
    InvalidCoordinate {
        endpoint: Endpoint,
        x: i64,
        y: i64,
        rejection: Rejection,
    },
    #[error("missing required {0}")]
    MissingDependency(&'static str),
    #[error("invalid grid {width}x{height} with cell size {cell_size}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        cell_size: FixedNum,
    },
    #[error("world position ({x}, {y}) cannot be mapped onto the grid")]
    UnrepresentablePosition { x: f32, y: f32 },
    #[error("edge cost {cost} for {direction:?} must be positive")]
    InvalidEdgeCost { direction: Direction, cost: FixedNum },
    #[error("config value {field} = {value} is out of range")]
    InvalidConfig { field: &'static str, value: f64 },
    #[error("map version {found} is not supported (expected {expected})")]
    UnsupportedMapVersion { found: u32, expected: u32 },
    #[error("map layout holds {found} cells, expected {expected}")]
    CorruptMap { found: usize, expected: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Encoding(#[from] bincode::Error),
    #[error(transparent)]
    Config(#[from] ron::error::SpannedError),
}

impl NavError {
    /// Re-tag a grid lookup failure as a rejected path endpoint.
    pub(crate) fn for_endpoint(self, endpoint: Endpoint) -> Self {
        match self {
            NavError::OutOfBounds { x, y, .. } => NavError::InvalidCoordinate {
                endpoint,
                x,
                y,
                rejection: Rejection::OutOfBounds,
            },
            other => other,
        }
    }
}
