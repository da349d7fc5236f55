use serde::{Deserialize, Serialize};

use crate::game::error::NavError;
use crate::game::math::FixedNum;
use super::{Grid, GridPos, Node};

/// Step directions between adjacent cells. `North` is +y, which is world +Z.
///
/// The discriminants follow the neighbor enumeration order, so they double as
/// indices into [`EdgeCosts`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East = 0,
    West = 1,
    North = 2,
    South = 3,
    NorthEast = 4,
    NorthWest = 5,
    SouthEast = 6,
    SouthWest = 7,
}

impl Direction {
    /// Orthogonal directions in enumeration order.
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
    ];

    /// All eight directions in enumeration order (orthogonals first).
    pub const ALL: [Direction; 8] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    #[inline]
    pub fn as_index(self) -> usize {
        self as usize
    }

    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::NorthEast => (1, 1),
            Direction::NorthWest => (-1, 1),
            Direction::SouthEast => (1, -1),
            Direction::SouthWest => (-1, -1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        self.as_index() >= 4
    }

    /// The cell one step from `pos` in this direction, if it has non-negative
    /// coordinates. Upper bounds are the grid's business.
    pub fn step(self, pos: GridPos) -> Option<GridPos> {
        let (dx, dy) = self.offset();
        Some(GridPos::new(
            pos.x.checked_add_signed(dx)?,
            pos.y.checked_add_signed(dy)?,
        ))
    }
}

/// Cost of a single step, per direction. Every cost is strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[FixedNum; 8]", into = "[FixedNum; 8]")]
pub struct EdgeCosts([FixedNum; 8]);

impl EdgeCosts {
    /// One cost for the orthogonal steps and one for the diagonals. Fails with
    /// [`NavError::InvalidEdgeCost`] when either is zero or negative.
    pub fn new(orthogonal: FixedNum, diagonal: FixedNum) -> Result<Self, NavError> {
        Self::try_from(Self::fill(orthogonal, diagonal))
    }

    fn fill(orthogonal: FixedNum, diagonal: FixedNum) -> [FixedNum; 8] {
        let mut costs = [orthogonal; 8];
        for dir in Direction::ALL.iter().filter(|d| d.is_diagonal()) {
            costs[dir.as_index()] = diagonal;
        }
        costs
    }

    /// Every step costs 1, diagonals included.
    pub fn uniform() -> Self {
        Self(Self::fill(FixedNum::ONE, FixedNum::ONE))
    }

    /// Orthogonal steps cost 1, diagonal steps cost √2.
    pub fn octile() -> Self {
        Self(Self::fill(FixedNum::ONE, FixedNum::from_num(std::f64::consts::SQRT_2)))
    }

    pub fn with_direction(mut self, direction: Direction, cost: FixedNum) -> Result<Self, NavError> {
        check_cost(direction, cost)?;
        self.0[direction.as_index()] = cost;
        Ok(self)
    }

    #[inline]
    pub fn cost(&self, direction: Direction) -> FixedNum {
        self.0[direction.as_index()]
    }

    /// Cheapest orthogonal step.
    pub fn min_orthogonal(&self) -> FixedNum {
        Direction::ORTHOGONAL
            .iter()
            .map(|d| self.cost(*d))
            .min()
            .unwrap_or(FixedNum::ONE)
    }

    /// Cheapest diagonal step.
    pub fn min_diagonal(&self) -> FixedNum {
        Direction::ALL
            .iter()
            .filter(|d| d.is_diagonal())
            .map(|d| self.cost(*d))
            .min()
            .unwrap_or(FixedNum::ONE)
    }
}

fn check_cost(direction: Direction, cost: FixedNum) -> Result<(), NavError> {
    if cost <= FixedNum::ZERO {
        return Err(NavError::InvalidEdgeCost { direction, cost });
    }
    Ok(())
}

impl TryFrom<[FixedNum; 8]> for EdgeCosts {
    type Error = NavError;

    fn try_from(costs: [FixedNum; 8]) -> Result<Self, Self::Error> {
        for direction in Direction::ALL {
            check_cost(direction, costs[direction.as_index()])?;
        }
        Ok(Self(costs))
    }
}

impl From<EdgeCosts> for [FixedNum; 8] {
    fn from(costs: EdgeCosts) -> Self {
        costs.0
    }
}

impl Default for EdgeCosts {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Lazy walk over the in-bounds neighbors of one cell.
///
/// Yields each neighbor with the direction that reaches it, in [`Direction::ALL`]
/// order (truncated to the orthogonals unless diagonals are allowed). Cloning gives an
/// independent cursor, so the sequence can be restarted at will.
#[derive(Clone)]
pub struct Neighbors<'a> {
    grid: &'a Grid,
    origin: GridPos,
    directions: &'static [Direction],
    next: usize,
}

impl<'a> Neighbors<'a> {
    pub(super) fn new(grid: &'a Grid, origin: GridPos, allow_diagonals: bool) -> Self {
        let directions: &'static [Direction] = if !grid.contains(origin) {
            &[]
        } else if allow_diagonals {
            &Direction::ALL
        } else {
            &Direction::ORTHOGONAL
        };
        Self { grid, origin, directions, next: 0 }
    }
}

impl<'a> Iterator for Neighbors<'a> {
    type Item = (&'a Node, Direction);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&direction) = self.directions.get(self.next) {
            self.next += 1;
            let Some(pos) = direction.step(self.origin) else {
                continue;
            };
            if let Ok(node) = self.grid.get_node(pos) {
                return Some((node, direction));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.directions.len().saturating_sub(self.next)))
    }
}
