use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game::error::{Endpoint, NavError, Rejection};
use crate::game::grid::GridPos;
use crate::game::math::FixedVec2;

/// Ordered cells from start to goal, both inclusive. Never empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPath {
    cells: Vec<GridPos>,
}

impl GridPath {
    /// `cells` must be non-empty and start→goal ordered.
    pub(super) fn from_cells(cells: Vec<GridPos>) -> Self {
        debug_assert!(!cells.is_empty(), "a path always holds at least its start cell");
        Self { cells }
    }

    pub fn cells(&self) -> &[GridPos] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.cells.iter().copied()
    }

    pub fn start(&self) -> GridPos {
        self.cells[0]
    }

    pub fn goal(&self) -> GridPos {
        self.cells[self.cells.len() - 1]
    }

    /// Number of cells, endpoints included.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of moves between cells (`len() - 1`).
    pub fn steps(&self) -> usize {
        self.cells.len() - 1
    }

    pub fn into_cells(self) -> Vec<GridPos> {
        self.cells
    }
}

/// Result of a search that was allowed to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanOutcome {
    Found(GridPath),
    /// The frontier ran dry before reaching the goal.
    Unreachable,
}

impl PlanOutcome {
    pub fn path(&self) -> Option<&GridPath> {
        match self {
            PlanOutcome::Found(path) => Some(path),
            PlanOutcome::Unreachable => None,
        }
    }

    pub fn into_path(self) -> Option<GridPath> {
        match self {
            PlanOutcome::Found(path) => Some(path),
            PlanOutcome::Unreachable => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PlanOutcome::Found(_))
    }
}

/// Why a [`PathRequest`] produced no path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathFailure {
    /// The search ran and exhausted the frontier.
    Unreachable,
    /// The request was refused before searching.
    Rejected { endpoint: Endpoint, rejection: Rejection },
}

impl PathFailure {
    pub(super) fn from_error(err: &NavError) -> Option<Self> {
        match err {
            NavError::InvalidCoordinate { endpoint, rejection, .. } => Some(PathFailure::Rejected {
                endpoint: *endpoint,
                rejection: *rejection,
            }),
            _ => None,
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Ask for a fresh path from the entity's current position to `goal`.
#[derive(Event, Message, Debug, Clone)]
pub struct PathRequest {
    pub entity: Entity,
    pub goal: FixedVec2,
}

/// Flip (`None`) or set a cell's walkability before the next planning pass.
#[derive(Event, Message, Debug, Clone)]
pub struct WalkabilityToggle {
    pub cell: GridPos,
    pub walkable: Option<bool>,
}

/// A path request ended without a path; the entity's follower was halted.
#[derive(Event, Message, Debug, Clone)]
pub struct PathUnavailable {
    pub entity: Entity,
    pub reason: PathFailure,
}

/// Keep re-planning towards another entity's position.
///
/// Every `replan_every` ticks a full [`PathRequest`] is issued for the target's
/// current position. 0 uses the configured default interval.
#[derive(Component, Debug, Clone, Copy)]
pub struct ChaseTarget {
    pub target: Entity,
    pub replan_every: u32,
}

impl ChaseTarget {
    /// Chase `target` at the configured replan interval.
    pub fn new(target: Entity) -> Self {
        Self { target, replan_every: 0 }
    }
}
