use serde::{Deserialize, Serialize};

use crate::game::math::FixedNum;

/// Cost-so-far of a node no search has reached yet.
pub const UNREACHED: FixedNum = FixedNum::MAX;

/// Integer coordinates of a grid cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, PartialOrd, Ord)]
pub struct GridPos {
    pub x: usize,
    pub y: usize,
}

impl GridPos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: GridPos) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// True for the 8 cells around `self` (not `self`).
    pub fn is_adjacent(self, other: GridPos, allow_diagonals: bool) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        match (dx, dy) {
            (1, 0) | (0, 1) => true,
            (1, 1) => allow_diagonals,
            _ => false,
        }
    }
}

impl From<(usize, usize)> for GridPos {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

/// One grid cell: fixed identity, walkability, and the bookkeeping of the most recent
/// search.
///
/// Only [`Grid`](super::Grid) hands out nodes. Search fields are written by the
/// planner and are meaningless once [`Grid::reset_search_state`](super::Grid::reset_search_state)
/// runs again.
#[derive(Clone, Debug)]
pub struct Node {
    pos: GridPos,
    walkable: bool,
    g_cost: FixedNum,
    h_cost: FixedNum,
    parent: Option<GridPos>,
}

impl Node {
    pub(super) fn new(pos: GridPos, walkable: bool) -> Self {
        Self {
            pos,
            walkable,
            g_cost: UNREACHED,
            h_cost: FixedNum::ZERO,
            parent: None,
        }
    }

    pub fn pos(&self) -> GridPos {
        self.pos
    }

    pub fn x(&self) -> usize {
        self.pos.x
    }

    pub fn y(&self) -> usize {
        self.pos.y
    }

    pub fn is_walkable(&self) -> bool {
        self.walkable
    }

    pub fn g_cost(&self) -> FixedNum {
        self.g_cost
    }

    pub fn h_cost(&self) -> FixedNum {
        self.h_cost
    }

    /// `g + h`. Saturates for nodes the current search has not reached.
    pub fn f_cost(&self) -> FixedNum {
        self.g_cost.saturating_add(self.h_cost)
    }

    pub fn parent(&self) -> Option<GridPos> {
        self.parent
    }

    pub fn is_reached(&self) -> bool {
        self.g_cost != UNREACHED
    }

    pub(super) fn set_walkable(&mut self, walkable: bool) {
        self.walkable = walkable;
    }

    pub(super) fn reset_search_state(&mut self) {
        self.g_cost = UNREACHED;
        self.h_cost = FixedNum::ZERO;
        self.parent = None;
    }

    pub(crate) fn mark_start(&mut self, h_cost: FixedNum) {
        self.g_cost = FixedNum::ZERO;
        self.h_cost = h_cost;
        self.parent = None;
    }

    pub(crate) fn relax(&mut self, parent: GridPos, g_cost: FixedNum, h_cost: FixedNum) {
        self.parent = Some(parent);
        self.g_cost = g_cost;
        self.h_cost = h_cost;
    }
}
