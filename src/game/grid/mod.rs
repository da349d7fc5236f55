//! Walkability grid: the cell matrix, walkability edits, and world↔grid conversion.
//!
//! # Coordinate convention
//!
//! Cell `(x, y)` is centered at world `(x * cell_size, 0, y * cell_size)`: the grid's
//! second axis runs along world Z (depth), not height. Converting a world point back
//! to a cell rounds to the nearest cell center, with exact halves rounding away from
//! zero. A point at `x = 0.5 * cell_size` therefore belongs to cell 1, and anything
//! below `-0.5 * cell_size` falls off the grid.

use bevy::prelude::*;
use rand::Rng;

use crate::game::error::NavError;
use crate::game::math::{FixedNum, FixedVec2};

mod neighbors;
mod node;

#[cfg(test)]
mod tests;

pub use neighbors::{Direction, EdgeCosts, Neighbors};
pub use node::{GridPos, Node, UNREACHED};

/// Largest grid [`Grid::new`] will allocate.
pub const MAX_GRID_CELLS: usize = 1 << 26;

/// Fixed-size walkability grid. Sole owner of every [`Node`].
#[derive(Resource, Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    cell_size: FixedNum,
    nodes: Vec<Node>,
}

impl Grid {
    /// Fully walkable `width × height` grid.
    pub fn new(width: usize, height: usize, cell_size: FixedNum) -> Result<Self, NavError> {
        let invalid = || NavError::InvalidDimensions { width, height, cell_size };
        if width == 0 || height == 0 || cell_size <= FixedNum::ZERO {
            return Err(invalid());
        }
        let cells = width
            .checked_mul(height)
            .filter(|&cells| cells <= MAX_GRID_CELLS)
            .ok_or_else(invalid)?;
        // every cell center must stay representable in world space
        let extent = |cells: usize| {
            FixedNum::checked_from_num(cells).and_then(|n| n.checked_mul(cell_size))
        };
        if extent(width).is_none() || extent(height).is_none() {
            return Err(invalid());
        }

        let mut nodes = Vec::with_capacity(cells);
        for y in 0..height {
            for x in 0..width {
                nodes.push(Node::new(GridPos::new(x, y), true));
            }
        }

        Ok(Self { width, height, cell_size, nodes })
    }

    /// Build a grid from text rows. Row `i` is `y = i`; `#` marks a blocked cell and
    /// anything else is walkable. Short rows are padded with walkable cells.
    ///
    /// ```ignore
    /// let grid = Grid::from_ascii(&["...", ".#.", "..."], FixedNum::ONE)?;
    /// ```
    pub fn from_ascii(rows: &[&str], cell_size: FixedNum) -> Result<Self, NavError> {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Self::new(width, rows.len(), cell_size)?;
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    grid.set_walkable(GridPos::new(x, y), false)?;
                }
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> FixedNum {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    #[inline]
    pub fn get_index(&self, pos: GridPos) -> usize {
        pos.y * self.width + pos.x
    }

    fn out_of_bounds(&self, x: i64, y: i64) -> NavError {
        NavError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn get_node(&self, pos: GridPos) -> Result<&Node, NavError> {
        if !self.contains(pos) {
            return Err(self.out_of_bounds(pos.x as i64, pos.y as i64));
        }
        Ok(&self.nodes[self.get_index(pos)])
    }

    pub(crate) fn node_mut(&mut self, pos: GridPos) -> Result<&mut Node, NavError> {
        if !self.contains(pos) {
            return Err(self.out_of_bounds(pos.x as i64, pos.y as i64));
        }
        let idx = self.get_index(pos);
        Ok(&mut self.nodes[idx])
    }

    /// All nodes in row-major order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    /// False for blocked cells and for anything off the grid.
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.get_node(pos).map(Node::is_walkable).unwrap_or(false)
    }

    /// Change a cell's walkability. Pure data: nothing is replanned.
    pub fn set_walkable(&mut self, pos: GridPos, walkable: bool) -> Result<(), NavError> {
        self.node_mut(pos)?.set_walkable(walkable);
        Ok(())
    }

    /// Flip a cell's walkability and return the new value.
    pub fn toggle_walkable(&mut self, pos: GridPos) -> Result<bool, NavError> {
        let node = self.node_mut(pos)?;
        let walkable = !node.is_walkable();
        node.set_walkable(walkable);
        Ok(walkable)
    }

    /// Block each cell independently with probability `density` (clamped to `[0, 1]`,
    /// NaN blocks nothing).
    /// Returns the number of cells blocked.
    pub fn scatter_obstacles(&mut self, density: f64, rng: &mut impl Rng) -> usize {
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        let mut blocked = 0;
        for node in self.nodes.iter_mut() {
            if rng.random_bool(density) {
                node.set_walkable(false);
                blocked += 1;
            }
        }
        blocked
    }

    /// Forget every node's cost, estimate and parent from the previous search.
    pub fn reset_search_state(&mut self) {
        for node in self.nodes.iter_mut() {
            node.reset_search_state();
        }
    }

    /// In-bounds neighbors of `pos` in the fixed enumeration order: +x, -x, +y, -y, then
    /// (+x+y), (-x+y), (+x-y), (-x-y) when diagonals are allowed.
    pub fn neighbors(&self, pos: GridPos, allow_diagonals: bool) -> Neighbors<'_> {
        Neighbors::new(self, pos, allow_diagonals)
    }

    /// Nearest cell to a ground-plane world point (see the module docs for rounding).
    pub fn world_to_grid(&self, world_pos: FixedVec2) -> Result<GridPos, NavError> {
        let to_cell = |v: FixedNum| {
            v.checked_div(self.cell_size)
                .and_then(|c| c.checked_round())
                .map(|c| c.to_num::<i64>())
        };
        let (Some(x), Some(y)) = (to_cell(world_pos.x), to_cell(world_pos.y)) else {
            return Err(NavError::UnrepresentablePosition {
                x: world_pos.x.to_num(),
                y: world_pos.y.to_num(),
            });
        };

        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return Err(self.out_of_bounds(x, y));
        }
        Ok(GridPos::new(x as usize, y as usize))
    }

    /// [`world_to_grid`](Self::world_to_grid) for a 3D world position; height is ignored.
    /// Non-finite or out-of-range coordinates are [`NavError::UnrepresentablePosition`].
    pub fn world_to_grid_3d(&self, world_pos: Vec3) -> Result<GridPos, NavError> {
        let ground = FixedVec2::checked_from_world(world_pos).ok_or(
            NavError::UnrepresentablePosition {
                x: world_pos.x,
                y: world_pos.z,
            },
        )?;
        self.world_to_grid(ground)
    }

    /// Center of a cell on the ground plane.
    pub fn grid_to_world(&self, pos: GridPos) -> FixedVec2 {
        FixedVec2::new(
            FixedNum::from_num(pos.x) * self.cell_size,
            FixedNum::from_num(pos.y) * self.cell_size,
        )
    }

    /// Center of a cell in 3D world space, at ground level.
    pub fn grid_to_world_3d(&self, pos: GridPos) -> Vec3 {
        self.grid_to_world(pos).to_world()
    }
}
