use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::error::{Endpoint, NavError, Rejection};
use crate::game::grid::{Direction, EdgeCosts, Grid, GridPos};
use crate::game::math::{FixedNum, FixedVec2};
use crate::game::profiling::profile;
use super::frontier::Frontier;
use super::trace::SearchObserver;
use super::types::{GridPath, PlanOutcome};

/// Expansions above which a single search is logged as suspiciously expensive.
const HIGH_EXPANSION_WARNING: usize = 10_000;

/// A* planner over a [`Grid`].
///
/// Every call starts from a clean slate: the grid's per-node search state is reset
/// first, so leftovers from an earlier search never leak into the next one. Taking the
/// grid as `&mut` also means only one search can run on a grid at a time.
///
/// # Cost model
///
/// Steps cost whatever [`EdgeCosts`] says for their direction. With orthogonal moves
/// only, the estimate is the Manhattan distance scaled by the cheapest orthogonal step,
/// which is admissible and consistent. With diagonals it is the octile distance built
/// from the same table, taking a diagonal as no dearer than two orthogonal steps.
///
/// # Ordering
///
/// Lowest f first; ties go to the lower h (greedy towards the goal), then to the
/// earlier admission. Neighbor enumeration order is fixed by the grid, so identical
/// inputs always give identical paths.
///
/// # Complexity
///
/// O(V log V) in the number of cells: a binary heap with lazy deletion for the
/// frontier and a bitset for the closed set.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathPlanner {
    pub allow_diagonals: bool,
    pub edge_costs: EdgeCosts,
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self {
            allow_diagonals: false,
            edge_costs: EdgeCosts::uniform(),
        }
    }
}

impl PathPlanner {
    pub fn new(allow_diagonals: bool, edge_costs: EdgeCosts) -> Self {
        Self { allow_diagonals, edge_costs }
    }

    /// Estimated remaining cost from `from` to `goal`.
    pub fn heuristic(&self, from: GridPos, goal: GridPos) -> FixedNum {
        let dx = from.x.abs_diff(goal.x);
        let dy = from.y.abs_diff(goal.y);
        let straight = self.edge_costs.min_orthogonal();

        if !self.allow_diagonals {
            return FixedNum::from_num(dx + dy) * straight;
        }

        let diagonal = self.edge_costs.min_diagonal().min(straight * FixedNum::from_num(2));
        // a diagonal zigzag can cover the leftover straight run too
        let leftover = straight.min(diagonal);
        let (short, long) = if dx < dy { (dx, dy) } else { (dy, dx) };
        FixedNum::from_num(short) * diagonal + FixedNum::from_num(long - short) * leftover
    }

    pub fn find_path(
        &self,
        grid: &mut Grid,
        start: GridPos,
        goal: GridPos,
    ) -> Result<PlanOutcome, NavError> {
        self.find_path_observed(grid, start, goal, &mut ())
    }

    /// [`find_path`](Self::find_path) for world positions, converted with
    /// [`Grid::world_to_grid`].
    pub fn find_path_world(
        &self,
        grid: &mut Grid,
        start: FixedVec2,
        goal: FixedVec2,
        observer: &mut dyn SearchObserver,
    ) -> Result<PlanOutcome, NavError> {
        let start = grid
            .world_to_grid(start)
            .map_err(|e| e.for_endpoint(Endpoint::Start))?;
        let goal = grid
            .world_to_grid(goal)
            .map_err(|e| e.for_endpoint(Endpoint::Goal))?;
        self.find_path_observed(grid, start, goal, observer)
    }

    /// Search from `start` to `goal`, reporting frontier activity to `observer`.
    ///
    /// Endpoints that are off the grid or blocked are refused with
    /// [`NavError::InvalidCoordinate`] before any search state is touched. A search
    /// that runs out of frontier returns `Ok(PlanOutcome::Unreachable)`.
    #[profile(2)]
    pub fn find_path_observed(
        &self,
        grid: &mut Grid,
        start: GridPos,
        goal: GridPos,
        observer: &mut dyn SearchObserver,
    ) -> Result<PlanOutcome, NavError> {
        check_endpoint(grid, start, Endpoint::Start)?;
        check_endpoint(grid, goal, Endpoint::Goal)?;

        grid.reset_search_state();

        let mut closed = FixedBitSet::with_capacity(grid.len());
        let mut frontier = Frontier::new();

        let start_h = self.heuristic(start, goal);
        grid.node_mut(start)?.mark_start(start_h);
        frontier.push(start, FixedNum::ZERO, start_h);
        observer.on_open(start);

        let mut expanded = 0usize;

        while let Some(entry) = frontier.pop() {
            let current = entry.pos;
            let current_idx = grid.get_index(current);
            if closed.contains(current_idx) {
                continue;
            }
            let current_g = grid.get_node(current)?.g_cost();
            if entry.g_cost != current_g {
                // superseded by a cheaper admission
                continue;
            }

            if current == goal {
                warn_if_expensive(start, goal, expanded);
                debug!(
                    "[PATHFINDING] {:?} -> {:?}: cost {} after {} expansions",
                    start, goal, current_g, expanded
                );
                return reconstruct_path(grid, start, goal).map(PlanOutcome::Found);
            }

            closed.insert(current_idx);
            observer.on_closed(current);
            expanded += 1;

            let candidates: SmallVec<[(GridPos, Direction); 8]> = grid
                .neighbors(current, self.allow_diagonals)
                .filter(|(node, _)| node.is_walkable())
                .map(|(node, dir)| (node.pos(), dir))
                .collect();

            for (neighbor, direction) in candidates {
                if closed.contains(grid.get_index(neighbor)) {
                    continue;
                }

                let tentative_g = current_g + self.edge_costs.cost(direction);
                let node = grid.node_mut(neighbor)?;
                if tentative_g < node.g_cost() {
                    let h = self.heuristic(neighbor, goal);
                    node.relax(current, tentative_g, h);
                    frontier.push(neighbor, tentative_g, h);
                    observer.on_open(neighbor);
                }
            }
        }

        warn_if_expensive(start, goal, expanded);
        debug!(
            "[PATHFINDING] {:?} -> {:?}: unreachable after {} expansions",
            start, goal, expanded
        );
        Ok(PlanOutcome::Unreachable)
    }
}

fn warn_if_expensive(start: GridPos, goal: GridPos, expanded: usize) {
    if expanded > HIGH_EXPANSION_WARNING {
        warn!(
            "[PATHFINDING] A* used {} expansions for {:?} -> {:?} (high!)",
            expanded, start, goal
        );
    }
}

fn check_endpoint(grid: &Grid, pos: GridPos, endpoint: Endpoint) -> Result<(), NavError> {
    let node = grid.get_node(pos).map_err(|e| e.for_endpoint(endpoint))?;
    if !node.is_walkable() {
        return Err(NavError::InvalidCoordinate {
            endpoint,
            x: pos.x as i64,
            y: pos.y as i64,
            rejection: Rejection::Blocked,
        });
    }
    Ok(())
}

/// Walk parent links from `goal` back to `start` and return them start-first.
fn reconstruct_path(grid: &Grid, start: GridPos, goal: GridPos) -> Result<GridPath, NavError> {
    let mut cells = vec![goal];
    let mut current = goal;

    while current != start {
        let Some(parent) = grid.get_node(current)?.parent() else {
            break;
        };
        cells.push(parent);
        current = parent;
        // parent links form a tree rooted at start; more links than cells means a cycle
        if cells.len() > grid.len() {
            error!("[PATHFINDING] Parent chain from {:?} does not reach {:?}", goal, start);
            break;
        }
    }

    cells.reverse();
    Ok(GridPath::from_cells(cells))
}
