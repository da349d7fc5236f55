//! Components moved by the path follower.

use bevy::prelude::*;

use crate::game::config::NavSettings;
use crate::game::grid::{Grid, GridPos};
use crate::game::math::{FixedNum, FixedVec2};
use crate::game::pathfinding::GridPath;

// ============================================================================
// Position Components
// ============================================================================

/// Logical ground-plane position of an entity (world X, world Z).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SimPosition(pub FixedVec2);

/// Position at the start of the current tick, for interpolation.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SimPositionPrev(pub FixedVec2);

// ============================================================================
// Path Following
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FollowerState {
    #[default]
    Idle,
    /// Heading for the waypoint at this index.
    Following(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Waypoint {
    pub cell: GridPos,
    pub position: FixedVec2,
}

/// What one [`PathFollower::advance`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowStep {
    /// Nothing to follow.
    Idle,
    /// Moved towards the current waypoint without reaching it.
    Moving,
    /// Reached the waypoint at this index; the next one is now current.
    WaypointReached(usize),
    /// Reached the last waypoint. Reported once per path.
    Completed,
    /// Made no progress for too long and gave up.
    Stalled,
}

/// Walks an entity along a planned path at constant speed.
///
/// `follow` always replaces the current path. `advance` is called once per tick by the
/// movement system and moves the position towards the current waypoint; a waypoint
/// counts as reached once the entity is within `arrival_epsilon` of it, and the
/// position is then set exactly onto it.
#[derive(Component, Debug, Clone)]
pub struct PathFollower {
    waypoints: Vec<Waypoint>,
    state: FollowerState,
    stalled_ticks: u32,
    /// World units per second.
    pub speed: FixedNum,
    pub arrival_epsilon: FixedNum,
    /// A first waypoint this close to the entity when a path is handed over is skipped.
    pub start_snap_epsilon: FixedNum,
    /// Ticks without progress before the follower halts.
    pub stall_limit: u32,
}

impl Default for PathFollower {
    fn default() -> Self {
        Self::from_settings(&NavSettings::default())
    }
}

impl PathFollower {
    pub fn new(speed: FixedNum) -> Self {
        Self {
            speed,
            ..Default::default()
        }
    }

    pub fn from_settings(settings: &NavSettings) -> Self {
        Self {
            waypoints: Vec::new(),
            state: FollowerState::Idle,
            stalled_ticks: 0,
            speed: settings.move_speed,
            arrival_epsilon: settings.arrival_epsilon,
            start_snap_epsilon: settings.start_snap_epsilon,
            stall_limit: settings.stall_tick_limit,
        }
    }

    pub fn state(&self) -> FollowerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == FollowerState::Idle
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        match self.state {
            FollowerState::Following(i) => self.waypoints.get(i),
            FollowerState::Idle => None,
        }
    }

    /// Waypoints not consumed yet, current one first.
    pub fn remaining(&self) -> &[Waypoint] {
        match self.state {
            FollowerState::Following(i) => &self.waypoints[i.min(self.waypoints.len())..],
            FollowerState::Idle => &[],
        }
    }

    /// Follow `path`, converting its cells to world positions on `grid`.
    pub fn follow(&mut self, path: &GridPath, grid: &Grid, position: FixedVec2) {
        let waypoints = path
            .iter()
            .map(|cell| Waypoint {
                cell,
                position: grid.grid_to_world(cell),
            })
            .collect();
        self.follow_waypoints(waypoints, position);
    }

    /// Replace any path in progress. An empty list leaves the follower idle.
    ///
    /// The first waypoint is skipped when the entity already stands on it, or when the
    /// entity was heading for the new path's second waypoint anyway (a replan from the
    /// cell it just left).
    pub fn follow_waypoints(&mut self, waypoints: Vec<Waypoint>, position: FixedVec2) {
        let heading_for = self.current_waypoint().map(|w| w.cell);
        self.waypoints = waypoints;
        self.stalled_ticks = 0;

        let Some(first) = self.waypoints.first() else {
            self.state = FollowerState::Idle;
            return;
        };

        let skip_first = self.waypoints.len() > 1
            && (position.within(first.position, self.start_snap_epsilon)
                || heading_for == Some(self.waypoints[1].cell));
        self.state = FollowerState::Following(usize::from(skip_first));
    }

    /// Drop the current path, if any.
    pub fn stop(&mut self) {
        self.waypoints.clear();
        self.state = FollowerState::Idle;
        self.stalled_ticks = 0;
    }

    /// Move `position` one tick of `dt` seconds along the path.
    pub fn advance(&mut self, position: &mut FixedVec2, dt: FixedNum) -> FollowStep {
        let FollowerState::Following(index) = self.state else {
            return FollowStep::Idle;
        };
        let Some(target) = self.waypoints.get(index).map(|w| w.position) else {
            self.stop();
            return FollowStep::Idle;
        };

        if position.within(target, self.arrival_epsilon) {
            *position = target;
            return self.consume(index);
        }

        let before = *position;
        *position = position.move_towards(target, self.speed * dt);

        if position.within(target, self.arrival_epsilon) {
            *position = target;
            return self.consume(index);
        }

        if *position == before {
            self.stalled_ticks += 1;
            if self.stalled_ticks >= self.stall_limit {
                self.stop();
                return FollowStep::Stalled;
            }
        } else {
            self.stalled_ticks = 0;
        }
        FollowStep::Moving
    }

    fn consume(&mut self, index: usize) -> FollowStep {
        self.stalled_ticks = 0;
        let next = index + 1;
        if next >= self.waypoints.len() {
            self.stop();
            return FollowStep::Completed;
        }
        self.state = FollowerState::Following(next);
        FollowStep::WaypointReached(index)
    }
}
