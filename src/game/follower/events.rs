//! Signals emitted by the movement systems.

use bevy::prelude::*;

use crate::game::grid::GridPos;

/// The entity reached the last waypoint of its path. Sent once per path.
#[derive(Event, Message, Debug, Clone)]
pub struct PathCompleted {
    pub entity: Entity,
}

/// The entity's follower gave up: the next cell was blocked after planning, or the
/// entity stopped making progress. `cell` is the waypoint it was heading for, if known.
#[derive(Event, Message, Debug, Clone)]
pub struct PathStalled {
    pub entity: Entity,
    pub cell: Option<GridPos>,
}
