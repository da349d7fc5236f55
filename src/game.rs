use bevy::prelude::*;

pub mod config;
pub mod error;
pub mod follower;
pub mod grid;
pub mod map;
pub mod math;
pub mod pathfinding;
pub mod profiling;

use follower::FollowerPlugin;
use pathfinding::PathfindingPlugin;

pub use config::{NavConfigPlugin, NavSettings};

/// Ordering of the navigation systems inside `FixedUpdate`.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum NavSet {
    Input,    // Walkability edits and chase requests
    Planning, // A* for pending path requests
    Movement, // Followers advance one tick
}

/// Number of fixed ticks simulated so far.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavTick(pub u64);

impl NavTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Runs first in `FixedUpdate` so every navigation system sees the current tick.
pub fn increment_nav_tick(mut tick: ResMut<NavTick>) {
    tick.increment();
}

/// Grid navigation: walkability edits, A* planning and path following.
///
/// The [`grid::Grid`] resource is not created here. Insert one yourself or add
/// [`NavConfigPlugin`] to build it from the startup config.
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavTick>();
        app.init_resource::<NavSettings>();

        app.configure_sets(
            FixedUpdate,
            (NavSet::Input, NavSet::Planning, NavSet::Movement).chain(),
        );
        app.add_systems(FixedUpdate, increment_nav_tick.before(NavSet::Input));

        app.add_plugins((PathfindingPlugin, FollowerPlugin));
    }
}
