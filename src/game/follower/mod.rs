mod components;
mod events;
mod systems;


pub use components::{FollowStep, FollowerState, PathFollower, SimPosition, SimPositionPrev, Waypoint};
pub use events::{PathCompleted, PathStalled};
pub use systems::{cache_previous_positions, follow_paths, sync_visuals};

use bevy::prelude::*;
use crate::game::NavSet;

pub struct FollowerPlugin;

impl Plugin for FollowerPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<PathCompleted>();
        app.add_message::<PathStalled>();
        app.add_systems(
            FixedUpdate,
            (systems::cache_previous_positions, systems::follow_paths)
                .chain()
                .in_set(NavSet::Movement),
        );
        app.add_systems(Update, systems::sync_visuals);
    }
}
