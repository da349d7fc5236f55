mod astar;
mod frontier;
mod systems;
mod trace;
mod types;


// ============================================================================
// PUBLIC API
// ============================================================================

pub use astar::PathPlanner;
pub use systems::{apply_walkability_toggles, process_path_requests, request_chase_paths};
pub use trace::{SearchObserver, SearchTrace};
pub use types::{
    ChaseTarget, GridPath, PathFailure, PathRequest, PathUnavailable, PlanOutcome,
    WalkabilityToggle,
};

use bevy::prelude::*;
use crate::game::NavSet;

pub struct PathfindingPlugin;

impl Plugin for PathfindingPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<PathRequest>();
        app.add_message::<WalkabilityToggle>();
        app.add_message::<PathUnavailable>();
        app.init_resource::<PathPlanner>();
        app.add_systems(
            FixedUpdate,
            (systems::apply_walkability_toggles, systems::request_chase_paths)
                .chain()
                .in_set(NavSet::Input),
        );
        app.add_systems(FixedUpdate, systems::process_path_requests.in_set(NavSet::Planning));
    }
}
