use bevy::prelude::*;

use crate::game::config::NavSettings;
use crate::game::error::NavError;
use crate::game::follower::{PathFollower, SimPosition};
use crate::game::grid::Grid;
use crate::game::profiling::profile;
use crate::game::NavTick;
use super::astar::PathPlanner;
use super::trace::SearchTrace;
use super::types::{ChaseTarget, PathFailure, PathRequest, PathUnavailable, PlanOutcome, WalkabilityToggle};

/// Apply queued walkability edits. Runs before planning so the same tick's requests
/// already see the new layout.
pub fn apply_walkability_toggles(
    mut toggles: MessageReader<WalkabilityToggle>,
    grid: Option<ResMut<Grid>>,
) -> Result {
    if toggles.is_empty() {
        return Ok(());
    }
    let Some(mut grid) = grid else {
        return Err(NavError::MissingDependency("Grid resource").into());
    };

    for toggle in toggles.read() {
        let result = match toggle.walkable {
            Some(walkable) => grid.set_walkable(toggle.cell, walkable).map(|_| walkable),
            None => grid.toggle_walkable(toggle.cell),
        };
        match result {
            Ok(walkable) => debug!("[PATHFINDING] Cell {:?} walkable = {}", toggle.cell, walkable),
            Err(e) => warn!("[PATHFINDING] Ignoring walkability toggle: {}", e),
        }
    }
    Ok(())
}

/// Issue a fresh path request for every chaser whose replan interval elapsed.
/// A `replan_every` of 0 falls back to [`NavSettings::chase_replan_interval`].
pub fn request_chase_paths(
    chasers: Query<(Entity, &ChaseTarget)>,
    targets: Query<&SimPosition>,
    settings: Res<NavSettings>,
    tick: Res<NavTick>,
    mut requests: MessageWriter<PathRequest>,
) {
    for (entity, chase) in chasers.iter() {
        let interval = match chase.replan_every {
            0 => settings.chase_replan_interval,
            n => n,
        };
        let every = u64::from(interval.max(1));
        if tick.0 % every != 0 {
            continue;
        }
        match targets.get(chase.target) {
            Ok(target) => {
                requests.write(PathRequest { entity, goal: target.0 });
            }
            Err(_) => {
                warn!("[PATHFINDING] Chase target {:?} of {:?} has no position", chase.target, entity);
            }
        }
    }
}

/// Plan every pending request from the requester's current position and hand the
/// result to its follower.
///
/// A found path preempts whatever the follower was doing. Unreachable or rejected
/// requests halt the follower and emit [`PathUnavailable`]. Without a [`Grid`] resource
/// this fails with [`NavError::MissingDependency`].
#[profile(2)]
pub fn process_path_requests(
    mut requests: MessageReader<PathRequest>,
    grid: Option<ResMut<Grid>>,
    planner: Res<PathPlanner>,
    mut trace: Option<ResMut<SearchTrace>>,
    mut agents: Query<(&SimPosition, &mut PathFollower)>,
    mut unavailable: MessageWriter<PathUnavailable>,
) -> Result {
    if requests.is_empty() {
        return Ok(());
    }
    let Some(mut grid) = grid else {
        return Err(NavError::MissingDependency("Grid resource").into());
    };

    let start_time = std::time::Instant::now();
    let request_count = requests.len();

    for request in requests.read() {
        let Ok((position, mut follower)) = agents.get_mut(request.entity) else {
            error!(
                "[PATHFINDING] Path request for {:?}, which has no SimPosition/PathFollower",
                request.entity
            );
            continue;
        };

        let outcome = match trace.as_deref_mut() {
            Some(trace) => {
                trace.clear();
                planner.find_path_world(&mut grid, position.0, request.goal, trace)
            }
            None => planner.find_path_world(&mut grid, position.0, request.goal, &mut ()),
        };

        match outcome {
            Ok(PlanOutcome::Found(path)) => {
                debug!(
                    "[PATHFINDING] {:?}: {} steps from {:?} to {:?}",
                    request.entity,
                    path.steps(),
                    path.start(),
                    path.goal()
                );
                follower.follow(&path, &grid, position.0);
            }
            Ok(PlanOutcome::Unreachable) => {
                info!("[PATHFINDING] No path for {:?} to {:?}", request.entity, request.goal);
                follower.stop();
                unavailable.write(PathUnavailable {
                    entity: request.entity,
                    reason: PathFailure::Unreachable,
                });
            }
            Err(err) => {
                let Some(reason) = PathFailure::from_error(&err) else {
                    return Err(err.into());
                };
                warn!("[PATHFINDING] Rejected path request for {:?}: {}", request.entity, err);
                follower.stop();
                unavailable.write(PathUnavailable {
                    entity: request.entity,
                    reason,
                });
            }
        }
    }

    let total_duration = start_time.elapsed();
    if total_duration.as_millis() > 100 {
        warn!(
            "[PATHFINDING] Slow batch processing: {:?} for {} requests",
            total_duration, request_count
        );
    }
    Ok(())
}
