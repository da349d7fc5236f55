use bevy::prelude::*;

use crate::game::config::NavSettings;
use crate::game::grid::Grid;
use crate::game::profiling::profile;
use crate::game::NavTick;
use crate::profile_log;
use super::components::{FollowStep, PathFollower, SimPosition, SimPositionPrev};
use super::events::{PathCompleted, PathStalled};

/// Remember where every entity started this tick, for [`sync_visuals`].
pub fn cache_previous_positions(mut query: Query<(&mut SimPositionPrev, &SimPosition)>) {
    for (mut prev, pos) in query.iter_mut() {
        prev.0 = pos.0;
    }
}

/// Advance every follower by one fixed tick.
///
/// A follower whose next waypoint was blocked after planning halts before moving and
/// reports [`PathStalled`] with that cell. Completion and no-progress stalls come
/// straight from [`PathFollower::advance`].
#[profile(2)]
pub fn follow_paths(
    mut followers: Query<(Entity, &mut SimPosition, &mut PathFollower)>,
    settings: Res<NavSettings>,
    grid: Option<Res<Grid>>,
    mut completed: MessageWriter<PathCompleted>,
    mut stalled: MessageWriter<PathStalled>,
    tick: Res<NavTick>,
) {
    let dt = settings.tick_delta();
    #[cfg(feature = "perf_stats")]
    let mut moving = 0usize;

    for (entity, mut position, mut follower) in followers.iter_mut() {
        if follower.is_idle() {
            continue;
        }

        let heading_for = follower.current_waypoint().map(|w| w.cell);
        if let (Some(grid), Some(cell)) = (grid.as_deref(), heading_for) {
            if !grid.is_walkable(cell) {
                warn!("[FOLLOWER] {:?}: next cell {:?} is blocked, halting", entity, cell);
                follower.stop();
                stalled.write(PathStalled {
                    entity,
                    cell: Some(cell),
                });
                continue;
            }
        }

        match follower.advance(&mut position.0, dt) {
            FollowStep::Completed => {
                debug!("[FOLLOWER] {:?} arrived at {:?}", entity, heading_for);
                completed.write(PathCompleted { entity });
            }
            FollowStep::Stalled => {
                warn!("[FOLLOWER] {:?} made no progress towards {:?}, halting", entity, heading_for);
                stalled.write(PathStalled {
                    entity,
                    cell: heading_for,
                });
            }
            FollowStep::WaypointReached(index) => {
                trace!("[FOLLOWER] {:?} reached waypoint {}", entity, index);
                #[cfg(feature = "perf_stats")]
                {
                    moving += 1;
                }
            }
            FollowStep::Moving => {
                #[cfg(feature = "perf_stats")]
                {
                    moving += 1;
                }
            }
            FollowStep::Idle => {}
        }
    }

    profile_log!(tick, "[FOLLOWER] {} followers moving", moving);
}

/// Interpolate rendered positions between the last two fixed ticks.
pub fn sync_visuals(
    mut query: Query<(&mut Transform, &SimPosition, &SimPositionPrev)>,
    fixed_time: Res<Time<Fixed>>,
) {
    let alpha = fixed_time.overstep_fraction();
    for (mut transform, pos, prev_pos) in query.iter_mut() {
        let interpolated = prev_pos.0.to_vec2().lerp(pos.0.to_vec2(), alpha);
        transform.translation.x = interpolated.x;
        transform.translation.z = interpolated.y;
    }
}
