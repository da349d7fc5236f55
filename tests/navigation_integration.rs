use bevy::prelude::*;
use gridwalk::game::follower::{PathCompleted, PathFollower, PathStalled, SimPosition, SimPositionPrev};
use gridwalk::game::grid::{Grid, GridPos};
use gridwalk::game::math::{FixedNum, FixedVec2};
use gridwalk::game::pathfinding::{ChaseTarget, PathFailure, PathRequest, PathUnavailable, SearchTrace, WalkabilityToggle};
use gridwalk::game::{NavSet, NavigationPlugin};

/// Signals seen by the test, in arrival order.
#[derive(Resource, Default)]
struct Signals {
    completed: Vec<Entity>,
    stalled: Vec<(Entity, Option<GridPos>)>,
    unavailable: Vec<(Entity, PathFailure)>,
}

fn collect_signals(
    mut signals: ResMut<Signals>,
    mut completed: MessageReader<PathCompleted>,
    mut stalled: MessageReader<PathStalled>,
    mut unavailable: MessageReader<PathUnavailable>,
) {
    signals.completed.extend(completed.read().map(|m| m.entity));
    signals.stalled.extend(stalled.read().map(|m| (m.entity, m.cell)));
    signals.unavailable.extend(unavailable.read().map(|m| (m.entity, m.reason)));
}

fn build_app(grid: Option<Grid>) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(NavigationPlugin);
    app.init_resource::<Signals>();
    app.add_systems(FixedUpdate, collect_signals.after(NavSet::Movement));
    if let Some(grid) = grid {
        app.insert_resource(grid);
    }

    // Initialize (runs Startup systems)
    app.update();
    app
}

/// One fixed tick, driven manually so real time never matters.
fn tick(app: &mut App) {
    app.world_mut().run_schedule(First);
    app.world_mut().run_schedule(FixedUpdate);
    app.world_mut().run_schedule(Update);
    app.world_mut().run_schedule(Last);
}

fn spawn_agent(app: &mut App, position: FixedVec2) -> Entity {
    app.world_mut()
        .spawn((
            SimPosition(position),
            SimPositionPrev(position),
            PathFollower::default(),
            Transform::default(),
        ))
        .id()
}

fn cell_world(app: &App, x: usize, y: usize) -> FixedVec2 {
    app.world().resource::<Grid>().grid_to_world(GridPos::new(x, y))
}

#[test]
fn test_request_walks_agent_to_goal_and_completes_once() {
    let grid = Grid::from_ascii(&["......", ".###..", "......", "......"], FixedNum::ONE).unwrap();
    let mut app = build_app(Some(grid));
    app.insert_resource(SearchTrace::default());

    let start = cell_world(&app, 0, 0);
    let goal = cell_world(&app, 4, 2);
    let agent = spawn_agent(&mut app, start);
    app.world_mut().write_message(PathRequest { entity: agent, goal });

    for _ in 0..600 {
        tick(&mut app);
    }

    let signals = app.world().resource::<Signals>();
    assert_eq!(signals.completed, vec![agent]);
    assert!(signals.stalled.is_empty());
    assert!(signals.unavailable.is_empty());

    assert_eq!(app.world().get::<SimPosition>(agent).unwrap().0, goal);
    assert!(app.world().get::<PathFollower>(agent).unwrap().is_idle());

    let trace = app.world().resource::<SearchTrace>();
    assert!(trace.closed.contains(&GridPos::new(0, 0)));
    assert!(trace.closed.is_subset(&trace.open));

    // rendering follows the simulated position on the ground plane
    let transform = app.world().get::<Transform>(agent).unwrap();
    assert!((transform.translation.x - 4.0).abs() < 1e-3);
    assert!((transform.translation.z - 2.0).abs() < 1e-3);
}

#[test]
fn test_blocking_next_cell_stalls_moving_agent() {
    let grid = Grid::new(6, 1, FixedNum::ONE).unwrap();
    let mut app = build_app(Some(grid));

    let start = cell_world(&app, 0, 0);
    let agent = spawn_agent(&mut app, start);
    let goal = cell_world(&app, 5, 0);
    app.world_mut().write_message(PathRequest { entity: agent, goal });

    for _ in 0..5 {
        tick(&mut app);
    }
    app.world_mut().write_message(WalkabilityToggle {
        cell: GridPos::new(3, 0),
        walkable: Some(false),
    });
    for _ in 0..300 {
        tick(&mut app);
    }

    let signals = app.world().resource::<Signals>();
    assert!(signals.completed.is_empty());
    assert_eq!(signals.stalled, vec![(agent, Some(GridPos::new(3, 0)))]);

    // halted on the last cell it reached, never inside the blocked one
    assert_eq!(app.world().get::<SimPosition>(agent).unwrap().0, cell_world(&app, 2, 0));
    assert!(app.world().get::<PathFollower>(agent).unwrap().is_idle());
    assert!(!app.world().resource::<Grid>().is_walkable(GridPos::new(3, 0)));
}

#[test]
fn test_unreachable_goal_reports_and_halts() {
    let grid = Grid::from_ascii(&["..#..", "..#..", "..#.."], FixedNum::ONE).unwrap();
    let mut app = build_app(Some(grid));

    let start = cell_world(&app, 0, 0);
    let agent = spawn_agent(&mut app, start);
    let goal = cell_world(&app, 4, 1);
    app.world_mut().write_message(PathRequest { entity: agent, goal });

    for _ in 0..10 {
        tick(&mut app);
    }

    let signals = app.world().resource::<Signals>();
    assert_eq!(signals.unavailable, vec![(agent, PathFailure::Unreachable)]);
    assert!(signals.completed.is_empty());
    assert!(app.world().get::<PathFollower>(agent).unwrap().is_idle());
    assert_eq!(app.world().get::<SimPosition>(agent).unwrap().0, FixedVec2::ZERO);
}

#[test]
fn test_new_request_preempts_path_in_progress() {
    let grid = Grid::new(6, 6, FixedNum::ONE).unwrap();
    let mut app = build_app(Some(grid));

    let start = cell_world(&app, 0, 0);
    let agent = spawn_agent(&mut app, start);
    let first_goal = cell_world(&app, 5, 0);
    let second_goal = cell_world(&app, 0, 4);
    app.world_mut().write_message(PathRequest { entity: agent, goal: first_goal });
    for _ in 0..20 {
        tick(&mut app);
    }
    app.world_mut().write_message(PathRequest { entity: agent, goal: second_goal });
    for _ in 0..600 {
        tick(&mut app);
    }

    let signals = app.world().resource::<Signals>();
    assert_eq!(signals.completed, vec![agent]);
    assert_eq!(app.world().get::<SimPosition>(agent).unwrap().0, second_goal);
}

#[test]
fn test_request_for_entity_without_follower_is_skipped() {
    let grid = Grid::new(3, 3, FixedNum::ONE).unwrap();
    let mut app = build_app(Some(grid));

    let bystander = app.world_mut().spawn(SimPosition(FixedVec2::ZERO)).id();
    let goal = cell_world(&app, 2, 2);
    app.world_mut().write_message(PathRequest {
        entity: bystander,
        goal,
    });

    for _ in 0..5 {
        tick(&mut app);
    }

    let signals = app.world().resource::<Signals>();
    assert!(signals.completed.is_empty());
    assert!(signals.unavailable.is_empty());
}

#[test]
fn test_rejected_goal_reports_reason() {
    let grid = Grid::new(3, 3, FixedNum::ONE).unwrap();
    let mut app = build_app(Some(grid));

    let agent = spawn_agent(&mut app, FixedVec2::ZERO);
    app.world_mut().write_message(PathRequest {
        entity: agent,
        goal: FixedVec2::from_f32(10.0, 0.0),
    });
    for _ in 0..3 {
        tick(&mut app);
    }

    let signals = app.world().resource::<Signals>();
    assert_eq!(signals.unavailable.len(), 1);
    assert!(matches!(signals.unavailable[0].1, PathFailure::Rejected { .. }));
}

#[test]
#[should_panic]
fn test_missing_grid_fails_loudly() {
    let mut app = build_app(None);
    let agent = spawn_agent(&mut app, FixedVec2::ZERO);
    app.world_mut().write_message(PathRequest {
        entity: agent,
        goal: FixedVec2::from_f32(1.0, 0.0),
    });
    tick(&mut app);
}

#[test]
fn test_chaser_follows_moving_target() {
    let grid = Grid::new(8, 8, FixedNum::ONE).unwrap();
    let mut app = build_app(Some(grid));

    let target_start = cell_world(&app, 5, 0);
    let target = app.world_mut().spawn(SimPosition(target_start)).id();
    let chaser_start = cell_world(&app, 0, 0);
    let chaser = spawn_agent(&mut app, chaser_start);
    app.world_mut().entity_mut(chaser).insert(ChaseTarget::new(target));

    for _ in 0..300 {
        tick(&mut app);
    }
    assert_eq!(app.world().get::<SimPosition>(chaser).unwrap().0, cell_world(&app, 5, 0));

    let moved = cell_world(&app, 5, 6);
    app.world_mut().get_mut::<SimPosition>(target).unwrap().0 = moved;
    for _ in 0..300 {
        tick(&mut app);
    }
    assert_eq!(app.world().get::<SimPosition>(chaser).unwrap().0, moved);
}
