use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use gridwalk::game::config::InitialConfig;
use gridwalk::game::follower::{PathCompleted, PathFollower, PathStalled, SimPosition, SimPositionPrev};
use gridwalk::game::grid::{Grid, GridPos};
use gridwalk::game::map;
use gridwalk::game::pathfinding::{PathRequest, PathUnavailable, SearchTrace};
use gridwalk::game::{NavConfigPlugin, NavSettings, NavTick, NavigationPlugin};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::path::{Path, PathBuf};

/// Give up on the demo after this many fixed ticks.
const DEMO_TICK_LIMIT: u64 = 3_000;
const DEMO_MAP_FILE: &str = "last_demo_map.bin";

fn setup_file_logging() -> String {
    let log_dir = PathBuf::from("logs");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir).expect("Failed to create logs directory");
    }

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("gridwalk_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_file_path = log_dir.join(&log_filename);
    let log_path_str = log_file_path.to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(
        Rotation::NEVER, // Don't rotate during a single run
        &log_dir,
        &log_filename
    );

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bevy_ecs=info,bevy_asset=warn,gridwalk=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    log_path_str
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("gridwalk") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Oldest first
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

/// Optional map file to walk instead of a freshly scattered one.
#[derive(Resource, Default)]
struct DemoMapPath(Option<PathBuf>);

#[derive(Component)]
struct DemoAgent;

fn main() {
    let log_file = setup_file_logging();

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  gridwalk - Logging to file                              ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Log file: {:<45} ║", log_file);
    println!("╚══════════════════════════════════════════════════════════╝");

    let map_path = std::env::args().nth(1).map(PathBuf::from);

    App::new()
        .add_plugins((MinimalPlugins, AssetPlugin::default()))
        .add_plugins((NavConfigPlugin, NavigationPlugin))
        .insert_resource(DemoMapPath(map_path))
        .add_systems(PostStartup, setup_demo)
        .add_systems(FixedPostUpdate, finish_demo)
        .run();
}

/// Lay out the demo map and send one agent from the first cell to the last.
fn setup_demo(
    mut commands: Commands,
    mut grid: ResMut<Grid>,
    config: Res<InitialConfig>,
    settings: Res<NavSettings>,
    map_path: Res<DemoMapPath>,
    mut requests: MessageWriter<PathRequest>,
) -> Result {
    match &map_path.0 {
        Some(path) => {
            *grid = map::load_grid(path)?;
            info!("Loaded map {} ({}x{})", path.display(), grid.width(), grid.height());
        }
        None => {
            let mut rng = StdRng::seed_from_u64(config.obstacle_seed);
            let blocked = grid.scatter_obstacles(config.obstacle_density, &mut rng);
            info!(
                "Scattered {} obstacles (density {}, seed {})",
                blocked, config.obstacle_density, config.obstacle_seed
            );
        }
    }

    let start = GridPos::new(0, 0);
    let goal = GridPos::new(grid.width() - 1, grid.height() - 1);
    grid.set_walkable(start, true)?;
    grid.set_walkable(goal, true)?;

    if map_path.0.is_none() {
        let save_path = Path::new("logs").join(DEMO_MAP_FILE);
        match map::save_grid(&save_path, &grid) {
            Ok(()) => info!("Saved demo map to {}", save_path.display()),
            Err(e) => warn!("Could not save demo map: {}", e),
        }
    }

    let position = grid.grid_to_world(start);
    let entity = commands
        .spawn((
            DemoAgent,
            SimPosition(position),
            SimPositionPrev(position),
            PathFollower::from_settings(&settings),
            Transform::from_translation(position.to_world()),
        ))
        .id();

    info!("Agent {:?} heading from {:?} to {:?}", entity, start, goal);
    requests.write(PathRequest {
        entity,
        goal: grid.grid_to_world(goal),
    });
    Ok(())
}

fn finish_demo(
    mut completed: MessageReader<PathCompleted>,
    mut stalled: MessageReader<PathStalled>,
    mut unavailable: MessageReader<PathUnavailable>,
    agents: Query<&SimPosition, With<DemoAgent>>,
    grid: Res<Grid>,
    trace: Option<Res<SearchTrace>>,
    tick: Res<NavTick>,
    mut exit: MessageWriter<AppExit>,
) {
    let mut done = false;

    for event in completed.read() {
        if let Ok(position) = agents.get(event.entity) {
            info!(
                "Agent {:?} arrived at {:?} after {} ticks",
                event.entity,
                grid.world_to_grid(position.0).ok(),
                tick.0
            );
        }
        done = true;
    }
    for event in stalled.read() {
        warn!("Agent {:?} stalled before {:?}", event.entity, event.cell);
        done = true;
    }
    for event in unavailable.read() {
        warn!("No path for agent {:?}: {:?}", event.entity, event.reason);
        done = true;
    }

    if !done && tick.0 < DEMO_TICK_LIMIT {
        return;
    }
    if !done {
        warn!("Demo did not finish within {} ticks", DEMO_TICK_LIMIT);
    }

    if let Some(trace) = trace {
        info!(
            "Last search: {} cells opened, {} closed",
            trace.open.len(),
            trace.closed.len()
        );
        for line in render_layout(&grid, &trace) {
            info!("{}", line);
        }
    }
    exit.write(AppExit::Success);
}

/// Text picture of the grid, top row last: `#` blocked, `x` closed, `o` opened.
fn render_layout(grid: &Grid, trace: &SearchTrace) -> Vec<String> {
    (0..grid.height())
        .rev()
        .map(|y| {
            (0..grid.width())
                .map(|x| {
                    let pos = GridPos::new(x, y);
                    if !grid.is_walkable(pos) {
                        '#'
                    } else if trace.closed.contains(&pos) {
                        'x'
                    } else if trace.open.contains(&pos) {
                        'o'
                    } else {
                        '.'
                    }
                })
                .collect()
        })
        .collect()
}
