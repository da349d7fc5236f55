use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::{Deserialize, Serialize};

use crate::game::error::NavError;
use crate::game::follower::PathFollower;
use crate::game::grid::{EdgeCosts, Grid};
use crate::game::math::FixedNum;
use crate::game::pathfinding::{PathPlanner, SearchTrace};

pub const INITIAL_CONFIG_PATH: &str = "assets/initial_config.ron";
pub const RUNTIME_CONFIG_ASSET: &str = "nav_runtime.ron";

/// Static configuration loaded once at startup. Grid shape, costs and tick rate feed the
/// deterministic core and must not change while agents are moving.
#[derive(Resource, Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct InitialConfig {
    // Simulation
    pub tick_rate: f64,

    // Grid
    pub grid_width: usize,
    pub grid_height: usize,
    pub cell_size: f32,

    // Planner
    pub allow_diagonals: bool,
    pub orthogonal_cost: f32,
    pub diagonal_cost: f32,

    // Follower
    pub move_speed: f32,
    pub arrival_epsilon: f32,
    pub start_snap_epsilon: f32,
    pub stall_tick_limit: u32,
    pub chase_replan_interval: u32,

    // Diagnostics
    pub record_search_trace: bool,

    // Demo map
    pub obstacle_density: f64,
    pub obstacle_seed: u64,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            grid_width: 10,
            grid_height: 10,
            cell_size: 1.0,
            allow_diagonals: false,
            orthogonal_cost: 1.0,
            diagonal_cost: 1.41421,
            move_speed: 2.0,
            arrival_epsilon: 0.01,
            start_snap_epsilon: 0.1,
            stall_tick_limit: 30,
            chase_replan_interval: 15,
            record_search_trace: true,
            obstacle_density: 0.2,
            obstacle_seed: 42,
        }
    }
}

impl InitialConfig {
    /// Parse and [`validate`](Self::validate) a RON config. Missing fields take their
    /// defaults.
    pub fn from_ron(contents: &str) -> Result<Self, NavError> {
        let config: Self = ron::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the fixed-point core can't run with: a tick rate, cell size or
    /// step cost that isn't positive, a negative speed or epsilon, and anything NaN,
    /// infinite or outside the fixed-point range.
    pub fn validate(&self) -> Result<(), NavError> {
        NavSettings::from_initial(self)?;
        self.planner()?;
        self.grid()?;
        Ok(())
    }

    pub fn edge_costs(&self) -> Result<EdgeCosts, NavError> {
        EdgeCosts::new(
            positive("orthogonal_cost", self.orthogonal_cost.into())?,
            positive("diagonal_cost", self.diagonal_cost.into())?,
        )
    }

    pub fn planner(&self) -> Result<PathPlanner, NavError> {
        Ok(PathPlanner::new(self.allow_diagonals, self.edge_costs()?))
    }

    pub fn grid(&self) -> Result<Grid, NavError> {
        let cell_size = positive("cell_size", self.cell_size.into())?;
        Grid::new(self.grid_width, self.grid_height, cell_size)
    }
}

fn to_fixed(field: &'static str, value: f64) -> Result<FixedNum, NavError> {
    FixedNum::checked_from_num(value).ok_or(NavError::InvalidConfig { field, value })
}

fn positive(field: &'static str, value: f64) -> Result<FixedNum, NavError> {
    to_fixed(field, value)
        .ok()
        .filter(|v| *v > FixedNum::ZERO)
        .ok_or(NavError::InvalidConfig { field, value })
}

fn non_negative(field: &'static str, value: f64) -> Result<FixedNum, NavError> {
    to_fixed(field, value)
        .ok()
        .filter(|v| *v >= FixedNum::ZERO)
        .ok_or(NavError::InvalidConfig { field, value })
}

/// Fixed-point navigation settings used by the tick systems.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct NavSettings {
    pub tick_rate: FixedNum,
    /// World units per second.
    pub move_speed: FixedNum,
    pub arrival_epsilon: FixedNum,
    pub start_snap_epsilon: FixedNum,
    pub stall_tick_limit: u32,
    pub chase_replan_interval: u32,
}

impl Default for NavSettings {
    fn default() -> Self {
        Self {
            tick_rate: FixedNum::from_num(30),
            move_speed: FixedNum::from_num(2),
            arrival_epsilon: FixedNum::from_num(0.01),
            start_snap_epsilon: FixedNum::from_num(0.1),
            stall_tick_limit: 30,
            chase_replan_interval: 15,
        }
    }
}

impl NavSettings {
    pub fn from_initial(config: &InitialConfig) -> Result<Self, NavError> {
        Ok(Self {
            tick_rate: positive("tick_rate", config.tick_rate)?,
            move_speed: non_negative("move_speed", config.move_speed.into())?,
            arrival_epsilon: non_negative("arrival_epsilon", config.arrival_epsilon.into())?,
            start_snap_epsilon: non_negative("start_snap_epsilon", config.start_snap_epsilon.into())?,
            stall_tick_limit: config.stall_tick_limit,
            chase_replan_interval: config.chase_replan_interval,
        })
    }

    /// Seconds simulated by one fixed tick.
    pub fn tick_delta(&self) -> FixedNum {
        if self.tick_rate <= FixedNum::ZERO {
            return FixedNum::ZERO;
        }
        FixedNum::ONE / self.tick_rate
    }
}

/// Follower tuning that can be hot-reloaded while the simulation runs.
#[derive(Deserialize, Serialize, Asset, TypePath, Clone, Debug)]
pub struct NavRuntimeConfig {
    pub move_speed: f32,
    pub arrival_epsilon: f32,
    pub stall_tick_limit: u32,
    pub chase_replan_interval: u32,
}

impl NavRuntimeConfig {
    /// Move speed and arrival epsilon in fixed point; both must be non-negative.
    pub fn fixed_tuning(&self) -> Result<(FixedNum, FixedNum), NavError> {
        Ok((
            non_negative("move_speed", self.move_speed.into())?,
            non_negative("arrival_epsilon", self.arrival_epsilon.into())?,
        ))
    }
}

#[derive(Resource)]
pub struct NavRuntimeConfigHandle(pub Handle<NavRuntimeConfig>);

/// Loads [`InitialConfig`] and builds the navigation resources from it: [`NavSettings`],
/// [`PathPlanner`], an all-walkable [`Grid`] and, when enabled, a [`SearchTrace`].
/// Needs Bevy's `AssetPlugin` for the runtime config.
pub struct NavConfigPlugin;

impl Plugin for NavConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<NavRuntimeConfig>::new(&[RUNTIME_CONFIG_ASSET]))
            .add_systems(
                Startup,
                (load_initial_config, init_navigation_from_config, setup_runtime_config).chain(),
            )
            .add_systems(Update, apply_runtime_config);
    }
}

/// Load static initial configuration synchronously at startup.
fn load_initial_config(mut commands: Commands) {
    let config = match std::fs::read_to_string(INITIAL_CONFIG_PATH) {
        Ok(contents) => match InitialConfig::from_ron(&contents) {
            Ok(config) => {
                info!("Loaded initial config from {}", INITIAL_CONFIG_PATH);
                config
            }
            Err(e) => {
                error!("Failed to parse initial config: {}", e);
                error!("Using default InitialConfig");
                InitialConfig::default()
            }
        },
        Err(e) => {
            error!("Failed to read {}: {}", INITIAL_CONFIG_PATH, e);
            error!("Using default InitialConfig");
            InitialConfig::default()
        }
    };
    commands.insert_resource(config);
}

fn init_navigation_from_config(
    mut commands: Commands,
    mut fixed_time: ResMut<Time<Fixed>>,
    initial_config: Option<Res<InitialConfig>>,
) -> Result {
    let fallback = InitialConfig::default();
    let config = match &initial_config {
        Some(cfg) => match cfg.validate() {
            Ok(()) => cfg.as_ref(),
            Err(e) => {
                error!("Invalid initial config: {}", e);
                error!("Using default InitialConfig");
                commands.insert_resource(fallback.clone());
                &fallback
            }
        },
        None => {
            warn!("InitialConfig not found, using defaults");
            &fallback
        }
    };

    fixed_time.set_timestep_hz(config.tick_rate);

    let grid = config.grid()?;
    info!(
        "Navigation grid {}x{} (cell size {}), diagonals: {}",
        grid.width(),
        grid.height(),
        grid.cell_size(),
        config.allow_diagonals
    );

    commands.insert_resource(NavSettings::from_initial(config)?);
    commands.insert_resource(config.planner()?);
    commands.insert_resource(grid);
    if config.record_search_trace {
        commands.insert_resource(SearchTrace::default());
    }
    Ok(())
}

fn setup_runtime_config(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load(RUNTIME_CONFIG_ASSET);
    commands.insert_resource(NavRuntimeConfigHandle(handle));
}

/// Push reloaded follower tuning into [`NavSettings`] and every live [`PathFollower`].
fn apply_runtime_config(
    config_handle: Option<Res<NavRuntimeConfigHandle>>,
    runtime_configs: Res<Assets<NavRuntimeConfig>>,
    mut events: MessageReader<AssetEvent<NavRuntimeConfig>>,
    mut settings: ResMut<NavSettings>,
    mut followers: Query<&mut PathFollower>,
) {
    let Some(config_handle) = config_handle else {
        events.clear();
        return;
    };

    for event in events.read() {
        if !(event.is_modified(config_handle.0.id())
            || event.is_loaded_with_dependencies(config_handle.0.id()))
        {
            continue;
        }
        let Some(config) = runtime_configs.get(&config_handle.0) else {
            continue;
        };

        let (move_speed, arrival_epsilon) = match config.fixed_tuning() {
            Ok(tuning) => tuning,
            Err(e) => {
                warn!("Ignoring runtime nav config: {}", e);
                continue;
            }
        };
        settings.move_speed = move_speed;
        settings.arrival_epsilon = arrival_epsilon;
        settings.stall_tick_limit = config.stall_tick_limit;
        settings.chase_replan_interval = config.chase_replan_interval;

        for mut follower in followers.iter_mut() {
            follower.speed = settings.move_speed;
            follower.arrival_epsilon = settings.arrival_epsilon;
            follower.stall_limit = settings.stall_tick_limit;
        }
        info!(
            "Applied runtime nav config: speed {}, arrival epsilon {}",
            config.move_speed, config.arrival_epsilon
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_tick_delta() {
        let settings = NavSettings::default();
        let expected = FixedNum::ONE / FixedNum::from_num(30);
        assert_eq!(settings.tick_delta(), expected);
    }

    #[test]
    fn test_partial_ron_fills_defaults() {
        let config = InitialConfig::from_ron("(grid_width: 32, allow_diagonals: true)").unwrap();
        assert_eq!(config.grid_width, 32);
        assert!(config.allow_diagonals);
        assert_eq!(config.grid_height, InitialConfig::default().grid_height);

        let planner = config.planner().unwrap();
        assert!(planner.allow_diagonals);
        assert_eq!(config.grid().unwrap().len(), 32 * 10);
    }

    #[test]
    fn test_malformed_ron_is_a_config_error() {
        let err = InitialConfig::from_ron("(grid_width: \"wide\")").unwrap_err();
        assert!(matches!(err, NavError::Config(_)));
    }

    #[test]
    fn test_default_settings_match_default_config() {
        let from_config = NavSettings::from_initial(&InitialConfig::default()).unwrap();
        assert_eq!(from_config, NavSettings::default());
    }

    #[test]
    fn test_zero_tick_rate_is_rejected() {
        let err = InitialConfig::from_ron("(tick_rate: 0.0)").unwrap_err();
        assert!(matches!(err, NavError::InvalidConfig { field: "tick_rate", .. }));
    }

    #[test]
    fn test_non_positive_costs_are_rejected() {
        let err = InitialConfig::from_ron("(orthogonal_cost: -1.0)").unwrap_err();
        assert!(matches!(err, NavError::InvalidConfig { field: "orthogonal_cost", .. }));

        let config = InitialConfig {
            diagonal_cost: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.edge_costs(),
            Err(NavError::InvalidConfig { field: "diagonal_cost", .. })
        ));
        assert!(config.planner().is_err());
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let config = InitialConfig {
            cell_size: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(NavError::InvalidConfig { field: "cell_size", .. })
        ));

        let config = InitialConfig {
            move_speed: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            NavSettings::from_initial(&config),
            Err(NavError::InvalidConfig { field: "move_speed", .. })
        ));

        let runtime = NavRuntimeConfig {
            move_speed: 1.0,
            arrival_epsilon: f32::NAN,
            stall_tick_limit: 10,
            chase_replan_interval: 5,
        };
        assert!(matches!(
            runtime.fixed_tuning(),
            Err(NavError::InvalidConfig { field: "arrival_epsilon", .. })
        ));
    }

    #[test]
    fn test_invalid_startup_config_falls_back_to_defaults() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(InitialConfig {
            tick_rate: 0.0,
            grid_width: 7,
            ..Default::default()
        });
        app.add_systems(Startup, init_navigation_from_config);
        app.update();

        let world = app.world();
        assert_eq!(*world.resource::<NavSettings>(), NavSettings::default());
        assert_eq!(world.resource::<Grid>().width(), InitialConfig::default().grid_width);
        assert_eq!(world.resource::<InitialConfig>().tick_rate, 30.0);
        assert_eq!(
            world.resource::<Time<Fixed>>().timestep(),
            std::time::Duration::from_secs_f64(1.0 / 30.0)
        );
    }

    #[test]
    fn test_zero_tick_rate_does_not_divide_by_zero() {
        let settings = NavSettings {
            tick_rate: FixedNum::ZERO,
            ..Default::default()
        };
        assert_eq!(settings.tick_delta(), FixedNum::ZERO);
    }
}
