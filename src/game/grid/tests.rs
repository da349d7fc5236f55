use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn open_grid(width: usize, height: usize) -> Grid {
    Grid::new(width, height, FixedNum::ONE).expect("valid grid")
}

fn positions(iter: Neighbors<'_>) -> Vec<GridPos> {
    iter.map(|(node, _)| node.pos()).collect()
}

#[test]
fn test_new_rejects_degenerate_dimensions() {
    assert!(matches!(
        Grid::new(0, 4, FixedNum::ONE),
        Err(NavError::InvalidDimensions { .. })
    ));
    assert!(matches!(
        Grid::new(4, 4, FixedNum::ZERO),
        Err(NavError::InvalidDimensions { .. })
    ));
}

#[test]
fn test_new_rejects_oversized_dimensions() {
    assert!(matches!(
        Grid::new(usize::MAX / 2, 3, FixedNum::ONE),
        Err(NavError::InvalidDimensions { height: 3, .. })
    ));
    assert!(matches!(
        Grid::new(MAX_GRID_CELLS, 2, FixedNum::ONE),
        Err(NavError::InvalidDimensions { .. })
    ));
    assert!(matches!(
        Grid::new(4, 4, FixedNum::MAX),
        Err(NavError::InvalidDimensions { .. })
    ));
}

#[test]
fn test_get_node_bounds() {
    let grid = open_grid(3, 2);
    assert_eq!(grid.get_node(GridPos::new(2, 1)).unwrap().pos(), GridPos::new(2, 1));
    assert!(matches!(
        grid.get_node(GridPos::new(3, 0)),
        Err(NavError::OutOfBounds { x: 3, y: 0, .. })
    ));
    assert!(grid.get_node(GridPos::new(0, 2)).is_err());
}

#[test]
fn test_world_to_grid_rounds_to_nearest_center() {
    let grid = Grid::new(4, 4, FixedNum::from_num(2)).unwrap();

    // 2.9 / 2 = 1.45 -> cell 1; 3.0 / 2 = 1.5 -> rounds away from zero -> cell 2
    let a = grid.world_to_grid(FixedVec2::from_f32(2.9, 0.0)).unwrap();
    let b = grid.world_to_grid(FixedVec2::from_f32(3.0, 0.0)).unwrap();
    assert_eq!(a, GridPos::new(1, 0));
    assert_eq!(b, GridPos::new(2, 0));

    // Slightly negative positions still land on the first row/column
    let c = grid.world_to_grid(FixedVec2::from_f32(-0.9, -0.5)).unwrap();
    assert_eq!(c, GridPos::new(0, 0));

    assert!(grid.world_to_grid(FixedVec2::from_f32(-1.0, 0.0)).is_err());
    assert!(grid.world_to_grid(FixedVec2::from_f32(0.0, 7.0)).is_err());
}

#[test]
fn test_world_round_trip_uses_depth_axis() {
    let grid = Grid::new(5, 5, FixedNum::from_num(1.5)).unwrap();
    let cell = GridPos::new(3, 4);
    let world = grid.grid_to_world_3d(cell);
    assert_eq!(world, Vec3::new(4.5, 0.0, 6.0));
    assert_eq!(grid.world_to_grid_3d(world + Vec3::Y * 10.0).unwrap(), cell);
}

#[test]
fn test_unrepresentable_world_positions_are_errors() {
    let grid = open_grid(4, 4);
    assert!(matches!(
        grid.world_to_grid_3d(Vec3::NAN),
        Err(NavError::UnrepresentablePosition { .. })
    ));
    assert!(matches!(
        grid.world_to_grid_3d(Vec3::new(f32::INFINITY, 0.0, 1.0)),
        Err(NavError::UnrepresentablePosition { .. })
    ));

    // dividing by a tiny cell size overflows the fixed-point range
    let fine = Grid::new(2, 2, FixedNum::DELTA).unwrap();
    assert!(matches!(
        fine.world_to_grid(FixedVec2::new(FixedNum::MAX, FixedNum::ZERO)),
        Err(NavError::UnrepresentablePosition { .. })
    ));
}

#[test]
fn test_neighbors_fixed_order() {
    let grid = open_grid(3, 3);
    let center = GridPos::new(1, 1);

    assert_eq!(
        positions(grid.neighbors(center, false)),
        vec![
            GridPos::new(2, 1),
            GridPos::new(0, 1),
            GridPos::new(1, 2),
            GridPos::new(1, 0),
        ]
    );

    assert_eq!(
        positions(grid.neighbors(center, true)),
        vec![
            GridPos::new(2, 1),
            GridPos::new(0, 1),
            GridPos::new(1, 2),
            GridPos::new(1, 0),
            GridPos::new(2, 2),
            GridPos::new(0, 2),
            GridPos::new(2, 0),
            GridPos::new(0, 0),
        ]
    );
}

#[test]
fn test_neighbors_clipped_at_corner_and_restartable() {
    let grid = open_grid(3, 3);
    let corner = grid.neighbors(GridPos::new(0, 0), true);
    let restarted = corner.clone();

    let first: Vec<_> = corner.map(|(n, d)| (n.pos(), d)).collect();
    assert_eq!(
        first,
        vec![
            (GridPos::new(1, 0), Direction::East),
            (GridPos::new(0, 1), Direction::North),
            (GridPos::new(1, 1), Direction::NorthEast),
        ]
    );
    assert_eq!(positions(restarted).len(), 3);
}

#[test]
fn test_neighbors_include_blocked_cells() {
    // Walkability is the planner's filter, not the grid's.
    let mut grid = open_grid(3, 1);
    grid.set_walkable(GridPos::new(1, 0), false).unwrap();
    assert_eq!(positions(grid.neighbors(GridPos::new(0, 0), false)), vec![GridPos::new(1, 0)]);
}

#[test]
fn test_neighbors_of_outside_cell_is_empty() {
    let grid = open_grid(2, 2);
    assert_eq!(grid.neighbors(GridPos::new(5, 5), true).count(), 0);
}

#[test]
fn test_set_and_toggle_walkable() {
    let mut grid = open_grid(2, 2);
    let cell = GridPos::new(1, 1);

    grid.set_walkable(cell, false).unwrap();
    assert!(!grid.is_walkable(cell));
    assert!(grid.toggle_walkable(cell).unwrap());
    assert!(grid.is_walkable(cell));

    assert!(grid.set_walkable(GridPos::new(2, 0), false).is_err());
    assert!(!grid.is_walkable(GridPos::new(9, 9)));
}

#[test]
fn test_reset_search_state_clears_costs() {
    let mut grid = open_grid(2, 2);
    let cell = GridPos::new(1, 0);
    grid.node_mut(cell).unwrap().relax(GridPos::new(0, 0), FixedNum::from_num(3), FixedNum::from_num(2));
    assert_eq!(grid.get_node(cell).unwrap().f_cost(), FixedNum::from_num(5));

    grid.reset_search_state();

    let node = grid.get_node(cell).unwrap();
    assert_eq!(node.g_cost(), UNREACHED);
    assert_eq!(node.h_cost(), FixedNum::ZERO);
    assert_eq!(node.parent(), None);
    assert!(!node.is_reached());
}

#[test]
fn test_from_ascii_layout() {
    let grid = Grid::from_ascii(&["..#", "#.."], FixedNum::ONE).unwrap();
    assert_eq!((grid.width(), grid.height()), (3, 2));
    assert!(!grid.is_walkable(GridPos::new(2, 0)));
    assert!(!grid.is_walkable(GridPos::new(0, 1)));
    assert!(grid.is_walkable(GridPos::new(1, 1)));
}

#[test]
fn test_scatter_obstacles_is_seeded() {
    let mut a = open_grid(16, 16);
    let mut b = open_grid(16, 16);
    let blocked_a = a.scatter_obstacles(0.3, &mut StdRng::seed_from_u64(7));
    let blocked_b = b.scatter_obstacles(0.3, &mut StdRng::seed_from_u64(7));

    assert_eq!(blocked_a, blocked_b);
    assert!(a.nodes().zip(b.nodes()).all(|(x, y)| x.is_walkable() == y.is_walkable()));
    assert_eq!(a.nodes().filter(|n| !n.is_walkable()).count(), blocked_a);
}
