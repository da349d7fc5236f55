use bevy::prelude::*;
use rustc_hash::FxHashSet;

use crate::game::grid::GridPos;

/// Side-channel of a search for renderers and diagnostics.
///
/// The planner reports every cell it places in the frontier and every cell it
/// finalizes, and never reads anything back.
pub trait SearchObserver {
    fn on_open(&mut self, pos: GridPos);
    fn on_closed(&mut self, pos: GridPos);
}

/// No-op observer.
impl SearchObserver for () {
    #[inline]
    fn on_open(&mut self, _pos: GridPos) {}
    #[inline]
    fn on_closed(&mut self, _pos: GridPos) {}
}

/// Open/closed cells of the last traced search.
///
/// `open` keeps every cell that was ever admitted to the frontier, including those that
/// were later closed. Insert it as a resource to have the planning system record into
/// it.
#[derive(Resource, Default, Debug, Clone)]
pub struct SearchTrace {
    pub open: FxHashSet<GridPos>,
    pub closed: FxHashSet<GridPos>,
}

impl SearchTrace {
    pub fn clear(&mut self) {
        self.open.clear();
        self.closed.clear();
    }

    /// Admitted but never finalized.
    pub fn frontier_only(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.open.iter().copied().filter(|p| !self.closed.contains(p))
    }
}

impl SearchObserver for SearchTrace {
    fn on_open(&mut self, pos: GridPos) {
        self.open.insert(pos);
    }

    fn on_closed(&mut self, pos: GridPos) {
        self.closed.insert(pos);
    }
}
