use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::game::grid::GridPos;
use crate::game::math::FixedNum;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct FrontierEntry {
    pub f_cost: FixedNum,
    pub h_cost: FixedNum,
    /// g at admission time; used to spot entries superseded by a later relaxation
    pub g_cost: FixedNum,
    pub seq: u64,
    pub pos: GridPos,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse so the lowest f pops first, then lowest h,
        // then the earliest admission.
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.h_cost.cmp(&self.h_cost))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Open set of a single search.
///
/// Re-admitting a node with a better cost pushes a fresh entry; the stale one stays in
/// the heap and is discarded by the caller when popped.
pub(super) struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    next_seq: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn push(&mut self, pos: GridPos, g_cost: FixedNum, h_cost: FixedNum) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(FrontierEntry {
            f_cost: g_cost.saturating_add(h_cost),
            h_cost,
            g_cost,
            seq,
            pos,
        });
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop()
    }
}
