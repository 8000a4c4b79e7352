//! Branch lanes for drawing the game tree.
//!
//! The mainline occupies lane 0. Every variation gets the first lane, at or
//! above its minimum, whose move range is still free: lane 2 for branches off
//! the mainline, one above the parent line's lane for nested branches. A
//! line's range starts one move before its first move, so the stone it
//! branches from stays visible next to it.
//!
//! Branches are placed starting from the end of the mainline, each branch
//! before its own sub-branches, siblings in document order.

use tracing::trace;

use crate::constants::{FIRST_BRANCH_LANE, MAINLINE_LANE};
use crate::game::Game;
use crate::node::NodeId;

/// Occupancy of each lane by move number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneTable {
    lanes: Vec<Vec<bool>>,
}

impl LaneTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lanes that have been touched, including empty ones below the
    /// highest used lane.
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_booked(&self, lane: usize, move_no: usize) -> bool {
        self.lanes
            .get(lane)
            .and_then(|row| row.get(move_no))
            .copied()
            .unwrap_or(false)
    }

    /// Whether `lane` has no booking in `from..to`.
    pub fn is_free(&self, lane: usize, from: usize, to: usize) -> bool {
        (from..to).all(|m| !self.is_booked(lane, m))
    }

    pub fn book(&mut self, lane: usize, from: usize, to: usize) {
        if self.lanes.len() <= lane {
            self.lanes.resize_with(lane + 1, Vec::new);
        }
        let row = &mut self.lanes[lane];
        if row.len() < to {
            row.resize(to, false);
        }
        row[from..to].fill(true);
    }

    /// Lowest lane at or above `min_lane` that is free over `from..to`.
    pub fn first_free(&self, min_lane: usize, from: usize, to: usize) -> usize {
        (min_lane..)
            .find(|&lane| self.is_free(lane, from, to))
            .unwrap_or(min_lane)
    }
}

/// A branch waiting for a lane, with the lowest lane it may take.
struct Pending {
    head: NodeId,
    min_lane: usize,
}

/// Assign a lane to every node of `game` and return the resulting table.
pub fn compute_layout(game: &mut Game) -> LaneTable {
    let mut table = LaneTable::new();
    let all = game.preorder();
    for id in all {
        game.node_mut(id).lane = MAINLINE_LANE;
    }

    let mainline: Vec<NodeId> = game.mainline().collect();
    for &id in &mainline {
        if let Some(move_no) = game.node(id).move_no() {
            let m = move_no as usize;
            table.book(MAINLINE_LANE, m, m + 1);
        }
    }

    let mut pending = Vec::new();
    for &id in &mainline {
        push_branches(game, id, FIRST_BRANCH_LANE, &mut pending);
    }

    while let Some(Pending { head, min_lane }) = pending.pop() {
        let chain: Vec<NodeId> = game.line_from(head).collect();
        let start = game.node(head).line_move_no() as usize;
        let from = start.saturating_sub(1);
        let to = start + chain.len();

        let lane = table.first_free(min_lane, from, to);
        table.book(lane, from, to);
        trace!(head = %head, lane, from, to, "placed branch");

        for &id in &chain {
            game.node_mut(id).lane = lane;
        }
        for &id in chain.iter().rev() {
            push_branches(game, id, lane + 1, &mut pending);
        }
    }

    table
}

/// Queue the branches of `id` so they pop in document order.
fn push_branches(game: &Game, id: NodeId, min_lane: usize, pending: &mut Vec<Pending>) {
    for &head in game.node(id).branches().iter().rev() {
        pending.push(Pending { head, min_lane });
    }
}
