//! Game tree nodes.
//!
//! Nodes live in an arena owned by [`Game`](crate::game::Game) and refer to
//! each other by [`NodeId`]. Every node has:
//!
//! - `parent`: the node it hangs from (the previous node for a continuation,
//!   the branch point for a variation). `None` only for the root.
//! - `next`: the following node on the same line of play.
//! - `prev`: the preceding node on the same line. `None` for the root and for
//!   the first node of a variation.
//! - `branches`: alternatives to `next`. The first child added to a node
//!   always becomes `next`; only the second and later children are branches.

use std::borrow::Cow;
use std::fmt;

use crate::board::StoneState;
use crate::constants::{
    PASS_COORD, PROP_ADD_BLACK, PROP_ADD_WHITE, PROP_BLACK, PROP_COMMENT, PROP_WHITE,
};
use crate::coord::alpha_to_coords;
use crate::error::Result;
use crate::properties::Properties;

/// Stable handle of a node within its game. Never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One position in the game tree.
#[derive(Debug, Clone)]
pub struct GameNode {
    pub(crate) id: NodeId,
    pub(crate) properties: Properties,
    /// Move number of the line at this node (inherited by non-move nodes).
    pub(crate) line_move_no: u32,
    pub(crate) node_no: usize,
    pub(crate) lane: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) branches: Vec<NodeId>,
}

impl GameNode {
    pub(crate) fn new(id: NodeId, parent: Option<NodeId>, properties: Properties) -> Self {
        Self {
            id,
            properties,
            line_move_no: 0,
            node_no: 0,
            lane: 0,
            parent,
            next: None,
            prev: None,
            branches: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    /// All values stored under `key`, joined with the value separator.
    pub fn property(&self, key: &str) -> Option<Cow<'_, str>> {
        self.properties.get(key)
    }

    pub fn property_or<'a>(&'a self, key: &str, default: &'a str) -> Cow<'a, str> {
        self.properties.get(key).unwrap_or(Cow::Borrowed(default))
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    /// Variations starting after this node, excluding the continuation.
    pub fn branches(&self) -> &[NodeId] {
        &self.branches
    }

    pub fn has_branches(&self) -> bool {
        !self.branches.is_empty()
    }

    /// 1-based move number, set only on nodes that play a move.
    pub fn move_no(&self) -> Option<u32> {
        self.is_move().then_some(self.line_move_no)
    }

    /// Move number of the line at this node; non-move nodes carry the number
    /// of the last move before them (0 before the first move).
    pub fn line_move_no(&self) -> u32 {
        self.line_move_no
    }

    /// Preorder position of this node across the whole tree.
    pub fn node_no(&self) -> usize {
        self.node_no
    }

    /// Rendering lane; the mainline is lane 0.
    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn is_move(&self) -> bool {
        self.properties.contains(PROP_BLACK) || self.properties.contains(PROP_WHITE)
    }

    pub fn is_black(&self) -> bool {
        self.properties.contains(PROP_BLACK)
    }

    pub fn is_white(&self) -> bool {
        self.properties.contains(PROP_WHITE)
    }

    /// Color of the stone played, or `Empty` for non-move nodes.
    pub fn color(&self) -> StoneState {
        if self.is_white() {
            StoneState::White
        } else if self.is_black() {
            StoneState::Black
        } else {
            StoneState::Empty
        }
    }

    /// The point string of the move, if this node is a move.
    pub fn move_string(&self) -> Option<&str> {
        self.properties
            .first(PROP_WHITE)
            .or_else(|| self.properties.first(PROP_BLACK))
    }

    /// Setup stones without a move.
    pub fn is_placement_move(&self) -> bool {
        !self.is_move()
            && (self.properties.contains(PROP_ADD_BLACK) || self.properties.contains(PROP_ADD_WHITE))
    }

    /// A move that places no stone: `tt` or an empty value.
    pub fn is_pass(&self) -> bool {
        matches!(self.move_string(), Some(s) if s.is_empty() || s == PASS_COORD)
    }

    /// Board coordinates of a stone-placing move.
    ///
    /// Returns `Ok(None)` for passes and non-move nodes.
    pub fn coords(&self) -> Result<Option<(usize, usize)>> {
        match self.move_string() {
            Some(s) if !self.is_pass() => alpha_to_coords(s).map(Some),
            _ => Ok(None),
        }
    }

    pub fn comment(&self) -> Cow<'_, str> {
        self.property_or(PROP_COMMENT, "")
    }

    /// No properties and no children.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.next.is_none() && self.branches.is_empty()
    }
}

impl fmt::Display for GameNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {} [", self.id)?;
        for (i, key) in self.properties.keys().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{key}")?;
        }
        write!(
            f,
            "] move {} lane {} branches {}",
            self.line_move_no,
            self.lane,
            self.branches.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(props: &[(&str, &str)]) -> GameNode {
        GameNode::new(NodeId(0), None, props.iter().copied().collect())
    }

    #[test]
    fn test_move_detection() {
        let black = node(&[("B", "pd")]);
        assert!(black.is_move());
        assert!(black.is_black());
        assert_eq!(black.color(), StoneState::Black);
        assert_eq!(black.coords().unwrap(), Some((15, 3)));

        let white = node(&[("W", "dp")]);
        assert!(white.is_white());
        assert_eq!(white.move_string(), Some("dp"));
    }

    #[test]
    fn test_pass_detection() {
        assert!(node(&[("B", "tt")]).is_pass());
        assert!(node(&[("W", "")]).is_pass());
        assert!(!node(&[("B", "pd")]).is_pass());
        assert_eq!(node(&[("B", "tt")]).coords().unwrap(), None);
    }

    #[test]
    fn test_placement_move() {
        let setup = node(&[("AB", "aa"), ("AW", "bb")]);
        assert!(setup.is_placement_move());
        assert!(!setup.is_move());
        assert_eq!(setup.color(), StoneState::Empty);

        let mixed = node(&[("AB", "aa"), ("B", "cc")]);
        assert!(!mixed.is_placement_move());
    }

    #[test]
    fn test_move_no_only_on_moves() {
        let mut comment = node(&[("C", "hello")]);
        comment.line_move_no = 4;
        assert_eq!(comment.move_no(), None);
        assert_eq!(comment.line_move_no(), 4);
        assert_eq!(comment.comment(), "hello");

        let mut mv = node(&[("B", "aa")]);
        mv.line_move_no = 5;
        assert_eq!(mv.move_no(), Some(5));
    }

    #[test]
    fn test_empty_node() {
        assert!(node(&[]).is_empty());
        assert!(!node(&[("C", "x")]).is_empty());
        assert_eq!(node(&[]).comment(), "");
    }

    #[test]
    fn test_short_coordinate_is_error() {
        assert!(node(&[("B", "a")]).coords().is_err());
    }
}
