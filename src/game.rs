//! The game record: an arena of [`GameNode`]s plus game-level properties.
//!
//! A parsed game is finished by [`Game::post_process`], which
//!
//! 1. puts an empty root above a root that is itself a move,
//! 2. numbers nodes (preorder across the whole tree) and moves (per line),
//! 3. lays out branch lanes (see [`layout`](crate::layout)),
//! 4. derives per-move elapsed time when clock properties are present.
//!
//! Every tree walk here uses an explicit work stack.

use std::borrow::Cow;
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::board::{Board, StoneState};
use crate::constants::{
    BOARD_SIZE, COMPOSE_PROPERTIES, DERIVED_PROPERTIES, POINT_LIST_PROPERTIES, PROP_ADD_BLACK,
    PROP_ADD_WHITE, PROP_BLACK_TIME_LEFT, PROP_PLAYER, PROP_WHITE_TIME_LEFT, VALUE_SEPARATOR,
};
use crate::coord::coords_to_alpha;
use crate::error::{Result, SgfError};
use crate::layout;
use crate::node::{GameNode, NodeId};
use crate::parser::{escape, escape_compose};
use crate::properties::Properties;
use crate::timing::{self, MoveTimingInfo};

/// A complete game record.
#[derive(Debug, Clone)]
pub struct Game {
    properties: Properties,
    nodes: Vec<GameNode>,
    root: NodeId,
    move_count: usize,
    node_count: usize,
    timing_info_found: bool,
    black_timings: MoveTimingInfo,
    white_timings: MoveTimingInfo,
    original_sgf: Option<String>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// A game with a single empty root node.
    pub fn new() -> Self {
        let mut game = Self::empty();
        let root = game.alloc(None, Properties::new());
        game.root = root;
        game.node_count = 1;
        game
    }

    /// A game with no nodes yet; the parser fills it and installs the root.
    pub(crate) fn empty() -> Self {
        Self {
            properties: Properties::new(),
            nodes: Vec::new(),
            root: NodeId(0),
            move_count: 0,
            node_count: 0,
            timing_info_found: false,
            black_timings: MoveTimingInfo::default(),
            white_timings: MoveTimingInfo::default(),
            original_sgf: None,
        }
    }

    pub(crate) fn alloc(&mut self, parent: Option<NodeId>, properties: Properties) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(GameNode::new(id, parent, properties));
        id
    }

    /// Link `child` under `parent`: as the continuation if free, otherwise as
    /// the next branch.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        let has_next = self.nodes[parent.0].next.is_some();
        if has_next {
            self.nodes[parent.0].branches.push(child);
        } else {
            self.nodes[parent.0].next = Some(child);
            self.nodes[child.0].prev = Some(parent);
        }
        self.nodes[child.0].parent = Some(parent);
    }

    /// Make `root` the root; a non-move root hands its properties to the game.
    pub(crate) fn install_root(&mut self, root: NodeId) {
        self.root = root;
        if !self.nodes[root.0].is_move() {
            let props = std::mem::take(&mut self.nodes[root.0].properties);
            self.properties.merge(props);
        }
    }

    pub(crate) fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn set_original_sgf(&mut self, text: &str) {
        self.original_sgf = Some(text.to_string());
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Node by id.
    ///
    /// # Panics
    /// If `id` belongs to a different game.
    pub fn node(&self, id: NodeId) -> &GameNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut GameNode {
        &mut self.nodes[id.0]
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &GameNode {
        self.node(self.root)
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Game-level property; repeated values are joined with `,`.
    pub fn property(&self, key: &str) -> Option<Cow<'_, str>> {
        self.properties.get(key)
    }

    pub fn property_or<'a>(&'a self, key: &str, default: &'a str) -> Cow<'a, str> {
        self.properties.get(key).unwrap_or(Cow::Borrowed(default))
    }

    /// Add a game-level value, merging with an existing definition.
    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.add(key, value);
    }

    /// Overwrite a game-level property.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.set(key, value);
    }

    /// Number of moves on the mainline.
    pub fn move_count(&self) -> usize {
        self.move_count
    }

    /// Number of nodes in the whole tree, variations included.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn original_sgf(&self) -> Option<&str> {
        self.original_sgf.as_deref()
    }

    pub fn timing_info_found(&self) -> bool {
        self.timing_info_found
    }

    pub fn black_timings(&self) -> MoveTimingInfo {
        self.black_timings
    }

    pub fn white_timings(&self) -> MoveTimingInfo {
        self.white_timings
    }

    /// Nodes of the mainline, starting at the root.
    pub fn mainline(&self) -> Line<'_> {
        self.line_from(self.root)
    }

    /// Nodes following `start` along its line of play, `start` included.
    pub fn line_from(&self, start: NodeId) -> Line<'_> {
        Line {
            game: self,
            next: Some(start),
        }
    }

    /// The continuation of `id` followed by its branches.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let node = self.node(id);
        node.next.into_iter().chain(node.branches.iter().copied())
    }

    /// First move on the mainline.
    pub fn first_move(&self) -> Option<NodeId> {
        self.mainline().find(|&id| self.node(id).is_move())
    }

    /// Last move on the mainline.
    pub fn last_move(&self) -> Option<NodeId> {
        self.mainline().filter(|&id| self.node(id).is_move()).last()
    }

    /// Every node in preorder: a node, then its continuation's subtree, then
    /// each branch's subtree in order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            let node = self.node(id);
            stack.extend(node.branches.iter().rev().copied());
            stack.extend(node.next);
        }
        order
    }

    // =========================================================================
    // Post-processing
    // =========================================================================

    /// Finish a freshly parsed game. Runs once after parsing.
    pub fn post_process(&mut self) {
        if self.root_node().is_move() {
            let old_root = self.root;
            let new_root = self.alloc(None, Properties::new());
            self.attach(new_root, old_root);
            self.root = new_root;
            trace!(root = %new_root, "synthesized empty root above first move");
        }

        self.timing_info_found = self.mainline().any(|id| {
            let props = self.node(id).properties();
            props.contains(PROP_BLACK_TIME_LEFT) || props.contains(PROP_WHITE_TIME_LEFT)
        });

        self.renumber();

        if self.timing_info_found {
            let (black, white) = timing::derive_move_timings(self);
            self.black_timings = black;
            self.white_timings = white;
        }

        debug!(
            moves = self.move_count,
            nodes = self.node_count,
            timing = self.timing_info_found,
            "post-processed game"
        );
    }

    /// Recount, renumber and re-lay-out the tree after a structural change.
    pub fn renumber(&mut self) {
        self.number_nodes();
        self.move_count = self
            .mainline()
            .filter(|&id| self.node(id).is_move())
            .count();
        layout::compute_layout(self);
    }

    /// Assign node numbers in preorder and move numbers per line. A branch
    /// continues numbering from its branch point.
    fn number_nodes(&mut self) {
        let mut node_no = 0;
        let mut stack = vec![(self.root, 0u32)];
        while let Some((id, line_move_no)) = stack.pop() {
            let node = &mut self.nodes[id.0];
            let current = if node.is_move() {
                line_move_no + 1
            } else {
                line_move_no
            };
            node.line_move_no = current;
            node.node_no = node_no;
            node_no += 1;
            stack.extend(node.branches.iter().rev().map(|&b| (b, current)));
            stack.extend(node.next.map(|n| (n, current)));
        }
        self.node_count = node_no;
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Add a node with `properties` after `parent` and renumber the tree.
    ///
    /// The node becomes the continuation if `parent` has none, otherwise a new
    /// branch. Point lists are expanded and move values checked the same way
    /// the parser does it. Fails if a child of `parent` already has the same
    /// properties.
    pub fn add_variation(&mut self, parent: NodeId, properties: Properties) -> Result<NodeId> {
        let properties = properties.checked()?;
        if self
            .children(parent)
            .any(|child| self.node(child).properties().same_as(&properties))
        {
            return Err(SgfError::DuplicateBranch { parent });
        }
        let id = self.alloc(Some(parent), properties);
        self.attach(parent, id);
        self.renumber();
        Ok(id)
    }

    // =========================================================================
    // Equality
    // =========================================================================

    /// Structural equality, ignoring node ids and branch order.
    ///
    /// Games match when their game-level properties, node counts and move
    /// counts agree and their trees have the same shape: equal trimmed
    /// properties, move numbers and lanes on corresponding nodes, matching
    /// continuations, and branch lists that pair up one-to-one.
    pub fn is_same_game(&self, other: &Game) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if !self.properties.same_as(&other.properties) {
            trace!("game properties differ");
            return false;
        }
        if self.node_count != other.node_count {
            trace!(
                ours = self.node_count,
                theirs = other.node_count,
                "node counts differ"
            );
            return false;
        }
        if self.move_count != other.move_count {
            trace!(
                ours = self.move_count,
                theirs = other.move_count,
                "move counts differ"
            );
            return false;
        }
        let mut shapes = ShapeInterner::default();
        let ours = shapes.classify(self);
        let theirs = shapes.classify(other);
        ours == theirs
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// The game as SGF text.
    ///
    /// Game-level properties and the root's own properties form the first
    /// node. Point lists are written as repeated `[point]` values. Derived
    /// properties are omitted.
    pub fn generated_sgf(&self) -> String {
        let mut out = String::from("(;");
        for (key, values) in self.properties.iter() {
            write_property(&mut out, key, values);
        }
        for (key, values) in self.root_node().properties().iter() {
            if !DERIVED_PROPERTIES.contains(&key) {
                write_property(&mut out, key, values);
            }
        }
        out.push('\n');
        self.write_children(self.root, &mut out);
        out.push(')');
        out
    }

    /// SGF for the position on `board` followed by the moves after `node`.
    ///
    /// The position is written as `AB`/`AW` setup stones in the first node,
    /// together with the game-level properties and the player to move.
    pub fn position_sgf(&self, node: NodeId, board: &Board) -> String {
        let mut out = String::from("(;");
        for (key, values) in self.properties.iter() {
            if key == PROP_ADD_BLACK || key == PROP_ADD_WHITE || key == PROP_PLAYER {
                continue;
            }
            let trimmed: Vec<String> = values.iter().map(|v| v.trim().to_string()).collect();
            write_property(&mut out, key, &trimmed);
        }

        let mut black = Vec::new();
        let mut white = Vec::new();
        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE {
                let Ok(point) = coords_to_alpha(x, y) else {
                    continue;
                };
                match board.get(x, y).map(|sq| sq.state) {
                    Some(StoneState::Black) => black.push(point),
                    Some(StoneState::White) => white.push(point),
                    _ => {}
                }
            }
        }
        if !black.is_empty() {
            write_property(&mut out, PROP_ADD_BLACK, &black);
        }
        if !white.is_empty() {
            write_property(&mut out, PROP_ADD_WHITE, &white);
        }

        match self.node(node).color() {
            StoneState::Black => out.push_str("PL[W]"),
            StoneState::White => out.push_str("PL[B]"),
            StoneState::Empty => {}
        }
        out.push('\n');

        if let Some(next) = self.node(node).next {
            self.write_subtree(next, &mut out);
        }
        out.push(')');
        out
    }

    /// Write what follows `id`: its continuation inline, or when it has
    /// branches, the continuation and each branch in parentheses.
    fn write_children(&self, id: NodeId, out: &mut String) {
        let mut tasks = Vec::new();
        push_children_tasks(self.node(id), &mut tasks);
        self.run_tasks(tasks, out);
    }

    fn write_subtree(&self, start: NodeId, out: &mut String) {
        self.run_tasks(vec![Emit::Node(start)], out);
    }

    fn run_tasks(&self, mut tasks: Vec<Emit>, out: &mut String) {
        while let Some(task) = tasks.pop() {
            match task {
                Emit::Text(text) => out.push_str(text),
                Emit::Node(id) => {
                    let node = self.node(id);
                    out.push(';');
                    for (key, values) in node.properties().iter() {
                        if !DERIVED_PROPERTIES.contains(&key) {
                            write_property(out, key, values);
                        }
                    }
                    out.push('\n');
                    push_children_tasks(node, &mut tasks);
                }
            }
        }
    }
}

/// Serialization work item; the stack is popped from the end.
enum Emit {
    Node(NodeId),
    Text(&'static str),
}

fn push_children_tasks(node: &GameNode, tasks: &mut Vec<Emit>) {
    let Some(next) = node.next else {
        return;
    };
    if node.branches.is_empty() {
        tasks.push(Emit::Node(next));
        return;
    }
    for &branch in node.branches.iter().rev() {
        tasks.push(Emit::Text(")\n"));
        tasks.push(Emit::Node(branch));
        tasks.push(Emit::Text("("));
    }
    tasks.push(Emit::Text(")\n"));
    tasks.push(Emit::Node(next));
    tasks.push(Emit::Text("("));
}

fn write_property(out: &mut String, key: &str, values: &[String]) {
    out.push_str(key);
    if POINT_LIST_PROPERTIES.contains(&key) {
        for point in values.iter().flat_map(|v| v.split(VALUE_SEPARATOR)) {
            out.push('[');
            out.push_str(point.trim());
            out.push(']');
        }
        return;
    }
    let compose = COMPOSE_PROPERTIES.contains(&key);
    for value in values {
        out.push('[');
        if compose {
            out.push_str(&escape_compose(value));
        } else {
            out.push_str(&escape(value));
        }
        out.push(']');
    }
}

/// Iterator along a line of play.
pub struct Line<'a> {
    game: &'a Game,
    next: Option<NodeId>,
}

impl Iterator for Line<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.game.node(id).next;
        Some(id)
    }
}

/// What identifies a subtree's shape, given the shape classes of its children.
#[derive(Debug, PartialEq, Eq, Hash)]
struct ShapeKey {
    properties: Vec<(String, String)>,
    move_no: Option<u32>,
    lane: usize,
    next: Option<usize>,
    branches: Vec<usize>,
}

/// Assigns equal ids to structurally equal subtrees, across games.
#[derive(Default)]
struct ShapeInterner {
    classes: HashMap<ShapeKey, usize>,
}

impl ShapeInterner {
    /// Shape class of the whole tree. Children are classified before their
    /// parents by walking the preorder backwards.
    fn classify(&mut self, game: &Game) -> usize {
        let mut class = vec![usize::MAX; game.nodes.len()];
        for id in game.preorder().into_iter().rev() {
            let node = game.node(id);
            let mut branches: Vec<usize> = node.branches.iter().map(|b| class[b.0]).collect();
            branches.sort_unstable();
            let key = ShapeKey {
                properties: node.properties().canonical(),
                move_no: node.move_no(),
                lane: node.lane(),
                next: node.next.map(|n| class[n.0]),
                branches,
            };
            let fresh = self.classes.len();
            class[id.0] = *self.classes.entry(key).or_insert(fresh);
        }
        class[game.root.0]
    }
}
