//! 19x19 board replay.
//!
//! The board follows a game: [`Board::make_move`] places the stone a node
//! plays, removes enemy groups left without liberties and remembers what it
//! changed so [`Board::undo_move`] can put everything back. There is no
//! suicide or ko check; a move is always accepted.
//!
//! Observers implementing [`BoardListener`] are told about every change.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::constants::{BOARD_SIZE, DISPLAY_COLUMNS, PROP_ADD_BLACK, PROP_ADD_EMPTY, PROP_ADD_WHITE};
use crate::coord::alpha_to_coords;
use crate::error::{Result, SgfError};
use crate::game::Game;
use crate::node::{GameNode, NodeId};

pub type Point = (usize, usize);

/// Content of a board point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum StoneState {
    #[default]
    Empty,
    Black,
    White,
}

impl StoneState {
    /// The other player's color. Fails for `Empty`.
    pub fn opposite(self) -> Result<StoneState> {
        match self {
            StoneState::Black => Ok(StoneState::White),
            StoneState::White => Ok(StoneState::Black),
            StoneState::Empty => Err(SgfError::OppositeOfEmpty),
        }
    }

    pub fn is_empty(self) -> bool {
        self == StoneState::Empty
    }

    fn symbol(self) -> char {
        match self {
            StoneState::Black => 'X',
            StoneState::White => 'O',
            StoneState::Empty => '.',
        }
    }
}

/// A point and what is on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Square {
    pub x: usize,
    pub y: usize,
    pub state: StoneState,
}

impl Square {
    pub fn new(x: usize, y: usize, state: StoneState) -> Self {
        Self { x, y, state }
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

/// A maximal set of same-colored stones connected horizontally or vertically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub color: StoneState,
    pub stones: Vec<Square>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.stones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.stones.iter().any(|s| s.x == x && s.y == y)
    }

    /// Number of distinct empty points adjacent to the group.
    pub fn liberties(&self, board: &Board) -> usize {
        let mut seen = [[false; BOARD_SIZE]; BOARD_SIZE];
        let mut count = 0;
        for stone in &self.stones {
            for (nx, ny) in neighbors(stone.x, stone.y) {
                if !seen[nx][ny] && board.squares[nx][ny].is_empty() {
                    seen[nx][ny] = true;
                    count += 1;
                }
            }
        }
        count
    }

    /// A group without liberties is captured.
    pub fn is_dead(&self, board: &Board) -> bool {
        self.liberties(board) == 0
    }
}

/// Observer of board changes. Every hook defaults to doing nothing.
pub trait BoardListener {
    fn on_place_stone(&mut self, _x: usize, _y: usize, _color: StoneState) {}
    fn on_remove_stone(&mut self, _x: usize, _y: usize) {}
    fn on_play_move(&mut self, _node: &GameNode, _prev: Option<&GameNode>) {}
    fn on_undo_move(&mut self, _node: &GameNode, _prev: Option<&GameNode>) {}
    fn on_reset_to_initial_position(&mut self) {}
}

/// What one `make_move` changed, in the order it changed it.
#[derive(Debug, Default)]
struct MoveRecord {
    setup: Vec<Square>,
    played: Option<Square>,
    captured: Vec<Group>,
}

fn neighbors(x: usize, y: usize) -> impl Iterator<Item = Point> {
    let mut v = Vec::with_capacity(4);
    if x > 0 {
        v.push((x - 1, y));
    }
    if x + 1 < BOARD_SIZE {
        v.push((x + 1, y));
    }
    if y > 0 {
        v.push((x, y - 1));
    }
    if y + 1 < BOARD_SIZE {
        v.push((x, y + 1));
    }
    v.into_iter()
}

fn check_bounds(x: usize, y: usize) -> Result<()> {
    if x >= BOARD_SIZE || y >= BOARD_SIZE {
        return Err(SgfError::OutOfBounds { x, y });
    }
    Ok(())
}

pub struct Board {
    squares: [[Square; BOARD_SIZE]; BOARD_SIZE],
    listeners: Vec<Box<dyn BoardListener>>,
    history: HashMap<NodeId, MoveRecord>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            squares: Self::empty_squares(),
            listeners: Vec::new(),
            history: HashMap::new(),
        }
    }

    fn empty_squares() -> [[Square; BOARD_SIZE]; BOARD_SIZE] {
        std::array::from_fn(|x| std::array::from_fn(|y| Square::new(x, y, StoneState::Empty)))
    }

    /// Build a board from text rows. Row `y` of the text is board row `y`;
    /// `x`/`X` is black, `o`/`O` white, anything else empty.
    pub fn from_diagram(diagram: &str) -> Board {
        let mut board = Board::new();
        for (y, line) in diagram.lines().take(BOARD_SIZE).enumerate() {
            for (x, ch) in line.chars().take(BOARD_SIZE).enumerate() {
                let state = match ch {
                    'x' | 'X' => StoneState::Black,
                    'o' | 'O' => StoneState::White,
                    _ => continue,
                };
                board.squares[x][y].state = state;
            }
        }
        board
    }

    pub fn add_listener(&mut self, listener: Box<dyn BoardListener>) {
        self.listeners.push(listener);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Square> {
        self.squares.get(x).and_then(|col| col.get(y)).copied()
    }

    pub fn stone_count(&self, color: StoneState) -> usize {
        self.squares
            .iter()
            .flatten()
            .filter(|sq| sq.state == color)
            .count()
    }

    /// Every occupied point, column by column.
    pub fn stones(&self) -> Vec<Square> {
        self.squares
            .iter()
            .flatten()
            .filter(|sq| !sq.is_empty())
            .copied()
            .collect()
    }

    /// Set a point without any capture logic. Placing `Empty` clears it.
    pub fn place_stone(&mut self, color: StoneState, x: usize, y: usize) -> Result<()> {
        check_bounds(x, y)?;
        if color.is_empty() {
            return self.remove_stone(x, y);
        }
        self.squares[x][y].state = color;
        for listener in &mut self.listeners {
            listener.on_place_stone(x, y, color);
        }
        Ok(())
    }

    pub fn remove_stone(&mut self, x: usize, y: usize) -> Result<()> {
        check_bounds(x, y)?;
        self.squares[x][y].state = StoneState::Empty;
        for listener in &mut self.listeners {
            listener.on_remove_stone(x, y);
        }
        Ok(())
    }

    /// Clear every point and forget all recorded moves.
    pub fn reset(&mut self) {
        self.squares = Self::empty_squares();
        self.history.clear();
        for listener in &mut self.listeners {
            listener.on_reset_to_initial_position();
        }
    }

    /// Play `node` on the board.
    ///
    /// Setup stones (`AB`, `AW`, `AE`) are applied first, then the move
    /// itself, then enemy groups next to the new stone that have no liberties
    /// are removed. Passes and setup-only nodes change no point through the
    /// move step. Listeners are told about the move in every case.
    pub fn make_move(&mut self, node: &GameNode, prev: Option<&GameNode>) -> Result<()> {
        let mut record = MoveRecord::default();

        for (key, color) in [
            (PROP_ADD_BLACK, StoneState::Black),
            (PROP_ADD_WHITE, StoneState::White),
            (PROP_ADD_EMPTY, StoneState::Empty),
        ] {
            for point in node.properties().values(key).unwrap_or_default() {
                let (x, y) = alpha_to_coords(point)?;
                record.setup.push(self.squares[x][y]);
                self.place_stone(color, x, y)?;
            }
        }

        if let Some((x, y)) = node.coords()? {
            let color = node.color();
            record.played = Some(self.squares[x][y]);
            self.place_stone(color, x, y)?;
            record.captured = self.capture_around(x, y, color.opposite()?)?;
        }

        self.history.insert(node.id(), record);
        for listener in &mut self.listeners {
            listener.on_play_move(node, prev);
        }
        Ok(())
    }

    /// Take back `node`, restoring captured stones and any points its setup
    /// properties overwrote.
    pub fn undo_move(&mut self, node: &GameNode, prev: Option<&GameNode>) -> Result<()> {
        match self.history.remove(&node.id()) {
            Some(record) => {
                for group in &record.captured {
                    for stone in &group.stones {
                        self.place_stone(stone.state, stone.x, stone.y)?;
                    }
                }
                if let Some(square) = record.played {
                    self.place_stone(square.state, square.x, square.y)?;
                }
                for square in record.setup.iter().rev() {
                    self.place_stone(square.state, square.x, square.y)?;
                }
                trace!(node = %node.id(), restored = record.captured.len(), "undid move");
            }
            None => {
                if let Some((x, y)) = node.coords()? {
                    self.remove_stone(x, y)?;
                }
            }
        }
        for listener in &mut self.listeners {
            listener.on_undo_move(node, prev);
        }
        Ok(())
    }

    /// Remove groups of `color` adjacent to `(x, y)` that have no liberties.
    fn capture_around(&mut self, x: usize, y: usize, color: StoneState) -> Result<Vec<Group>> {
        let mut captured: Vec<Group> = Vec::new();
        for (nx, ny) in neighbors(x, y) {
            if self.squares[nx][ny].state != color || captured.iter().any(|g| g.contains(nx, ny)) {
                continue;
            }
            let group = self.collect_group(nx, ny);
            if group.is_dead(self) {
                captured.push(group);
            }
        }
        for group in &captured {
            self.remove_group(group)?;
        }
        if !captured.is_empty() {
            let stones: usize = captured.iter().map(Group::len).sum();
            trace!(x, y, groups = captured.len(), stones, "captured");
        }
        Ok(captured)
    }

    fn remove_group(&mut self, group: &Group) -> Result<()> {
        for stone in &group.stones {
            self.remove_stone(stone.x, stone.y)?;
        }
        Ok(())
    }

    /// The group containing the stone at `(x, y)`.
    fn collect_group(&self, x: usize, y: usize) -> Group {
        let mut visited = [[false; BOARD_SIZE]; BOARD_SIZE];
        self.flood_group(x, y, &mut visited)
    }

    fn flood_group(&self, x: usize, y: usize, visited: &mut [[bool; BOARD_SIZE]; BOARD_SIZE]) -> Group {
        let color = self.squares[x][y].state;
        let mut stones = Vec::new();
        let mut stack = vec![(x, y)];
        while let Some((cx, cy)) = stack.pop() {
            if visited[cx][cy] {
                continue;
            }
            visited[cx][cy] = true;
            stones.push(self.squares[cx][cy]);
            for (nx, ny) in neighbors(cx, cy) {
                if !visited[nx][ny] && self.squares[nx][ny].state == color {
                    stack.push((nx, ny));
                }
            }
        }
        Group { color, stones }
    }

    /// Partition the stones of `color` into groups, scanning column by column.
    pub fn find_distinct_groups(&self, color: StoneState) -> Vec<Group> {
        let mut visited = [[false; BOARD_SIZE]; BOARD_SIZE];
        let mut groups = Vec::new();
        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE {
                if !visited[x][y] && self.squares[x][y].state == color {
                    groups.push(self.flood_group(x, y, &mut visited));
                }
            }
        }
        groups
    }

    /// Remove every group of `color` without liberties and return them.
    pub fn remove_dead_groups(&mut self, color: StoneState) -> Result<Vec<Group>> {
        let board: &Board = self;
        let dead: Vec<Group> = board
            .find_distinct_groups(color)
            .into_iter()
            .filter(|g| g.is_dead(board))
            .collect();
        for group in &dead {
            self.remove_group(group)?;
        }
        Ok(dead)
    }

    /// Remove dead groups of the color opposing `color`.
    pub fn remove_dead_groups_for_opp_color(&mut self, color: StoneState) -> Result<Vec<Group>> {
        self.remove_dead_groups(color.opposite()?)
    }

    /// Rebuild the position at `target` by replaying from an empty board:
    /// game-level setup stones first, then every node from the root down.
    pub fn fast_forward_to(&mut self, game: &Game, target: NodeId) -> Result<()> {
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(id) = cursor {
            path.push(id);
            cursor = game.node(id).parent();
        }

        self.reset();
        for (key, color) in [
            (PROP_ADD_BLACK, StoneState::Black),
            (PROP_ADD_WHITE, StoneState::White),
        ] {
            for point in game.properties().values(key).unwrap_or_default() {
                let (x, y) = alpha_to_coords(point)?;
                self.place_stone(color, x, y)?;
            }
        }

        let mut prev: Option<&GameNode> = None;
        for &id in path.iter().rev() {
            let node = game.node(id);
            self.make_move(node, prev)?;
            prev = Some(node);
        }
        trace!(node = %target, nodes = path.len(), "fast-forwarded");
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for &col in DISPLAY_COLUMNS.iter() {
            write!(f, "{} ", col as char)?;
        }
        writeln!(f)?;
        for y in 0..BOARD_SIZE {
            write!(f, "{:>2} ", BOARD_SIZE - y)?;
            for x in 0..BOARD_SIZE {
                write!(f, "{} ", self.squares[x][y].state.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::Properties;

    fn move_node(id: usize, key: &str, point: &str) -> GameNode {
        let props: Properties = [(key, point)].into_iter().collect();
        GameNode::new(NodeId(id), None, props)
    }

    #[test]
    fn test_opposite() {
        assert_eq!(StoneState::Black.opposite().unwrap(), StoneState::White);
        assert_eq!(StoneState::White.opposite().unwrap(), StoneState::Black);
        assert!(matches!(
            StoneState::Empty.opposite(),
            Err(SgfError::OppositeOfEmpty)
        ));
    }

    #[test]
    fn test_place_and_remove() {
        let mut board = Board::new();
        board.place_stone(StoneState::Black, 3, 4).unwrap();
        assert_eq!(board.get(3, 4).unwrap().state, StoneState::Black);
        board.remove_stone(3, 4).unwrap();
        assert!(board.get(3, 4).unwrap().is_empty());
        assert!(board.place_stone(StoneState::Black, 19, 0).is_err());
        assert_eq!(board.get(19, 0), None);
    }

    #[test]
    fn test_liberties() {
        let board = Board::from_diagram("xo\no");
        let groups = board.find_distinct_groups(StoneState::Black);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].liberties(&board), 0);
        assert!(groups[0].is_dead(&board));

        let whites = board.find_distinct_groups(StoneState::White);
        assert_eq!(whites.len(), 2);
        assert!(whites.iter().all(|g| !g.is_dead(&board)));
    }

    #[test]
    fn test_shared_liberty_counted_once() {
        let board = Board::from_diagram("...\n.x.\nx..");
        let groups = board.find_distinct_groups(StoneState::Black);
        assert_eq!(groups.len(), 2);
        // (0, 1) touches both stones but belongs to each group once.
        assert_eq!(groups[0].liberties(&board), 3);
        assert_eq!(groups[1].liberties(&board), 4);
    }

    #[test]
    fn test_full_edge_row_dies() {
        let board = Board::from_diagram("xxxxxxxxxxxxxxxxxxx\nooooooooooooooooooo");
        let groups = board.find_distinct_groups(StoneState::Black);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), BOARD_SIZE);
        assert!(groups[0].is_dead(&board));
    }

    #[test]
    fn test_make_move_captures_and_undo_restores() {
        let mut board = Board::from_diagram(".o\nox");
        // Black at (1,1) is surrounded after white plays (2,1) and (1,2).
        let w1 = move_node(1, "W", "cb");
        let w2 = move_node(2, "W", "bc");
        board.make_move(&w1, None).unwrap();
        assert_eq!(board.get(1, 1).unwrap().state, StoneState::Black);
        board.make_move(&w2, Some(&w1)).unwrap();
        assert!(board.get(1, 1).unwrap().is_empty());

        board.undo_move(&w2, Some(&w1)).unwrap();
        assert_eq!(board.get(1, 1).unwrap().state, StoneState::Black);
        assert!(board.get(1, 2).unwrap().is_empty());
    }

    #[test]
    fn test_pass_changes_nothing() {
        let mut board = Board::from_diagram("x");
        let before = board.stones();
        let pass = move_node(1, "W", "tt");
        board.make_move(&pass, None).unwrap();
        assert_eq!(board.stones(), before);
        board.undo_move(&pass, None).unwrap();
        assert_eq!(board.stones(), before);
    }

    #[test]
    fn test_setup_properties_applied_and_undone() {
        let mut board = Board::from_diagram("o");
        let props: Properties = [("AB", "bb"), ("AB", "cc"), ("AE", "aa")].into_iter().collect();
        let setup = GameNode::new(NodeId(3), None, props);
        board.make_move(&setup, None).unwrap();
        assert_eq!(board.get(1, 1).unwrap().state, StoneState::Black);
        assert_eq!(board.get(2, 2).unwrap().state, StoneState::Black);
        assert!(board.get(0, 0).unwrap().is_empty());

        board.undo_move(&setup, None).unwrap();
        assert_eq!(board.stones(), vec![Square::new(0, 0, StoneState::White)]);
    }

    #[test]
    fn test_undo_without_record_removes_stone() {
        let mut board = Board::new();
        board.place_stone(StoneState::Black, 15, 3).unwrap();
        let node = move_node(9, "B", "pd");
        board.undo_move(&node, None).unwrap();
        assert!(board.get(15, 3).unwrap().is_empty());
    }

    #[test]
    fn test_remove_dead_groups_for_opp_color() {
        let mut board = Board::from_diagram("xo\no");
        let removed = board
            .remove_dead_groups_for_opp_color(StoneState::White)
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert!(board.get(0, 0).unwrap().is_empty());
        assert!(board.remove_dead_groups_for_opp_color(StoneState::Empty).is_err());
    }

    #[test]
    fn test_display() {
        let board = Board::from_diagram("x.o");
        let text = board.to_string();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("   A B C D E F G H J"));
        assert!(lines.next().unwrap().starts_with("19 X . O ."));
        assert_eq!(text.lines().count(), BOARD_SIZE + 1);
    }
}
