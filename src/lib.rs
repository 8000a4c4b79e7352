//! sgf-go: SGF game records for Go.
//!
//! Parses SGF text into a game tree, numbers moves, lays out variations for
//! drawing, replays positions on a 19x19 board and writes SGF back out.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, coordinate alphabet, property names
//! - [`error`] - Error types
//! - [`coord`] - SGF point encoding and point lists
//! - [`properties`] - Ordered property map
//! - [`parser`] - SGF grammar and value escaping
//! - [`node`] - Game tree nodes
//! - [`game`] - The game record: numbering, editing, equality, output
//! - [`timing`] - Time spent per move from clock properties
//! - [`layout`] - Rendering lanes for variations
//! - [`board`] - Board replay with captures and undo
//! - [`sgf`] - Reading and writing files
//! - [`compare`] - Duplicate detection
//!
//! ## Example
//!
//! ```
//! use sgf_go::board::{Board, StoneState};
//! use sgf_go::sgf;
//!
//! let game = sgf::from_str("(;GM[1]FF[4];B[pd];W[dp];B[pc])").unwrap();
//! assert_eq!(game.move_count(), 3);
//!
//! let last = game.last_move().unwrap();
//! let mut board = Board::new();
//! board.fast_forward_to(&game, last).unwrap();
//! assert_eq!(board.stone_count(StoneState::Black), 2);
//!
//! let text = game.generated_sgf();
//! assert!(sgf::from_str(&text).unwrap().is_same_game(&game));
//! ```

pub mod board;
pub mod compare;
pub mod constants;
pub mod coord;
pub mod error;
pub mod game;
pub mod layout;
pub mod node;
pub mod parser;
pub mod properties;
pub mod sgf;
pub mod timing;

pub use error::{Result, SgfError};
pub use game::Game;
pub use node::{GameNode, NodeId};
