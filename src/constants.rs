//! Constants for board geometry, SGF property identifiers and layout lanes.
//!
//! The board is a fixed 19x19 grid addressed by `(x, y)` with both axes in
//! `0..BOARD_SIZE`. SGF encodes a point as two lowercase letters, column
//! first, so `"pd"` is `(15, 3)`.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN). Only the standard 19x19 board is supported.
pub const BOARD_SIZE: usize = 19;

/// SGF coordinate letters, `a` = 0 through `s` = 18.
pub const COORD_ALPHABET: &[u8; BOARD_SIZE] = b"abcdefghijklmnopqrs";

/// Display column labels (GTP convention, skipping `I`).
pub const DISPLAY_COLUMNS: &[u8; BOARD_SIZE] = b"ABCDEFGHJKLMNOPQRST";

/// Point value that encodes a pass on a 19x19 board.
pub const PASS_COORD: &str = "tt";

// =============================================================================
// Property Identifiers
// =============================================================================

/// Black move.
pub const PROP_BLACK: &str = "B";

/// White move.
pub const PROP_WHITE: &str = "W";

/// Setup: add black stones.
pub const PROP_ADD_BLACK: &str = "AB";

/// Setup: add white stones.
pub const PROP_ADD_WHITE: &str = "AW";

/// Setup: clear points.
pub const PROP_ADD_EMPTY: &str = "AE";

/// Player to move.
pub const PROP_PLAYER: &str = "PL";

/// Comment text.
pub const PROP_COMMENT: &str = "C";

/// Black time left after the move, in seconds.
pub const PROP_BLACK_TIME_LEFT: &str = "BL";

/// White time left after the move, in seconds.
pub const PROP_WHITE_TIME_LEFT: &str = "WL";

/// Main time per player, in seconds.
pub const PROP_MAIN_TIME: &str = "TM";

/// Derived property holding the seconds spent on a move. Never serialized.
pub const PROP_TIME_SPENT: &str = "TimeSpentOnMove";

/// Properties whose values are lists of points.
pub const POINT_LIST_PROPERTIES: &[&str] = &[PROP_ADD_BLACK, PROP_ADD_WHITE, PROP_ADD_EMPTY];

/// Properties whose values are compose types (`value:value`); the colon in
/// these is structural and is not escaped on output.
pub const COMPOSE_PROPERTIES: &[&str] = &["AP", "AR", "FG", "LB", "LN", "SZ"];

/// Properties computed by post-processing rather than read from the source.
pub const DERIVED_PROPERTIES: &[&str] = &[PROP_TIME_SPENT];

/// Separator used when a property's repeated values are read as one string.
pub const VALUE_SEPARATOR: char = ',';

// =============================================================================
// Branch Layout
// =============================================================================

/// Lane of the mainline.
pub const MAINLINE_LANE: usize = 0;

/// Lowest lane a branch of the mainline may occupy.
pub const FIRST_BRANCH_LANE: usize = 2;
