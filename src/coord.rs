//! SGF point encoding.
//!
//! A point is two letters from [`COORD_ALPHABET`], column then row. Setup
//! properties may also carry a comma-joined list of points or a rectangle
//! written as `aa:cc`; [`expand_point_list`] flattens both forms.

use crate::constants::{BOARD_SIZE, COORD_ALPHABET, DISPLAY_COLUMNS};
use crate::error::{Result, SgfError};

/// Decode a single SGF letter into an axis index.
fn letter_to_index(value: &str, letter: u8) -> Result<usize> {
    COORD_ALPHABET
        .iter()
        .position(|&c| c == letter)
        .ok_or_else(|| SgfError::coordinate(value, "character outside the coordinate alphabet"))
}

/// Parse a point string (e.g. `"pd"`) into `(x, y)`.
///
/// Only the first two characters are significant.
pub fn alpha_to_coords(value: &str) -> Result<(usize, usize)> {
    let bytes = value.as_bytes();
    if bytes.len() < 2 {
        return Err(SgfError::coordinate(value, "shorter than two characters"));
    }
    let x = letter_to_index(value, bytes[0])?;
    let y = letter_to_index(value, bytes[1])?;
    Ok((x, y))
}

/// Encode `(x, y)` as an SGF point string.
pub fn coords_to_alpha(x: usize, y: usize) -> Result<String> {
    if x >= BOARD_SIZE || y >= BOARD_SIZE {
        return Err(SgfError::OutOfBounds { x, y });
    }
    Ok(format!(
        "{}{}",
        COORD_ALPHABET[x] as char, COORD_ALPHABET[y] as char
    ))
}

/// Human-readable label for a point, e.g. `(15, 3)` is `"Q16"`.
pub fn display_label(x: usize, y: usize) -> String {
    format!("{}{}", DISPLAY_COLUMNS[x] as char, BOARD_SIZE - y)
}

/// Flatten a point-list value into individual point strings.
///
/// Accepts comma-separated points and `aa:bb` rectangles, in any mix.
/// Rectangles expand column by column, top to bottom within each column.
pub fn expand_point_list(value: &str) -> Result<Vec<String>> {
    let mut points = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once(':') {
            Some((from, to)) => {
                let (x0, y0) = alpha_to_coords(from)?;
                let (x1, y1) = alpha_to_coords(to)?;
                for x in x0.min(x1)..=x0.max(x1) {
                    for y in y0.min(y1)..=y0.max(y1) {
                        points.push(coords_to_alpha(x, y)?);
                    }
                }
            }
            None => {
                alpha_to_coords(part)?;
                points.push(part.to_string());
            }
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_to_coords() {
        assert_eq!(alpha_to_coords("aa").unwrap(), (0, 0));
        assert_eq!(alpha_to_coords("pd").unwrap(), (15, 3));
        assert_eq!(alpha_to_coords("ss").unwrap(), (18, 18));
    }

    #[test]
    fn test_alpha_to_coords_too_short() {
        let err = alpha_to_coords("a").unwrap_err();
        assert!(matches!(err, SgfError::Coordinate { .. }));
        assert!(alpha_to_coords("").is_err());
    }

    #[test]
    fn test_alpha_to_coords_outside_alphabet() {
        assert!(alpha_to_coords("tt").is_err());
        assert!(alpha_to_coords("A1").is_err());
    }

    #[test]
    fn test_coords_roundtrip() {
        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE {
                let s = coords_to_alpha(x, y).unwrap();
                assert_eq!(alpha_to_coords(&s).unwrap(), (x, y), "failed for {s}");
            }
        }
    }

    #[test]
    fn test_coords_to_alpha_off_board() {
        assert!(matches!(
            coords_to_alpha(19, 0),
            Err(SgfError::OutOfBounds { x: 19, y: 0 })
        ));
    }

    #[test]
    fn test_display_label_skips_i() {
        assert_eq!(display_label(0, 18), "A1");
        assert_eq!(display_label(8, 0), "J19");
        assert_eq!(display_label(15, 3), "Q16");
    }

    #[test]
    fn test_expand_comma_list() {
        assert_eq!(expand_point_list("aa,bb").unwrap(), vec!["aa", "bb"]);
        assert_eq!(expand_point_list("aa").unwrap(), vec!["aa"]);
        assert!(expand_point_list("").unwrap().is_empty());
    }

    #[test]
    fn test_expand_rectangle() {
        assert_eq!(
            expand_point_list("aa:bb").unwrap(),
            vec!["aa", "ab", "ba", "bb"]
        );
        // Corners given in reverse order cover the same rectangle.
        assert_eq!(
            expand_point_list("bb:aa").unwrap(),
            vec!["aa", "ab", "ba", "bb"]
        );
        assert_eq!(expand_point_list("ac:ae").unwrap(), vec!["ac", "ad", "ae"]);
    }

    #[test]
    fn test_expand_mixed() {
        assert_eq!(
            expand_point_list("dd,aa:ab").unwrap(),
            vec!["dd", "aa", "ab"]
        );
    }

    #[test]
    fn test_expand_rejects_bad_point() {
        assert!(expand_point_list("aa,z").is_err());
        assert!(expand_point_list("aa:z").is_err());
    }
}
