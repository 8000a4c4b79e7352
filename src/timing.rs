//! Per-move elapsed time derived from clock properties.
//!
//! `BL`/`WL` record the time a player has left after a move. Walking the
//! mainline, the time spent on a move is the previous reading for that color
//! minus the current one. A negative difference means the clock was reset
//! (byo-yomi, overtime), in which case the previous reading itself is used.
//!
//! Samples are clamped to the `i32` range. When one node carries both `BL`
//! and `WL`, the reading of the color that moved is stored on the node;
//! non-move nodes keep the black reading. Both readings still count toward
//! their color's summary.

use tracing::debug;

use crate::board::StoneState;
use crate::constants::{
    PROP_BLACK_TIME_LEFT, PROP_MAIN_TIME, PROP_TIME_SPENT, PROP_WHITE_TIME_LEFT,
};
use crate::game::Game;
use crate::node::NodeId;

/// Summary of one color's time spent per move, in whole seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveTimingInfo {
    pub min: i64,
    pub max: i64,
    pub average: i64,
    pub median: i64,
}

impl MoveTimingInfo {
    /// Aggregate samples. All fields are zero when there are none.
    ///
    /// The average truncates toward zero; the median of an even count is the
    /// truncated mean of the two middle samples.
    pub fn from_samples(samples: &[i64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            mean(&sorted[n / 2 - 1..=n / 2])
        };
        Self {
            min: sorted[0],
            max: sorted[n - 1],
            average: mean(&sorted),
            median,
        }
    }
}

/// Truncated mean of a non-empty slice, summed wide so it cannot overflow.
fn mean(values: &[i64]) -> i64 {
    let sum: i128 = values.iter().map(|&v| i128::from(v)).sum();
    (sum / values.len() as i128) as i64
}

fn whole_seconds(value: f64) -> i64 {
    value.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i64
}

/// Running clock state for one color.
struct ClockTracker {
    key: &'static str,
    previous: Option<f64>,
    samples: Vec<i64>,
}

impl ClockTracker {
    fn new(key: &'static str, main_time: Option<f64>) -> Self {
        Self {
            key,
            previous: main_time,
            samples: Vec::new(),
        }
    }

    /// Seconds spent reaching a reading of `left`, or `None` if the node has
    /// no usable reading for this color.
    fn observe(&mut self, raw: &str) -> Option<i64> {
        let left: f64 = match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                debug!(property = self.key, value = raw, "skipping unparseable clock value");
                return None;
            }
        };
        let spent = match self.previous {
            Some(previous) => {
                let diff = whole_seconds(previous - left);
                if diff < 0 { whole_seconds(previous) } else { diff }
            }
            None => 0,
        };
        self.previous = Some(left);
        self.samples.push(spent);
        Some(spent)
    }
}

/// Store the time spent on every timed mainline move as the derived
/// time-spent property and return the black and white summaries.
pub(crate) fn derive_move_timings(game: &mut Game) -> (MoveTimingInfo, MoveTimingInfo) {
    let main_time = game
        .property(PROP_MAIN_TIME)
        .and_then(|tm| tm.trim().parse::<f64>().ok());
    let mut black = ClockTracker::new(PROP_BLACK_TIME_LEFT, main_time);
    let mut white = ClockTracker::new(PROP_WHITE_TIME_LEFT, main_time);

    let line: Vec<NodeId> = game.mainline().collect();
    for id in line {
        let node = game.node(id);
        let props = node.properties();
        let black_spent = props.first(black.key).and_then(|raw| black.observe(raw));
        let white_spent = props.first(white.key).and_then(|raw| white.observe(raw));
        let spent = if node.color() == StoneState::White {
            white_spent.or(black_spent)
        } else {
            black_spent.or(white_spent)
        };
        if let Some(spent) = spent {
            game.node_mut(id)
                .properties_mut()
                .set(PROP_TIME_SPENT, spent.to_string());
        }
    }

    (
        MoveTimingInfo::from_samples(&black.samples),
        MoveTimingInfo::from_samples(&white.samples),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn processed(text: &str) -> Game {
        let mut game = parse(text).unwrap();
        game.post_process();
        game
    }

    fn spent(game: &Game) -> Vec<Option<String>> {
        game.mainline()
            .filter(|&id| game.node(id).is_move())
            .map(|id| game.node(id).property(PROP_TIME_SPENT).map(|v| v.into_owned()))
            .collect()
    }

    #[test]
    fn test_from_samples_odd() {
        let info = MoveTimingInfo::from_samples(&[5, 1, 3]);
        assert_eq!(
            info,
            MoveTimingInfo {
                min: 1,
                max: 5,
                average: 3,
                median: 3
            }
        );
    }

    #[test]
    fn test_from_samples_even_median() {
        let info = MoveTimingInfo::from_samples(&[10, 2, 4, 7]);
        assert_eq!(info.median, 5);
        assert_eq!(info.average, 5);
    }

    #[test]
    fn test_from_samples_empty() {
        assert_eq!(MoveTimingInfo::from_samples(&[]), MoveTimingInfo::default());
    }

    #[test]
    fn test_elapsed_per_color() {
        let game = processed(
            "(;GM[1];B[aa]BL[300];W[bb]WL[300];B[cc]BL[290];W[dd]WL[280];B[ee]BL[285.6])",
        );
        assert!(game.timing_info_found());
        assert_eq!(
            spent(&game),
            [
                Some("0".to_string()),
                Some("0".to_string()),
                Some("10".to_string()),
                Some("20".to_string()),
                Some("4".to_string()),
            ]
        );
        assert_eq!(game.black_timings().max, 10);
        assert_eq!(game.white_timings().max, 20);
    }

    #[test]
    fn test_clock_reset_falls_back_to_previous_reading() {
        let game = processed("(;GM[1];B[aa]BL[5];W[bb];B[cc]BL[30])");
        let values = spent(&game);
        assert_eq!(values[2].as_deref(), Some("5"));
    }

    #[test]
    fn test_main_time_used_for_first_move() {
        let game = processed("(;GM[1]TM[600];B[aa]BL[590];W[bb]WL[570])");
        let values = spent(&game);
        assert_eq!(values[0].as_deref(), Some("10"));
        assert_eq!(values[1].as_deref(), Some("30"));
    }

    #[test]
    fn test_unparseable_values_are_skipped() {
        let game = processed("(;GM[1];B[aa]BL[300];W[bb];B[cc]BL[soon];B[dd]BL[280])");
        let values = spent(&game);
        assert_eq!(values[2], None);
        assert_eq!(values[3].as_deref(), Some("20"));
        assert_eq!(game.black_timings().min, 0);
        assert_eq!(game.black_timings().max, 20);
    }

    #[test]
    fn test_no_clock_properties() {
        let game = processed("(;GM[1];B[aa];W[bb])");
        assert!(!game.timing_info_found());
        assert_eq!(game.black_timings(), MoveTimingInfo::default());
        assert!(spent(&game).iter().all(Option::is_none));
    }

    #[test]
    fn test_huge_clock_values_do_not_overflow() {
        let game = processed(
            "(;GM[1];B[aa]BL[3e300];W[bb];B[cc]BL[2e300];W[dd];B[ee]BL[1e300])",
        );
        let black = game.black_timings();
        assert_eq!(black.max, i64::from(i32::MAX));
        assert_eq!(black.min, 0);
        assert_eq!(black.median, i64::from(i32::MAX));
        assert!(black.average > 0);
    }

    #[test]
    fn test_wide_samples_average_without_overflow() {
        let info = MoveTimingInfo::from_samples(&[i64::MAX, i64::MAX - 1]);
        assert_eq!(info.median, i64::MAX - 1);
        assert_eq!(info.average, i64::MAX - 1);
    }

    #[test]
    fn test_mover_reading_wins_on_shared_node() {
        let game = processed("(;GM[1]TM[100];B[aa]BL[90]WL[70];W[bb]BL[80]WL[60])");
        let values = spent(&game);
        assert_eq!(values[0].as_deref(), Some("10"));
        assert_eq!(values[1].as_deref(), Some("10"));
        assert_eq!(game.black_timings().max, 10);
        assert_eq!(game.white_timings().max, 30);
        assert_eq!(game.white_timings().min, 10);
    }

    #[test]
    fn test_variations_are_not_timed() {
        let game = processed("(;GM[1];B[aa]BL[300](;W[bb]WL[250])(;W[cc]WL[100]))");
        let first = game.first_move().unwrap();
        let branch = game.node(first).branches()[0];
        assert!(game.node(branch).property(PROP_TIME_SPENT).is_none());
    }
}
