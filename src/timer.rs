//! Roll-slot arithmetic and the countdown to the next slot boundary.
//!
//! Slots are derived from the room's `game_start_time` and a fixed slot
//! duration; nothing here mutates authoritative state.

use crate::types::SLOT_DURATION_SECS;

/// Index of the slot containing `now`. `None` while the game has not
/// started (`game_start_time <= 0`).
pub fn slot_index(game_start_time: i64, now: i64) -> Option<i64> {
    if game_start_time <= 0 {
        return None;
    }
    let elapsed = (now - game_start_time).max(0);
    Some(elapsed / SLOT_DURATION_SECS)
}

/// Epoch second at which the next slot opens.
pub fn next_slot_time(game_start_time: i64, now: i64) -> Option<i64> {
    let current = slot_index(game_start_time, now)?;
    Some(game_start_time + (current + 1) * SLOT_DURATION_SECS)
}

/// Seconds until the next slot opens.
pub fn seconds_remaining(game_start_time: i64, now: i64) -> Option<i64> {
    Some(next_slot_time(game_start_time, now)? - now)
}

/// `M:SS`, seconds zero-padded.
pub fn format_countdown(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn slot_index__first_slot_spans_the_full_duration() {
        assert_eq!(slot_index(1000, 1000), Some(0));
        assert_eq!(slot_index(1000, 1299), Some(0));
        assert_eq!(slot_index(1000, 1300), Some(1));
    }

    #[test]
    fn slot_index__advances_one_second_past_the_boundary() {
        // given a game started at T with a 300s slot, at T + 301
        let start = 1000;
        let now = start + 301;

        // then the second slot is active with 299s left
        assert_eq!(slot_index(start, now), Some(1));
        assert_eq!(seconds_remaining(start, now), Some(299));
    }

    #[test]
    fn next_slot_time__matches_the_worked_scenario() {
        // given gameStartTime=1000, now=1301
        assert_eq!(slot_index(1000, 1301), Some(1));
        assert_eq!(next_slot_time(1000, 1301), Some(1600));
        assert_eq!(seconds_remaining(1000, 1301), Some(299));
    }

    #[test]
    fn slot_index__none_before_the_game_starts() {
        assert_eq!(slot_index(0, 5000), None);
        assert_eq!(slot_index(-1, 5000), None);
        assert_eq!(seconds_remaining(0, 5000), None);
    }

    #[test]
    fn slot_index__clock_slightly_behind_start_counts_as_slot_zero() {
        assert_eq!(slot_index(1000, 998), Some(0));
    }

    #[test]
    fn format_countdown__zero_pads_seconds() {
        assert_eq!(format_countdown(299), "4:59");
        assert_eq!(format_countdown(300), "5:00");
        assert_eq!(format_countdown(5), "0:05");
        assert_eq!(format_countdown(0), "0:00");
        assert_eq!(format_countdown(-3), "0:00");
    }
}
