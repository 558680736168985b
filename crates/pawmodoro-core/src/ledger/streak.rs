//! Daily completion streak.
//!
//! The streak counts consecutive UTC days with at least one completed
//! session. Several completions on one day count once.

use chrono::{DateTime, Utc};

/// Streak value after a completion at `now`.
pub fn next_streak(current: u32, last_session_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    let Some(last) = last_session_at else {
        return 1;
    };

    let gap_days = (now.date_naive() - last.date_naive()).num_days();
    match gap_days {
        // Same day, or a clock that moved backwards.
        d if d <= 0 => current.max(1),
        1 => current.saturating_add(1),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn first_completion_starts_streak() {
        assert_eq!(next_streak(0, None, at(10, 9)), 1);
    }

    #[test]
    fn same_day_keeps_streak() {
        assert_eq!(next_streak(3, Some(at(10, 9)), at(10, 22)), 3);
    }

    #[test]
    fn next_day_extends_streak() {
        assert_eq!(next_streak(3, Some(at(10, 23)), at(11, 1)), 4);
    }

    #[test]
    fn gap_resets_streak() {
        assert_eq!(next_streak(7, Some(at(10, 9)), at(12, 9)), 1);
    }

    #[test]
    fn backwards_clock_does_not_reset() {
        let now = at(10, 9);
        assert_eq!(next_streak(2, Some(now + Duration::hours(30)), now), 2);
    }
}
