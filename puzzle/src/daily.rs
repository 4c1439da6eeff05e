//! Daily reward cycle and streak arithmetic.

use chrono::NaiveDate;

use crate::model::DailyRewardStats;

/// Number of days in one reward cycle.
pub const CYCLE_LENGTH: u32 = 7;

/// Cycle day (1..=7) of the reward offered for the given streak.
pub fn cycle_day(current_streak: u32) -> u32 {
    (current_streak % CYCLE_LENGTH) + 1
}

/// Outcome of checking the streak against today's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakCheck {
    pub streak_broken: bool,
    pub missed_days: i64,
}

/// A streak breaks once more than one full day separates today from the last
/// claim. A streak already at zero has nothing left to break.
pub fn evaluate_streak(stats: &DailyRewardStats, today: NaiveDate) -> StreakCheck {
    let Some(last) = stats.last_claim_date else {
        return StreakCheck::default();
    };
    let gap = (today - last).num_days();
    if gap > 1 && stats.current_streak > 0 {
        StreakCheck {
            streak_broken: true,
            missed_days: gap - 1,
        }
    } else {
        StreakCheck::default()
    }
}

/// Apply a streak check to the stats in place.
pub fn apply_streak_check(stats: &mut DailyRewardStats, check: StreakCheck) {
    if check.streak_broken {
        stats.current_streak = 0;
        stats.missed_days += check.missed_days;
    }
}

/// Bonus multiplier actually applied: non-finite or non-positive values fall
/// back to 1.
pub fn effective_multiplier(multiplier: f64) -> f64 {
    if multiplier.is_finite() && multiplier > 0.0 {
        multiplier
    } else {
        1.0
    }
}

/// Amount credited for a reward, scaled by a bonus multiplier (e.g. 2.0 after
/// a rewarded ad). Rounded to the nearest unit, never negative.
pub fn claimed_amount(amount: i64, multiplier: f64) -> i64 {
    ((amount as f64) * effective_multiplier(multiplier)).round().max(0.0) as i64
}

/// Stats after a successful claim today. `stats` must already reflect
/// [`evaluate_streak`].
pub fn record_claim(stats: &mut DailyRewardStats, today: NaiveDate) {
    stats.current_streak += 1;
    if stats.current_streak > stats.longest_streak {
        stats.longest_streak = stats.current_streak;
    }
    stats.total_claims += 1;
    stats.last_claim_date = Some(today);
    stats.next_reset_date = today.succ_opt();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cycle_wraps_every_seven_days() {
        assert_eq!(cycle_day(0), 1);
        assert_eq!(cycle_day(6), 7);
        assert_eq!(cycle_day(7), 1);
        assert_eq!(cycle_day(13), 7);
    }

    #[test]
    fn consecutive_days_keep_the_streak() {
        let stats = DailyRewardStats {
            current_streak: 3,
            last_claim_date: Some(date(2024, 3, 1)),
            ..DailyRewardStats::default()
        };
        assert!(!evaluate_streak(&stats, date(2024, 3, 1)).streak_broken);
        assert!(!evaluate_streak(&stats, date(2024, 3, 2)).streak_broken);
    }

    #[test]
    fn gap_breaks_streak_once() {
        let mut stats = DailyRewardStats {
            current_streak: 4,
            longest_streak: 4,
            last_claim_date: Some(date(2024, 3, 1)),
            ..DailyRewardStats::default()
        };
        let check = evaluate_streak(&stats, date(2024, 3, 5));
        assert_eq!(
            check,
            StreakCheck {
                streak_broken: true,
                missed_days: 3
            }
        );
        apply_streak_check(&mut stats, check);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.missed_days, 3);

        // already broken: a second evaluation changes nothing
        let again = evaluate_streak(&stats, date(2024, 3, 5));
        assert!(!again.streak_broken);
    }

    #[test]
    fn longest_streak_only_grows() {
        let mut stats = DailyRewardStats {
            current_streak: 0,
            longest_streak: 5,
            ..DailyRewardStats::default()
        };
        record_claim(&mut stats, date(2024, 3, 1));
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 5);
        assert_eq!(stats.next_reset_date, Some(date(2024, 3, 2)));

        stats.current_streak = 5;
        record_claim(&mut stats, date(2024, 3, 2));
        assert_eq!(stats.longest_streak, 6);
        assert_eq!(stats.total_claims, 2);
    }

    #[test]
    fn multiplier_scaling() {
        assert_eq!(claimed_amount(50, 1.0), 50);
        assert_eq!(claimed_amount(50, 2.0), 100);
        assert_eq!(claimed_amount(15, 1.5), 23);
        assert_eq!(claimed_amount(50, f64::NAN), 50);
    }
}
