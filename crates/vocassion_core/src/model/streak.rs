//! Daily streak bookkeeping per `(profile, activity)`.
//!
//! # Invariants
//! - `longest_count >= current_count` after every check-in.
//! - At most one increment per calendar day.
//! - Dates are plain calendar dates; "today" is supplied by the caller.

use super::profile::ProfileId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Activity fed by daily challenge completion.
pub const ACTIVITY_DAILY_CHALLENGES: &str = "daily_challenges";
/// Activity fed by daily reflections.
pub const ACTIVITY_DAILY_REFLECTION: &str = "daily_reflection";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub profile_id: ProfileId,
    pub activity: String,
    pub current_count: u32,
    pub longest_count: u32,
    pub last_checkin: NaiveDate,
}

/// What a check-in did to a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInOutcome {
    /// No record existed; the streak starts at 1.
    Started,
    /// Last check-in was yesterday; the streak grew by one.
    Continued,
    /// Already checked in today (or a later date); nothing changed.
    AlreadyCheckedIn,
    /// A day or more was missed; the streak restarts at 1.
    Reset,
}

impl CheckInOutcome {
    /// True when the stored record changed.
    pub fn is_write(self) -> bool {
        !matches!(self, Self::AlreadyCheckedIn)
    }
}

impl Streak {
    /// Starts a streak with a first check-in on `today`.
    pub fn start(profile_id: ProfileId, activity: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            profile_id,
            activity: activity.into(),
            current_count: 1,
            longest_count: 1,
            last_checkin: today,
        }
    }

    /// Applies a check-in on `today`.
    pub fn check_in(&mut self, today: NaiveDate) -> CheckInOutcome {
        let days_since = (today - self.last_checkin).num_days();
        match days_since {
            i64::MIN..=0 => CheckInOutcome::AlreadyCheckedIn,
            1 => {
                self.current_count += 1;
                self.longest_count = self.longest_count.max(self.current_count);
                self.last_checkin = today;
                CheckInOutcome::Continued
            }
            _ => {
                self.current_count = 1;
                self.longest_count = self.longest_count.max(1);
                self.last_checkin = today;
                CheckInOutcome::Reset
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CheckInOutcome, Streak};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn consecutive_days_extend_streak() {
        let mut streak = Streak::start(Uuid::nil(), "daily_challenges", day(1));
        assert_eq!(streak.check_in(day(2)), CheckInOutcome::Continued);
        assert_eq!(streak.check_in(day(3)), CheckInOutcome::Continued);
        assert_eq!(streak.current_count, 3);
        assert_eq!(streak.longest_count, 3);
    }

    #[test]
    fn same_day_is_noop() {
        let mut streak = Streak::start(Uuid::nil(), "daily_challenges", day(5));
        assert_eq!(streak.check_in(day(5)), CheckInOutcome::AlreadyCheckedIn);
        assert_eq!(streak.current_count, 1);
    }

    #[test]
    fn earlier_date_is_noop() {
        let mut streak = Streak::start(Uuid::nil(), "daily_challenges", day(5));
        assert_eq!(streak.check_in(day(4)), CheckInOutcome::AlreadyCheckedIn);
        assert_eq!(streak.last_checkin, day(5));
    }

    #[test]
    fn gap_resets_current_but_keeps_longest() {
        let mut streak = Streak::start(Uuid::nil(), "daily_challenges", day(1));
        streak.check_in(day(2));
        streak.check_in(day(3));
        assert_eq!(streak.check_in(day(5)), CheckInOutcome::Reset);
        assert_eq!(streak.current_count, 1);
        assert_eq!(streak.longest_count, 3);
        assert_eq!(streak.last_checkin, day(5));
    }

    #[test]
    fn month_boundary_counts_as_consecutive() {
        let mut streak = Streak::start(
            Uuid::nil(),
            "daily_reflection",
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
        );
        assert_eq!(streak.check_in(day(1)), CheckInOutcome::Continued);
    }
}
