//! Progression use cases: points, levels, streaks and achievements.
//!
//! # Responsibility
//! - Credit the points ledger and report balances and levels.
//! - Apply streak check-ins and unlock streak achievements.
//! - Recompute challenge achievements from the completed-challenge count.
//!
//! # Invariants
//! - Every mutating call runs in one immediate transaction.
//! - Achievement awarding is additive and idempotent; it never credits points.
//! - The crate-internal helpers take the caller's transaction so other
//!   services can compose them into a single atomic user action.

use super::{begin_immediate, ServiceError, ServiceResult};
use crate::model::achievement::{challenge_achievements_reached, streak_milestone, Achievement};
use crate::model::challenge::Challenge;
use crate::model::goal::Goal;
use crate::model::ikigai::IkigaiMap;
use crate::model::ledger::{level_for_points, LedgerAudit, Penalty, Reward};
use crate::model::profile::{Profile, ProfileId};
use crate::model::streak::{CheckInOutcome, Streak, ACTIVITY_DAILY_REFLECTION};
use crate::model::{require_points, ValidationError};
use crate::repo::achievement_repo::{AchievementRepository, SqliteAchievementRepository};
use crate::repo::challenge_repo::{ChallengeRepository, SqliteChallengeRepository};
use crate::repo::goal_repo::{GoalRepository, SqliteGoalRepository};
use crate::repo::ikigai_repo::{IkigaiRepository, SqliteIkigaiRepository};
use crate::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use crate::repo::streak_repo::{SqliteStreakRepository, StreakRepository};
use chrono::NaiveDate;
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;

/// Description used for ad-hoc point grants.
pub const DEFAULT_POINTS_DESCRIPTION: &str = "Points awarded";

/// Rows per list on the dashboard.
pub const DASHBOARD_LIST_LIMIT: u32 = 5;

/// Dashboard view of a profile's progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// Newest first.
    pub achievements: Vec<Achievement>,
    pub streaks: Vec<Streak>,
    pub points: i64,
    pub level: i64,
}

/// Result of one streak check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakUpdate {
    pub streak: Streak,
    pub outcome: CheckInOutcome,
    /// Streak achievement unlocked by this check-in, if any.
    pub unlocked: Option<Achievement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityOutcome {
    pub total_points: i64,
    pub streak: Option<StreakUpdate>,
}

/// Full ledger listing with its audit line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerHistory {
    pub rewards: Vec<Reward>,
    pub penalties: Vec<Penalty>,
    pub audit: LedgerAudit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub completed_tasks: u32,
    pub total_achievements: u32,
    pub streak_count: usize,
    /// Ledger balance.
    pub current_points: i64,
}

/// Landing page aggregate; every list is newest first and capped at
/// [`DASHBOARD_LIST_LIMIT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub profile: Profile,
    pub ikigai_map: Option<IkigaiMap>,
    pub goals: Vec<Goal>,
    pub challenges: Vec<Challenge>,
    pub achievements: Vec<Achievement>,
    pub stats: DashboardStats,
}

pub struct ProgressionService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> ProgressionService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Appends a reward and returns the new total.
    ///
    /// # Errors
    /// - `Validation` when `amount <= 0` or above [`crate::model::MAX_POINTS`].
    pub fn add_points(
        &mut self,
        profile_id: ProfileId,
        amount: i64,
        description: &str,
    ) -> ServiceResult<i64> {
        let tx = begin_immediate(self.conn)?;
        let total = credit_points(&tx, profile_id, amount, description)?;
        tx.commit()?;
        Ok(total)
    }

    pub fn total_points(&self, profile_id: ProfileId) -> ServiceResult<i64> {
        Ok(SqliteLedgerRepository::new(&*self.conn).balance(profile_id)?)
    }

    pub fn level(&self, profile_id: ProfileId) -> ServiceResult<i64> {
        Ok(level_for_points(self.total_points(profile_id)?))
    }

    pub fn snapshot(&self, profile_id: ProfileId) -> ServiceResult<ProgressSnapshot> {
        let achievements =
            SqliteAchievementRepository::new(&*self.conn).list_achievements(profile_id, None)?;
        let streaks = SqliteStreakRepository::new(&*self.conn).list_streaks(profile_id)?;
        let points = self.total_points(profile_id)?;
        Ok(ProgressSnapshot {
            achievements,
            streaks,
            points,
            level: level_for_points(points),
        })
    }

    pub fn dashboard(&self, profile: Profile) -> ServiceResult<Dashboard> {
        let conn = &*self.conn;
        let achievements = SqliteAchievementRepository::new(conn);
        let challenges = SqliteChallengeRepository::new(conn);

        let mut goals = SqliteGoalRepository::new(conn).list_goals(profile.id)?;
        goals.truncate(DASHBOARD_LIST_LIMIT as usize);
        let mut recent_challenges = challenges.list_challenges(profile.id)?;
        recent_challenges.truncate(DASHBOARD_LIST_LIMIT as usize);

        let stats = DashboardStats {
            completed_tasks: challenges.count_completed(profile.id)?,
            total_achievements: achievements.count_achievements(profile.id)?,
            streak_count: SqliteStreakRepository::new(conn)
                .list_streaks(profile.id)?
                .len(),
            current_points: self.total_points(profile.id)?,
        };
        let ikigai_map = SqliteIkigaiRepository::new(conn).get_map(profile.id)?;
        let recent_achievements =
            achievements.list_achievements(profile.id, Some(DASHBOARD_LIST_LIMIT))?;
        Ok(Dashboard {
            profile,
            ikigai_map,
            goals,
            challenges: recent_challenges,
            achievements: recent_achievements,
            stats,
        })
    }

    /// Credits `points` for an activity; `daily_reflection` also checks in
    /// that streak.
    pub fn record_activity(
        &mut self,
        profile_id: ProfileId,
        activity: &str,
        points: i64,
        today: NaiveDate,
    ) -> ServiceResult<ActivityOutcome> {
        let activity = activity.trim();
        if activity.is_empty() {
            return Err(ValidationError::Required("type").into());
        }

        let tx = begin_immediate(self.conn)?;
        let total_points = credit_points(&tx, profile_id, points, DEFAULT_POINTS_DESCRIPTION)?;
        let streak = if activity == ACTIVITY_DAILY_REFLECTION {
            Some(apply_streak_checkin(&tx, profile_id, activity, today)?)
        } else {
            None
        };
        tx.commit()?;

        Ok(ActivityOutcome {
            total_points,
            streak,
        })
    }

    pub fn update_streak(
        &mut self,
        profile_id: ProfileId,
        activity: &str,
        today: NaiveDate,
    ) -> ServiceResult<StreakUpdate> {
        let tx = begin_immediate(self.conn)?;
        let update = apply_streak_checkin(&tx, profile_id, activity, today)?;
        tx.commit()?;
        Ok(update)
    }

    /// Returns only achievements unlocked by this call.
    pub fn check_and_award_achievements(
        &mut self,
        profile_id: ProfileId,
    ) -> ServiceResult<Vec<Achievement>> {
        let tx = begin_immediate(self.conn)?;
        let unlocked = award_challenge_achievements(&tx, profile_id)?;
        tx.commit()?;
        Ok(unlocked)
    }

    pub fn recent_achievements(
        &self,
        profile_id: ProfileId,
        limit: u32,
    ) -> ServiceResult<Vec<Achievement>> {
        let repo = SqliteAchievementRepository::new(&*self.conn);
        Ok(repo.list_achievements(profile_id, Some(limit))?)
    }

    pub fn audit_ledger(&self, profile_id: ProfileId) -> ServiceResult<LedgerAudit> {
        let audit = SqliteLedgerRepository::new(&*self.conn).audit(profile_id)?;
        if !audit.is_consistent() {
            warn!(
                "event=ledger_audit module=progression status=error profile_id={} maintained={} ledger_total={}",
                profile_id, audit.maintained_balance, audit.ledger_total
            );
        }
        Ok(audit)
    }

    pub fn ledger_history(&self, profile_id: ProfileId) -> ServiceResult<LedgerHistory> {
        let repo = SqliteLedgerRepository::new(&*self.conn);
        Ok(LedgerHistory {
            rewards: repo.list_rewards(profile_id)?,
            penalties: repo.list_penalties(profile_id)?,
            audit: self.audit_ledger(profile_id)?,
        })
    }
}

/// Appends a reward inside the caller's transaction; returns the new total.
pub(crate) fn credit_points(
    conn: &Connection,
    profile_id: ProfileId,
    amount: i64,
    description: &str,
) -> ServiceResult<i64> {
    if amount <= 0 {
        return Err(ValidationError::NotPositive {
            field: "points",
            value: amount,
        }
        .into());
    }

    require_points("points", amount, 1)?;

    let ledger = SqliteLedgerRepository::new(conn);
    let balance = ledger.balance(profile_id)?;
    if balance.checked_add(amount).is_none() {
        return Err(ValidationError::OutOfRange {
            field: "points",
            value: amount,
            min: 1,
            max: i64::MAX.saturating_sub(balance),
        }
        .into());
    }
    ledger.append_reward(profile_id, amount, description)?;
    let total = ledger.balance(profile_id)?;
    info!(
        "event=points_credit module=progression status=ok profile_id={} amount={} total={}",
        profile_id, amount, total
    );
    Ok(total)
}

/// Appends a penalty inside the caller's transaction; returns the new total.
pub(crate) fn debit_points(
    conn: &Connection,
    profile_id: ProfileId,
    amount: i64,
    reason: &str,
) -> ServiceResult<i64> {
    let ledger = SqliteLedgerRepository::new(conn);
    ledger.append_penalty(profile_id, amount, reason)?;
    let total = ledger.balance(profile_id)?;
    info!(
        "event=points_debit module=progression status=ok profile_id={} amount={} total={}",
        profile_id, amount, total
    );
    Ok(total)
}

/// Checks in `activity` for `today` and unlocks 7/30-day achievements.
pub(crate) fn apply_streak_checkin(
    conn: &Connection,
    profile_id: ProfileId,
    activity: &str,
    today: NaiveDate,
) -> ServiceResult<StreakUpdate> {
    let streaks = SqliteStreakRepository::new(conn);
    let (streak, outcome) = match streaks.get_streak(profile_id, activity)? {
        Some(mut streak) => {
            let outcome = streak.check_in(today);
            (streak, outcome)
        }
        None => (
            Streak::start(profile_id, activity, today),
            CheckInOutcome::Started,
        ),
    };

    if outcome.is_write() {
        streaks.save_streak(&streak)?;
    }

    let unlocked = match (outcome, streak_milestone(streak.current_count)) {
        (CheckInOutcome::Continued, Some(definition)) => {
            SqliteAchievementRepository::new(conn).award(profile_id, &definition)?
        }
        _ => None,
    };

    info!(
        "event=streak_checkin module=progression status=ok profile_id={} activity={} outcome={:?} current={}",
        profile_id, activity, outcome, streak.current_count
    );
    Ok(StreakUpdate {
        streak,
        outcome,
        unlocked,
    })
}

/// Upserts every challenge achievement whose threshold is met.
pub(crate) fn award_challenge_achievements(
    conn: &Connection,
    profile_id: ProfileId,
) -> ServiceResult<Vec<Achievement>> {
    let completed = SqliteChallengeRepository::new(conn).count_completed(profile_id)?;

    let achievements = SqliteAchievementRepository::new(conn);
    let mut unlocked = Vec::new();
    for definition in challenge_achievements_reached(completed) {
        if let Some(achievement) = achievements.award(profile_id, &definition)? {
            info!(
                "event=achievement_unlock module=progression status=ok profile_id={} title={}",
                profile_id, achievement.title
            );
            unlocked.push(achievement);
        }
    }
    Ok(unlocked)
}

/// Fails with `InsufficientPoints` when the balance is below `required`.
pub(crate) fn ensure_balance(
    conn: &Connection,
    profile_id: ProfileId,
    required: i64,
) -> ServiceResult<i64> {
    let available = SqliteLedgerRepository::new(conn).balance(profile_id)?;
    if available < required {
        return Err(ServiceError::InsufficientPoints {
            available,
            required,
        });
    }
    Ok(available)
}
