//! Goal use cases: creation, the unlock economy and progress roll-up.
//!
//! # Responsibility
//! - Spend points to unlock goals.
//! - Roll milestone completion up into sub-goal and goal completion.
//!
//! # Invariants
//! - Unlocking debits exactly `points_cost` and flips `locked -> active` in
//!   the same transaction.
//! - Goal progress never decreases; reaching 100 completes the goal and
//!   credits `points_reward` exactly once.

use super::progression_service::{credit_points, debit_points, ensure_balance};
use super::{begin_immediate, ServiceError, ServiceResult};
use crate::model::goal::{
    clamp_progress, completion_percent, Goal, GoalDetail, GoalId, GoalStatus, Milestone,
    MilestoneId, NewGoal, NewGoalStep, SubGoal, SubGoalDetail, SubGoalId, GOAL_FEEDBACK_LIMIT,
};
use crate::model::profile::ProfileId;
use crate::repo::goal_repo::{GoalRepository, SqliteGoalRepository};
use crate::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use log::info;
use rusqlite::Connection;
use serde::Serialize;

const FEEDBACK_KIND_UNLOCK: &str = "unlock";
const FEEDBACK_KIND_COMPLETION: &str = "completion";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockOutcome {
    pub goal: Goal,
    pub points_spent: i64,
    pub total_points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneOutcome {
    pub milestone: Milestone,
    pub sub_goal_completed: bool,
    pub goal: Goal,
    pub points_awarded: i64,
    pub total_points: i64,
}

pub struct GoalService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> GoalService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates a goal; a positive cost makes it start locked.
    pub fn create_goal(&mut self, profile_id: ProfileId, request: &NewGoal) -> ServiceResult<Goal> {
        let request = request.validated()?;
        let tx = begin_immediate(self.conn)?;
        let goal = SqliteGoalRepository::new(&tx).create_goal(profile_id, &request)?;
        tx.commit()?;

        info!(
            "event=goal_create module=goal status=ok profile_id={} goal_id={} goal_status={}",
            profile_id,
            goal.id,
            goal.status.as_str()
        );
        Ok(goal)
    }

    pub fn list_goals(&self, profile_id: ProfileId) -> ServiceResult<Vec<Goal>> {
        Ok(SqliteGoalRepository::new(&*self.conn).list_goals(profile_id)?)
    }

    /// Goal with ordered sub-goals, their milestones and recent feedback.
    pub fn goal_detail(&self, profile_id: ProfileId, goal_id: GoalId) -> ServiceResult<GoalDetail> {
        let repo = SqliteGoalRepository::new(&*self.conn);
        let goal = repo.get_goal(profile_id, goal_id)?;

        let mut sub_goals = Vec::new();
        for sub_goal in repo.list_sub_goals(goal_id)? {
            let milestones = repo.list_milestones(sub_goal.id)?;
            let completed = milestones.iter().filter(|m| m.is_completed).count();
            sub_goals.push(SubGoalDetail {
                progress: completion_percent(completed, milestones.len()),
                sub_goal,
                milestones,
            });
        }
        let feedback = repo.recent_feedback(goal_id, GOAL_FEEDBACK_LIMIT)?;

        Ok(GoalDetail {
            goal,
            sub_goals,
            feedback,
        })
    }

    /// Spends `points_cost` to activate a locked goal.
    ///
    /// # Errors
    /// - `NotFound` for unknown or foreign goals.
    /// - `Conflict` when the goal is not locked.
    /// - `InsufficientPoints` when the balance is below the cost.
    pub fn unlock_goal(
        &mut self,
        profile_id: ProfileId,
        goal_id: GoalId,
    ) -> ServiceResult<UnlockOutcome> {
        let tx = begin_immediate(self.conn)?;
        let repo = SqliteGoalRepository::new(&tx);
        let goal = repo.get_goal(profile_id, goal_id)?;
        if goal.status != GoalStatus::Locked {
            return Err(ServiceError::conflict("Goal is not locked"));
        }

        let cost = goal.points_cost;
        let mut total_points = ensure_balance(&tx, profile_id, cost)?;
        if cost > 0 {
            let reason = format!("Unlocked goal: {}", goal.title);
            total_points = debit_points(&tx, profile_id, cost, &reason)?;
        }
        repo.update_goal_state(goal_id, GoalStatus::Active, goal.progress)?;
        repo.add_feedback(
            goal_id,
            profile_id,
            "Goal unlocked! Break it into sub-goals and take the first step.",
            FEEDBACK_KIND_UNLOCK,
        )?;
        let goal = repo.get_goal(profile_id, goal_id)?;
        tx.commit()?;

        info!(
            "event=goal_unlock module=goal status=ok profile_id={} goal_id={} cost={} total={}",
            profile_id, goal_id, cost, total_points
        );
        Ok(UnlockOutcome {
            goal,
            points_spent: cost,
            total_points,
        })
    }

    pub fn add_sub_goal(
        &mut self,
        profile_id: ProfileId,
        goal_id: GoalId,
        request: &NewGoalStep,
    ) -> ServiceResult<SubGoal> {
        let request = request.validated()?;
        let tx = begin_immediate(self.conn)?;
        let repo = SqliteGoalRepository::new(&tx);
        let goal = repo.get_goal(profile_id, goal_id)?;
        if goal.status == GoalStatus::Completed {
            return Err(ServiceError::conflict("Goal already completed"));
        }
        let sub_goal = repo.add_sub_goal(goal_id, &request)?;
        tx.commit()?;
        Ok(sub_goal)
    }

    pub fn add_milestone(
        &mut self,
        profile_id: ProfileId,
        goal_id: GoalId,
        sub_goal_id: SubGoalId,
        request: &NewGoalStep,
    ) -> ServiceResult<Milestone> {
        let request = request.validated()?;
        let tx = begin_immediate(self.conn)?;
        let repo = SqliteGoalRepository::new(&tx);
        let goal = repo.get_goal(profile_id, goal_id)?;
        if goal.status == GoalStatus::Completed {
            return Err(ServiceError::conflict("Goal already completed"));
        }
        let sub_goal = repo.get_sub_goal(goal_id, sub_goal_id)?;
        if sub_goal.is_completed {
            return Err(ServiceError::conflict("Sub-goal already completed"));
        }
        let milestone = repo.add_milestone(sub_goal_id, &request)?;
        tx.commit()?;
        Ok(milestone)
    }

    /// Completes a milestone and rolls progress up the goal tree.
    ///
    /// # Errors
    /// - `NotFound` when any id in the path is unknown or foreign.
    /// - `Conflict` when the goal is not active or the milestone is done.
    pub fn complete_milestone(
        &mut self,
        profile_id: ProfileId,
        goal_id: GoalId,
        sub_goal_id: SubGoalId,
        milestone_id: MilestoneId,
    ) -> ServiceResult<MilestoneOutcome> {
        let tx = begin_immediate(self.conn)?;
        let repo = SqliteGoalRepository::new(&tx);
        let goal = repo.get_goal(profile_id, goal_id)?;
        if goal.status != GoalStatus::Active {
            return Err(ServiceError::conflict("Goal is not active"));
        }
        let sub_goal = repo.get_sub_goal(goal_id, sub_goal_id)?;
        let milestone = repo.get_milestone(sub_goal_id, milestone_id)?;
        if !repo.mark_milestone_completed(milestone_id)? {
            return Err(ServiceError::conflict("Milestone already completed"));
        }

        let mut points_awarded = 0;
        if milestone.points_reward > 0 {
            let description = format!("Completed milestone: {}", milestone.title);
            credit_points(&tx, profile_id, milestone.points_reward, &description)?;
            points_awarded += milestone.points_reward;
        }

        let sub_counts = repo.sub_goal_milestone_counts(sub_goal_id)?;
        let sub_goal_completed = sub_counts.completed == sub_counts.total
            && repo.mark_sub_goal_completed(sub_goal_id)?;
        if sub_goal_completed && sub_goal.points_reward > 0 {
            let description = format!("Completed sub-goal: {}", sub_goal.title);
            credit_points(&tx, profile_id, sub_goal.points_reward, &description)?;
            points_awarded += sub_goal.points_reward;
        }

        let goal_counts = repo.goal_milestone_counts(goal_id)?;
        let progress = goal
            .progress
            .max(completion_percent(goal_counts.completed, goal_counts.total));
        points_awarded += advance_goal(&tx, &goal, progress)?;

        let goal = repo.get_goal(profile_id, goal_id)?;
        let milestone = repo.get_milestone(sub_goal_id, milestone_id)?;
        let total_points = SqliteLedgerRepository::new(&tx).balance(profile_id)?;
        tx.commit()?;

        Ok(MilestoneOutcome {
            milestone,
            sub_goal_completed,
            goal,
            points_awarded,
            total_points,
        })
    }

    /// Sets goal progress directly; values are clamped and never lower the
    /// current progress.
    pub fn set_goal_progress(
        &mut self,
        profile_id: ProfileId,
        goal_id: GoalId,
        progress: i64,
    ) -> ServiceResult<Goal> {
        let tx = begin_immediate(self.conn)?;
        let repo = SqliteGoalRepository::new(&tx);
        let goal = repo.get_goal(profile_id, goal_id)?;
        if goal.status != GoalStatus::Active {
            return Err(ServiceError::conflict(format!(
                "Goal is {}",
                goal.status.as_str()
            )));
        }

        let progress = goal.progress.max(clamp_progress(progress));
        advance_goal(&tx, &goal, progress)?;
        let goal = repo.get_goal(profile_id, goal_id)?;
        tx.commit()?;
        Ok(goal)
    }
}

/// Stores new progress for an active goal; at 100 the goal completes, its
/// reward is credited and a feedback row is written. Returns points credited.
fn advance_goal(conn: &Connection, goal: &Goal, progress: u8) -> ServiceResult<i64> {
    let repo = SqliteGoalRepository::new(conn);
    if progress < 100 {
        repo.update_goal_state(goal.id, GoalStatus::Active, progress)?;
        return Ok(0);
    }

    repo.update_goal_state(goal.id, GoalStatus::Completed, 100)?;
    repo.add_feedback(
        goal.id,
        goal.profile_id,
        &format!("Congratulations on completing \"{}\"!", goal.title),
        FEEDBACK_KIND_COMPLETION,
    )?;
    let mut credited = 0;
    if goal.points_reward > 0 {
        let description = format!("Completed goal: {}", goal.title);
        credit_points(conn, goal.profile_id, goal.points_reward, &description)?;
        credited = goal.points_reward;
    }

    info!(
        "event=goal_complete module=goal status=ok profile_id={} goal_id={} reward={}",
        goal.profile_id, goal.id, credited
    );
    Ok(credited)
}
