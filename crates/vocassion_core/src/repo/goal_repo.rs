//! Goal tree repository: goals, ordered sub-goals, milestones and feedback.
//!
//! # Invariants
//! - Goal reads are scoped to the owning profile; foreign ids read as missing.
//! - Sub-goal `sort_order` is assigned as `max + 1` within its goal.
//! - Milestone completion is a one-way flip guarded by `is_completed = 0`.

use super::{
    format_date, not_found_on_foreign_key, parse_bool, parse_date, parse_percent,
    parse_uuid, RepoError, RepoResult,
};
use crate::model::goal::{
    Difficulty, Goal, GoalFeedback, GoalId, GoalStatus, Milestone, MilestoneId, NewGoal,
    NewGoalStep, SubGoal, SubGoalId,
};
use crate::model::ikigai::IkigaiSection;
use crate::model::profile::ProfileId;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const GOAL_SELECT_SQL: &str = "SELECT
    id,
    profile_id,
    title,
    description,
    category,
    difficulty,
    status,
    points_cost,
    points_reward,
    progress,
    deadline,
    created_at,
    updated_at
FROM goals";

const SUB_GOAL_SELECT_SQL: &str = "SELECT
    id,
    goal_id,
    title,
    description,
    sort_order,
    points_reward,
    is_completed
FROM sub_goals";

const MILESTONE_SELECT_SQL: &str = "SELECT
    id,
    sub_goal_id,
    title,
    description,
    points_reward,
    is_completed,
    completed_at
FROM milestones";

/// Completed and total milestone counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneCounts {
    pub completed: usize,
    pub total: usize,
}

pub trait GoalRepository {
    fn create_goal(&self, profile_id: ProfileId, goal: &NewGoal) -> RepoResult<Goal>;
    /// Fails with `NotFound` when the goal is missing or owned by someone else.
    fn get_goal(&self, profile_id: ProfileId, goal_id: GoalId) -> RepoResult<Goal>;
    /// Newest first.
    fn list_goals(&self, profile_id: ProfileId) -> RepoResult<Vec<Goal>>;
    fn update_goal_state(&self, goal_id: GoalId, status: GoalStatus, progress: u8)
        -> RepoResult<()>;

    fn add_sub_goal(&self, goal_id: GoalId, step: &NewGoalStep) -> RepoResult<SubGoal>;
    fn get_sub_goal(&self, goal_id: GoalId, sub_goal_id: SubGoalId) -> RepoResult<SubGoal>;
    /// Ordered by `sort_order`.
    fn list_sub_goals(&self, goal_id: GoalId) -> RepoResult<Vec<SubGoal>>;
    /// Returns `false` when the sub-goal was already completed.
    fn mark_sub_goal_completed(&self, sub_goal_id: SubGoalId) -> RepoResult<bool>;

    fn add_milestone(&self, sub_goal_id: SubGoalId, step: &NewGoalStep) -> RepoResult<Milestone>;
    fn get_milestone(
        &self,
        sub_goal_id: SubGoalId,
        milestone_id: MilestoneId,
    ) -> RepoResult<Milestone>;
    fn list_milestones(&self, sub_goal_id: SubGoalId) -> RepoResult<Vec<Milestone>>;
    /// Returns `false` when the milestone was already completed.
    fn mark_milestone_completed(&self, milestone_id: MilestoneId) -> RepoResult<bool>;
    fn sub_goal_milestone_counts(&self, sub_goal_id: SubGoalId) -> RepoResult<MilestoneCounts>;
    fn goal_milestone_counts(&self, goal_id: GoalId) -> RepoResult<MilestoneCounts>;

    fn add_feedback(
        &self,
        goal_id: GoalId,
        profile_id: ProfileId,
        content: &str,
        kind: &str,
    ) -> RepoResult<GoalFeedback>;
    /// Newest first, at most `limit` rows.
    fn recent_feedback(&self, goal_id: GoalId, limit: u32) -> RepoResult<Vec<GoalFeedback>>;
}

pub struct SqliteGoalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGoalRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_goal(&self, goal_id: GoalId) -> RepoResult<Option<Goal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GOAL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([goal_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_goal_row(row)?));
        }
        Ok(None)
    }

    fn milestone_counts(&self, sql: &str, id: Uuid) -> RepoResult<MilestoneCounts> {
        let (completed, total): (i64, i64) =
            self.conn
                .query_row(sql, [id.to_string()], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(MilestoneCounts {
            completed: to_usize(completed)?,
            total: to_usize(total)?,
        })
    }
}

impl GoalRepository for SqliteGoalRepository<'_> {
    fn create_goal(&self, profile_id: ProfileId, goal: &NewGoal) -> RepoResult<Goal> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO goals (
                    id, profile_id, title, description, category, difficulty, status,
                    points_cost, points_reward, deadline
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    id.to_string(),
                    profile_id.to_string(),
                    goal.title.as_str(),
                    goal.description.as_str(),
                    goal.category.as_str(),
                    goal.difficulty.as_str(),
                    goal.initial_status().as_str(),
                    goal.points_cost,
                    goal.points_reward,
                    goal.deadline.map(format_date),
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "profile", profile_id))?;

        self.load_goal(id)?
            .ok_or_else(|| RepoError::InvalidData("goal missing in read-back".to_string()))
    }

    fn get_goal(&self, profile_id: ProfileId, goal_id: GoalId) -> RepoResult<Goal> {
        match self.load_goal(goal_id)? {
            Some(goal) if goal.profile_id == profile_id => Ok(goal),
            _ => Err(RepoError::not_found("goal", goal_id)),
        }
    }

    fn list_goals(&self, profile_id: ProfileId) -> RepoResult<Vec<Goal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GOAL_SELECT_SQL} WHERE profile_id = ?1 ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([profile_id.to_string()])?;
        let mut goals = Vec::new();
        while let Some(row) = rows.next()? {
            goals.push(parse_goal_row(row)?);
        }
        Ok(goals)
    }

    fn update_goal_state(
        &self,
        goal_id: GoalId,
        status: GoalStatus,
        progress: u8,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE goals
             SET status = ?2,
                 progress = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![goal_id.to_string(), status.as_str(), i64::from(progress)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("goal", goal_id));
        }
        Ok(())
    }

    fn add_sub_goal(&self, goal_id: GoalId, step: &NewGoalStep) -> RepoResult<SubGoal> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO sub_goals (id, goal_id, title, description, sort_order, points_reward)
                 VALUES (
                    ?1, ?2, ?3, ?4,
                    (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM sub_goals WHERE goal_id = ?2),
                    ?5
                 );",
                params![
                    id.to_string(),
                    goal_id.to_string(),
                    step.title.as_str(),
                    step.description.as_str(),
                    step.points_reward,
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "goal", goal_id))?;

        self.get_sub_goal(goal_id, id)
    }

    fn get_sub_goal(&self, goal_id: GoalId, sub_goal_id: SubGoalId) -> RepoResult<SubGoal> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUB_GOAL_SELECT_SQL} WHERE id = ?1 AND goal_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![sub_goal_id.to_string(), goal_id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_sub_goal_row(row),
            None => Err(RepoError::not_found("sub_goal", sub_goal_id)),
        }
    }

    fn list_sub_goals(&self, goal_id: GoalId) -> RepoResult<Vec<SubGoal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUB_GOAL_SELECT_SQL} WHERE goal_id = ?1 ORDER BY sort_order ASC;"
        ))?;
        let mut rows = stmt.query([goal_id.to_string()])?;
        let mut sub_goals = Vec::new();
        while let Some(row) = rows.next()? {
            sub_goals.push(parse_sub_goal_row(row)?);
        }
        Ok(sub_goals)
    }

    fn mark_sub_goal_completed(&self, sub_goal_id: SubGoalId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE sub_goals SET is_completed = 1 WHERE id = ?1 AND is_completed = 0;",
            [sub_goal_id.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn add_milestone(&self, sub_goal_id: SubGoalId, step: &NewGoalStep) -> RepoResult<Milestone> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO milestones (id, sub_goal_id, title, description, points_reward)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    id.to_string(),
                    sub_goal_id.to_string(),
                    step.title.as_str(),
                    step.description.as_str(),
                    step.points_reward,
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "sub_goal", sub_goal_id))?;

        self.get_milestone(sub_goal_id, id)
    }

    fn get_milestone(
        &self,
        sub_goal_id: SubGoalId,
        milestone_id: MilestoneId,
    ) -> RepoResult<Milestone> {
        let mut stmt = self.conn.prepare(&format!(
            "{MILESTONE_SELECT_SQL} WHERE id = ?1 AND sub_goal_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![milestone_id.to_string(), sub_goal_id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_milestone_row(row),
            None => Err(RepoError::not_found("milestone", milestone_id)),
        }
    }

    fn list_milestones(&self, sub_goal_id: SubGoalId) -> RepoResult<Vec<Milestone>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MILESTONE_SELECT_SQL} WHERE sub_goal_id = ?1 ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([sub_goal_id.to_string()])?;
        let mut milestones = Vec::new();
        while let Some(row) = rows.next()? {
            milestones.push(parse_milestone_row(row)?);
        }
        Ok(milestones)
    }

    fn mark_milestone_completed(&self, milestone_id: MilestoneId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE milestones
             SET is_completed = 1,
                 completed_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1 AND is_completed = 0;",
            [milestone_id.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn sub_goal_milestone_counts(&self, sub_goal_id: SubGoalId) -> RepoResult<MilestoneCounts> {
        self.milestone_counts(
            "SELECT COALESCE(SUM(is_completed), 0), COUNT(*)
             FROM milestones
             WHERE sub_goal_id = ?1;",
            sub_goal_id,
        )
    }

    fn goal_milestone_counts(&self, goal_id: GoalId) -> RepoResult<MilestoneCounts> {
        self.milestone_counts(
            "SELECT COALESCE(SUM(m.is_completed), 0), COUNT(m.id)
             FROM milestones m
             JOIN sub_goals s ON s.id = m.sub_goal_id
             WHERE s.goal_id = ?1;",
            goal_id,
        )
    }

    fn add_feedback(
        &self,
        goal_id: GoalId,
        profile_id: ProfileId,
        content: &str,
        kind: &str,
    ) -> RepoResult<GoalFeedback> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO goal_feedback (id, goal_id, profile_id, content, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    id.to_string(),
                    goal_id.to_string(),
                    profile_id.to_string(),
                    content,
                    kind
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "goal", goal_id))?;

        let mut stmt = self.conn.prepare(
            "SELECT id, goal_id, content, kind, created_at FROM goal_feedback WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_feedback_row(row),
            None => Err(RepoError::InvalidData(
                "goal feedback missing in read-back".to_string(),
            )),
        }
    }

    fn recent_feedback(&self, goal_id: GoalId, limit: u32) -> RepoResult<Vec<GoalFeedback>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, goal_id, content, kind, created_at
             FROM goal_feedback
             WHERE goal_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![goal_id.to_string(), i64::from(limit)])?;
        let mut feedback = Vec::new();
        while let Some(row) = rows.next()? {
            feedback.push(parse_feedback_row(row)?);
        }
        Ok(feedback)
    }
}

fn parse_goal_row(row: &Row<'_>) -> RepoResult<Goal> {
    let id_text: String = row.get("id")?;
    let profile_text: String = row.get("profile_id")?;
    let category_text: String = row.get("category")?;
    let difficulty_text: String = row.get("difficulty")?;
    let status_text: String = row.get("status")?;
    let deadline_text: Option<String> = row.get("deadline")?;

    let category = IkigaiSection::parse(&category_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid category `{category_text}` in goals.category"))
    })?;
    let difficulty = Difficulty::parse(&difficulty_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid difficulty `{difficulty_text}` in goals.difficulty"
        ))
    })?;
    let status = GoalStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in goals.status"))
    })?;
    let deadline = deadline_text
        .as_deref()
        .map(|value| parse_date(value, "goals.deadline"))
        .transpose()?;

    Ok(Goal {
        id: parse_uuid(&id_text, "goals.id")?,
        profile_id: parse_uuid(&profile_text, "goals.profile_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        category,
        difficulty,
        status,
        points_cost: row.get("points_cost")?,
        points_reward: row.get("points_reward")?,
        progress: parse_percent(row.get("progress")?, "goals.progress")?,
        deadline,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_sub_goal_row(row: &Row<'_>) -> RepoResult<SubGoal> {
    let id_text: String = row.get("id")?;
    let goal_text: String = row.get("goal_id")?;
    Ok(SubGoal {
        id: parse_uuid(&id_text, "sub_goals.id")?,
        goal_id: parse_uuid(&goal_text, "sub_goals.goal_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        sort_order: row.get("sort_order")?,
        points_reward: row.get("points_reward")?,
        is_completed: parse_bool(row.get("is_completed")?, "sub_goals.is_completed")?,
    })
}

fn parse_milestone_row(row: &Row<'_>) -> RepoResult<Milestone> {
    let id_text: String = row.get("id")?;
    let sub_goal_text: String = row.get("sub_goal_id")?;
    Ok(Milestone {
        id: parse_uuid(&id_text, "milestones.id")?,
        sub_goal_id: parse_uuid(&sub_goal_text, "milestones.sub_goal_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        points_reward: row.get("points_reward")?,
        is_completed: parse_bool(row.get("is_completed")?, "milestones.is_completed")?,
        completed_at: row.get("completed_at")?,
    })
}

fn parse_feedback_row(row: &Row<'_>) -> RepoResult<GoalFeedback> {
    let id_text: String = row.get("id")?;
    let goal_text: String = row.get("goal_id")?;
    Ok(GoalFeedback {
        id: parse_uuid(&id_text, "goal_feedback.id")?,
        goal_id: parse_uuid(&goal_text, "goal_feedback.goal_id")?,
        content: row.get("content")?,
        kind: row.get("kind")?,
        created_at: row.get("created_at")?,
    })
}

fn to_usize(value: i64) -> RepoResult<usize> {
    usize::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid milestone count `{value}`")))
}
