//! Goal tree: goals own ordered sub-goals, sub-goals own milestones.
//!
//! # Invariants
//! - A goal with a positive `points_cost` starts `Locked`; otherwise `Active`.
//! - Only `Active` goals make progress; `Completed` is terminal.
//! - `progress` stays within `0..=100` and never decreases.

use super::ikigai::IkigaiSection;
use super::profile::ProfileId;
use super::{require_points, require_text, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type GoalId = Uuid;
pub type SubGoalId = Uuid;
pub type MilestoneId = Uuid;

const TITLE_MIN_CHARS: usize = 3;
const DESCRIPTION_MIN_CHARS: usize = 10;
/// Feedback rows shown on a goal detail view.
pub const GOAL_FEEDBACK_LIMIT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Waiting to be bought with points.
    Locked,
    /// Unlocked and accepting progress.
    Active,
    /// Finished; reward already credited.
    Completed,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "locked" => Some(Self::Locked),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    pub profile_id: ProfileId,
    pub title: String,
    pub description: String,
    pub category: IkigaiSection,
    pub difficulty: Difficulty,
    pub status: GoalStatus,
    pub points_cost: i64,
    pub points_reward: i64,
    pub progress: u8,
    pub deadline: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubGoal {
    pub id: SubGoalId,
    pub goal_id: GoalId,
    pub title: String,
    pub description: String,
    pub sort_order: i64,
    pub points_reward: i64,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: MilestoneId,
    pub sub_goal_id: SubGoalId,
    pub title: String,
    pub description: String,
    pub points_reward: i64,
    pub is_completed: bool,
    pub completed_at: Option<i64>,
}

/// Short message attached to a goal at unlock and completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalFeedback {
    pub id: Uuid,
    pub goal_id: GoalId,
    pub content: String,
    pub kind: String,
    pub created_at: i64,
}

/// Sub-goal with its milestones, as shown on the goal detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubGoalDetail {
    #[serde(flatten)]
    pub sub_goal: SubGoal,
    pub progress: u8,
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDetail {
    #[serde(flatten)]
    pub goal: Goal,
    pub sub_goals: Vec<SubGoalDetail>,
    pub feedback: Vec<GoalFeedback>,
}

/// Create request for a goal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub category: IkigaiSection,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub points_cost: i64,
    #[serde(default)]
    pub points_reward: i64,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

impl NewGoal {
    /// Validates text lengths and point amounts; returns trimmed copy.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let title = require_text("title", &self.title)?;
        if title.chars().count() < TITLE_MIN_CHARS {
            return Err(ValidationError::TooShort {
                field: "title",
                min_chars: TITLE_MIN_CHARS,
            });
        }
        let description = require_text("description", &self.description)?;
        if description.chars().count() < DESCRIPTION_MIN_CHARS {
            return Err(ValidationError::TooShort {
                field: "description",
                min_chars: DESCRIPTION_MIN_CHARS,
            });
        }
        require_points("pointsCost", self.points_cost, 0)?;
        require_points("pointsReward", self.points_reward, 0)?;

        Ok(Self {
            title,
            description,
            ..self.clone()
        })
    }

    /// Initial status derived from the unlock cost.
    pub fn initial_status(&self) -> GoalStatus {
        if self.points_cost > 0 {
            GoalStatus::Locked
        } else {
            GoalStatus::Active
        }
    }
}

/// Create request shared by sub-goals and milestones.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoalStep {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub points_reward: i64,
}

impl NewGoalStep {
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let title = require_text("title", &self.title)?;
        require_points("pointsReward", self.points_reward, 0)?;
        Ok(Self {
            title,
            description: self.description.trim().to_string(),
            points_reward: self.points_reward,
        })
    }
}

/// Percentage of completed items, floored; 0 when there are no items.
pub fn completion_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = completed.min(total) * 100 / total;
    percent as u8
}

/// Clamps a requested progress value into `0..=100`.
pub fn clamp_progress(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}
