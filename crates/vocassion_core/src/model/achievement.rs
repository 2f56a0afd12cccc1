//! Achievements and the fixed catalog of unlock thresholds.
//!
//! # Invariants
//! - An achievement is unique per `(profile, title)` and never changes once
//!   unlocked.
//! - Threshold checks are pure; awarding is an idempotent upsert.

use super::profile::ProfileId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: Uuid,
    pub profile_id: ProfileId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub points: i64,
    pub unlocked_at: i64,
}

/// Static description of an unlockable achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementDefinition {
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub points: i64,
}

/// Completed-challenge count needed for an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeThreshold {
    pub threshold: u32,
    pub definition: AchievementDefinition,
}

pub const CATEGORY_CHALLENGES: &str = "challenges";
pub const CATEGORY_DEVELOPMENT: &str = "development";
pub const CATEGORY_MILESTONE: &str = "milestone";

pub const CHALLENGE_THRESHOLDS: [ChallengeThreshold; 3] = [
    ChallengeThreshold {
        threshold: 1,
        definition: AchievementDefinition {
            title: "Challenge Beginner",
            description: "Complete your first challenge",
            category: CATEGORY_CHALLENGES,
            points: 10,
        },
    },
    ChallengeThreshold {
        threshold: 5,
        definition: AchievementDefinition {
            title: "Challenge Explorer",
            description: "Complete 5 challenges",
            category: CATEGORY_CHALLENGES,
            points: 50,
        },
    },
    ChallengeThreshold {
        threshold: 20,
        definition: AchievementDefinition {
            title: "Challenge Master",
            description: "Complete 20 challenges",
            category: CATEGORY_CHALLENGES,
            points: 200,
        },
    },
];

pub const WEEK_WARRIOR: AchievementDefinition = AchievementDefinition {
    title: "Week Warrior",
    description: "Maintained a 7-day streak",
    category: CATEGORY_DEVELOPMENT,
    points: 50,
};

pub const MONTHLY_MASTER: AchievementDefinition = AchievementDefinition {
    title: "Monthly Master",
    description: "Maintained a 30-day streak",
    category: CATEGORY_DEVELOPMENT,
    points: 200,
};

pub const IKIGAI_PIONEER: AchievementDefinition = AchievementDefinition {
    title: "Ikigai Pioneer",
    description: "Completed your first Ikigai assessment",
    category: CATEGORY_MILESTONE,
    points: 100,
};

pub const IKIGAI_MASTER: AchievementDefinition = AchievementDefinition {
    title: "Ikigai Master",
    description: "Completed all sections of your Ikigai map",
    category: CATEGORY_DEVELOPMENT,
    points: 100,
};

/// Challenge achievements whose threshold is met by `completed` challenges.
pub fn challenge_achievements_reached(
    completed: u32,
) -> impl Iterator<Item = AchievementDefinition> {
    CHALLENGE_THRESHOLDS
        .into_iter()
        .filter(move |entry| completed >= entry.threshold)
        .map(|entry| entry.definition)
}

/// Streak achievement unlocked when a streak reaches exactly `current_count`.
pub fn streak_milestone(current_count: u32) -> Option<AchievementDefinition> {
    match current_count {
        7 => Some(WEEK_WARRIOR),
        30 => Some(MONTHLY_MASTER),
        _ => None,
    }
}

/// Short display glyph for a category, used by recent-achievement feeds.
pub fn category_emoji(category: &str) -> &'static str {
    match category {
        CATEGORY_CHALLENGES => "🎯",
        CATEGORY_DEVELOPMENT => "🌱",
        CATEGORY_MILESTONE => "🏆",
        _ => "⭐",
    }
}
