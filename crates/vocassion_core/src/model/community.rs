//! Community feed posts, likes, comments and team challenges.
//!
//! # Invariants
//! - A profile likes a post at most once.
//! - Team challenge participation is unique per `(challenge, profile)`.
//! - Participant progress stays within `0..=100`.

use super::profile::ProfileId;
use super::{require_points, require_text, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PostId = Uuid;
pub type TeamChallengeId = Uuid;

/// Community seeded by the schema for posts without an explicit target.
pub const DEFAULT_COMMUNITY_ID: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Achievement,
    Challenge,
    Reflection,
    Map,
}

impl PostKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Achievement => "achievement",
            Self::Challenge => "challenge",
            Self::Reflection => "reflection",
            Self::Map => "map",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "achievement" => Some(Self::Achievement),
            "challenge" => Some(Self::Challenge),
            "reflection" => Some(Self::Reflection),
            "map" => Some(Self::Map),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub id: PostId,
    pub profile_id: ProfileId,
    pub community_id: String,
    pub title: String,
    pub content: String,
    pub kind: PostKind,
    pub created_at: i64,
}

/// Feed row: post plus author and engagement counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: PostId,
    pub profile_id: ProfileId,
    pub user_name: String,
    pub user_image: Option<String>,
    pub title: String,
    pub content: String,
    pub kind: PostKind,
    pub likes: u32,
    pub comments: u32,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostComment {
    pub id: Uuid,
    pub post_id: PostId,
    pub profile_id: ProfileId,
    pub content: String,
    pub created_at: i64,
}

/// Result of toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(default = "default_post_kind")]
    pub kind: PostKind,
    #[serde(default)]
    pub community_id: Option<String>,
}

fn default_post_kind() -> PostKind {
    PostKind::Reflection
}

impl NewPost {
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.content.trim().is_empty() {
            missing.push("content");
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let community_id = self
            .community_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_COMMUNITY_ID)
            .to_string();

        Ok(Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            kind: self.kind,
            community_id: Some(community_id),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamChallengeCategory {
    Skills,
    Mission,
    Vocation,
    Passion,
}

impl TeamChallengeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skills => "skills",
            Self::Mission => "mission",
            Self::Vocation => "vocation",
            Self::Passion => "passion",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "skills" => Some(Self::Skills),
            "mission" => Some(Self::Mission),
            "vocation" => Some(Self::Vocation),
            "passion" => Some(Self::Passion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamChallenge {
    pub id: TeamChallengeId,
    pub creator_id: ProfileId,
    pub title: String,
    pub description: String,
    pub category: TeamChallengeCategory,
    pub reward_points: i64,
    pub end_date: NaiveDate,
    pub created_at: i64,
    pub participant_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Active,
    Completed,
}

impl ParticipantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamChallengeParticipant {
    pub challenge_id: TeamChallengeId,
    pub profile_id: ProfileId,
    pub progress: u8,
    pub status: ParticipantStatus,
    pub joined_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamChallenge {
    pub title: String,
    pub description: String,
    pub category: TeamChallengeCategory,
    pub reward_points: i64,
    pub end_date: NaiveDate,
}

impl NewTeamChallenge {
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let title = require_text("title", &self.title)?;
        let description = require_text("description", &self.description)?;
        require_points("rewardPoints", self.reward_points, 0)?;
        Ok(Self {
            title,
            description,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{NewPost, PostKind, DEFAULT_COMMUNITY_ID};
    use crate::model::ValidationError;

    #[test]
    fn missing_post_fields_are_listed() {
        let post = NewPost {
            title: " ".to_string(),
            content: String::new(),
            kind: PostKind::Map,
            community_id: None,
        };
        assert_eq!(
            post.validated().unwrap_err(),
            ValidationError::MissingFields(vec!["title", "content"])
        );
    }

    #[test]
    fn blank_community_falls_back_to_default() {
        let post = NewPost {
            title: "My map".to_string(),
            content: "Sharing my ikigai".to_string(),
            kind: PostKind::Map,
            community_id: Some("  ".to_string()),
        };
        let validated = post.validated().unwrap();
        assert_eq!(validated.community_id.as_deref(), Some(DEFAULT_COMMUNITY_ID));
    }

    #[test]
    fn post_kind_rejects_unknown_names() {
        assert_eq!(PostKind::parse("map"), Some(PostKind::Map));
        assert_eq!(PostKind::parse("meme"), None);
    }
}
