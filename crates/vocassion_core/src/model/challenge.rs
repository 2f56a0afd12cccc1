//! Challenges: daily templated tasks plus custom weekly/special ones.
//!
//! # Invariants
//! - Status only moves `Pending -> Completed`.
//! - A profile holds at most one copy of each daily template per date.

use super::ikigai::{IkigaiEntries, IkigaiSection};
use super::profile::ProfileId;
use super::{require_points, require_positive, require_text, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ChallengeId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    Daily,
    Weekly,
    Special,
}

impl ChallengeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Special => "special",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "special" => Some(Self::Special),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Pending,
    Completed,
}

impl ChallengeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: ChallengeId,
    pub profile_id: ProfileId,
    pub title: String,
    pub description: String,
    pub kind: ChallengeKind,
    pub category: IkigaiSection,
    pub points: i64,
    pub status: ChallengeStatus,
    pub challenge_date: NaiveDate,
    pub completed_at: Option<i64>,
    pub created_at: i64,
}

impl Challenge {
    pub fn is_completed(&self) -> bool {
        self.status == ChallengeStatus::Completed
    }
}

/// Compact daily task view: `{id, title, completed}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTask {
    pub id: ChallengeId,
    pub title: String,
    pub completed: bool,
}

impl From<&Challenge> for DailyTask {
    fn from(challenge: &Challenge) -> Self {
        Self {
            id: challenge.id,
            title: challenge.title.clone(),
            completed: challenge.is_completed(),
        }
    }
}

/// Template for one of the generated daily challenges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub category: IkigaiSection,
    pub points: i64,
}

pub const DAILY_TEMPLATES: [ChallengeTemplate; 4] = [
    ChallengeTemplate {
        title: "Research Your Passion",
        description: "Spend 10 minutes researching careers related to your passion",
        category: IkigaiSection::Passion,
        points: 50,
    },
    ChallengeTemplate {
        title: "Network for Growth",
        description: "Talk to one person about what drives you",
        category: IkigaiSection::Profession,
        points: 30,
    },
    ChallengeTemplate {
        title: "Mission Reflection",
        description: "Write down three ways you can help others with your skills",
        category: IkigaiSection::Mission,
        points: 40,
    },
    ChallengeTemplate {
        title: "Skill Development",
        description: "Learn something new related to your vocation",
        category: IkigaiSection::Vocation,
        points: 60,
    },
];

impl ChallengeTemplate {
    /// Description tailored to the first matching Ikigai entry, if any.
    pub fn personalized_description(&self, ikigai: Option<&IkigaiEntries>) -> String {
        let Some(entries) = ikigai else {
            return self.description.to_string();
        };

        let personalized = match self.category {
            IkigaiSection::Passion => entries
                .passion
                .first()
                .map(|passion| format!("Research careers related to {passion}")),
            IkigaiSection::Profession => entries
                .profession
                .first()
                .map(|profession| format!("Connect with someone in the {profession} field")),
            IkigaiSection::Mission | IkigaiSection::Vocation => None,
        };
        personalized.unwrap_or_else(|| self.description.to_string())
    }
}

/// Create request for a custom (non-templated) challenge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub kind: ChallengeKind,
    pub category: IkigaiSection,
    pub points: i64,
}

impl NewChallenge {
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let title = require_text("title", &self.title)?;
        let description = require_text("description", &self.description)?;
        require_positive("points", self.points)?;
        require_points("points", self.points, 1)?;
        Ok(Self {
            title,
            description,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ChallengeKind, DAILY_TEMPLATES};
    use crate::model::ikigai::IkigaiEntries;

    #[test]
    fn templates_fall_back_without_ikigai() {
        let template = DAILY_TEMPLATES[0];
        assert_eq!(
            template.personalized_description(None),
            template.description
        );
    }

    #[test]
    fn passion_and_profession_use_first_entry() {
        let entries = IkigaiEntries {
            passion: vec!["astronomy".to_string(), "music".to_string()],
            profession: vec!["data science".to_string()],
            ..IkigaiEntries::default()
        };
        assert_eq!(
            DAILY_TEMPLATES[0].personalized_description(Some(&entries)),
            "Research careers related to astronomy"
        );
        assert_eq!(
            DAILY_TEMPLATES[1].personalized_description(Some(&entries)),
            "Connect with someone in the data science field"
        );
        assert_eq!(
            DAILY_TEMPLATES[2].personalized_description(Some(&entries)),
            DAILY_TEMPLATES[2].description
        );
    }

    #[test]
    fn empty_section_falls_back() {
        let entries = IkigaiEntries::default();
        assert_eq!(
            DAILY_TEMPLATES[1].personalized_description(Some(&entries)),
            DAILY_TEMPLATES[1].description
        );
    }

    #[test]
    fn kind_parse_roundtrips_names() {
        for kind in [ChallengeKind::Daily, ChallengeKind::Weekly, ChallengeKind::Special] {
            assert_eq!(ChallengeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ChallengeKind::parse("monthly"), None);
    }
}
