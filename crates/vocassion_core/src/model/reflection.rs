//! Daily reflections: one journal entry per profile per calendar day.

use super::profile::ProfileId;
use super::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReflection {
    pub id: Uuid,
    pub profile_id: ProfileId,
    pub reflection_date: NaiveDate,
    pub mood: String,
    pub gratitude: String,
    pub challenges: String,
    pub wins: String,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct NewReflection {
    pub mood: String,
    pub gratitude: String,
    pub challenges: String,
    pub wins: String,
    pub content: String,
}

impl NewReflection {
    /// Requires all five fields; reports every missing one at once.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let fields = [
            ("mood", &self.mood),
            ("gratitude", &self.gratitude),
            ("challenges", &self.challenges),
            ("wins", &self.wins),
            ("content", &self.content),
        ];
        let missing = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        Ok(Self {
            mood: self.mood.trim().to_string(),
            gratitude: self.gratitude.trim().to_string(),
            challenges: self.challenges.trim().to_string(),
            wins: self.wins.trim().to_string(),
            content: self.content.trim().to_string(),
        })
    }
}
