//! Ikigai map: passion, mission, profession and vocation entries.
//!
//! # Invariants
//! - Entries are trimmed and blank entries are dropped before persistence.
//! - A map is complete when all four sections hold at least one entry.

use super::profile::ProfileId;
use super::ValidationError;
use serde::{Deserialize, Serialize};

/// One of the four Ikigai circles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IkigaiSection {
    /// What you love.
    Passion,
    /// What the world needs.
    Mission,
    /// What you are good at.
    Profession,
    /// What you can be paid for.
    Vocation,
}

impl IkigaiSection {
    pub const ALL: [IkigaiSection; 4] = [
        Self::Passion,
        Self::Mission,
        Self::Profession,
        Self::Vocation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passion => "passion",
            Self::Mission => "mission",
            Self::Profession => "profession",
            Self::Vocation => "vocation",
        }
    }

    /// Parses a section name, case-insensitive.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "passion" => Ok(Self::Passion),
            "mission" => Ok(Self::Mission),
            "profession" => Ok(Self::Profession),
            "vocation" => Ok(Self::Vocation),
            _ => Err(ValidationError::UnknownValue {
                field: "section",
                value: value.to_string(),
            }),
        }
    }
}

/// Ikigai entries submitted by an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IkigaiEntries {
    #[serde(default)]
    pub passion: Vec<String>,
    #[serde(default)]
    pub mission: Vec<String>,
    #[serde(default)]
    pub profession: Vec<String>,
    #[serde(default)]
    pub vocation: Vec<String>,
}

impl IkigaiEntries {
    /// Returns a copy with entries trimmed and blanks removed.
    pub fn normalized(&self) -> Self {
        Self {
            passion: normalize_entries(&self.passion),
            mission: normalize_entries(&self.mission),
            profession: normalize_entries(&self.profession),
            vocation: normalize_entries(&self.vocation),
        }
    }

    pub fn section(&self, section: IkigaiSection) -> &[String] {
        match section {
            IkigaiSection::Passion => &self.passion,
            IkigaiSection::Mission => &self.mission,
            IkigaiSection::Profession => &self.profession,
            IkigaiSection::Vocation => &self.vocation,
        }
    }

    /// True when every section has at least one entry.
    pub fn is_complete(&self) -> bool {
        IkigaiSection::ALL
            .iter()
            .all(|section| !self.section(*section).is_empty())
    }

    /// True when no section has any entry.
    pub fn is_empty(&self) -> bool {
        IkigaiSection::ALL
            .iter()
            .all(|section| self.section(*section).is_empty())
    }
}

/// Persisted Ikigai map for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IkigaiMap {
    pub profile_id: ProfileId,
    #[serde(flatten)]
    pub entries: IkigaiEntries,
    pub updated_at: i64,
}

fn normalize_entries(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{IkigaiEntries, IkigaiSection};

    #[test]
    fn normalized_drops_blank_entries() {
        let entries = IkigaiEntries {
            passion: vec!["  music ".to_string(), "   ".to_string()],
            ..IkigaiEntries::default()
        };
        let normalized = entries.normalized();
        assert_eq!(normalized.passion, vec!["music".to_string()]);
        assert!(!normalized.is_complete());
        assert!(!normalized.is_empty());
    }

    #[test]
    fn completeness_requires_every_section() {
        let mut entries = IkigaiEntries {
            passion: vec!["art".to_string()],
            mission: vec!["education".to_string()],
            profession: vec!["design".to_string()],
            vocation: Vec::new(),
        };
        assert!(!entries.is_complete());
        entries.vocation.push("illustration".to_string());
        assert!(entries.is_complete());
    }

    #[test]
    fn section_parse_is_case_insensitive() {
        assert_eq!(IkigaiSection::parse("Vocation").unwrap(), IkigaiSection::Vocation);
        assert!(IkigaiSection::parse("hobby").is_err());
    }
}
