//! Ikigai assessment use cases.

use super::profile_service::require_profile;
use super::progression_service::credit_points;
use super::{begin_immediate, ServiceError, ServiceResult};
use crate::model::achievement::{Achievement, IKIGAI_MASTER, IKIGAI_PIONEER};
use crate::model::ikigai::{IkigaiEntries, IkigaiMap, IkigaiSection};
use crate::model::profile::ProfileId;
use crate::model::ValidationError;
use crate::repo::achievement_repo::{AchievementRepository, SqliteAchievementRepository};
use crate::repo::ikigai_repo::{IkigaiRepository, SqliteIkigaiRepository};
use crate::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use log::info;
use rusqlite::Connection;
use serde::Serialize;

/// Points credited the first time an assessment is submitted.
pub const ASSESSMENT_REWARD_POINTS: i64 = 100;
/// Points credited per completed map section.
pub const SECTION_REWARD_POINTS: i64 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentOutcome {
    pub map: IkigaiMap,
    /// Set only on the first submission.
    pub unlocked: Option<Achievement>,
    pub points_awarded: i64,
    pub total_points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionOutcome {
    pub section: IkigaiSection,
    pub total_points: i64,
    pub unlocked: Option<Achievement>,
}

pub struct IkigaiService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> IkigaiService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    pub fn get_map(&self, profile_id: ProfileId) -> ServiceResult<Option<IkigaiMap>> {
        Ok(SqliteIkigaiRepository::new(&*self.conn).get_map(profile_id)?)
    }

    /// Another member's map, looked up by user id.
    ///
    /// # Errors
    /// - `NotFound` when the user has no profile or has not mapped yet.
    pub fn map_for_user(&self, user_id: &str) -> ServiceResult<IkigaiMap> {
        let profile = require_profile(&*self.conn, user_id)?;
        self.get_map(profile.id)?.ok_or_else(|| ServiceError::NotFound {
            entity: "ikigai map",
            id: user_id.to_string(),
        })
    }

    /// Stores the map and unlocks "Ikigai Pioneer" on the first submission.
    ///
    /// Resubmitting replaces the map without crediting points again.
    pub fn submit_assessment(
        &mut self,
        profile_id: ProfileId,
        entries: &IkigaiEntries,
    ) -> ServiceResult<AssessmentOutcome> {
        let entries = entries.normalized();
        if entries.is_empty() {
            return Err(ValidationError::Required("ikigai").into());
        }

        let tx = begin_immediate(self.conn)?;
        let map = SqliteIkigaiRepository::new(&tx).upsert_map(profile_id, &entries)?;
        let unlocked = SqliteAchievementRepository::new(&tx).award(profile_id, &IKIGAI_PIONEER)?;
        let points_awarded = if unlocked.is_some() {
            ASSESSMENT_REWARD_POINTS
        } else {
            0
        };
        let total_points = if points_awarded > 0 {
            credit_points(&tx, profile_id, points_awarded, "Completed Ikigai Assessment")?
        } else {
            SqliteLedgerRepository::new(&tx).balance(profile_id)?
        };
        tx.commit()?;

        info!(
            "event=ikigai_submit module=ikigai status=ok profile_id={} first_submission={}",
            profile_id,
            unlocked.is_some()
        );
        Ok(AssessmentOutcome {
            map,
            unlocked,
            points_awarded,
            total_points,
        })
    }

    /// Credits a finished section; unlocks "Ikigai Master" once all four
    /// sections hold entries.
    pub fn record_section_progress(
        &mut self,
        profile_id: ProfileId,
        section: IkigaiSection,
    ) -> ServiceResult<SectionOutcome> {
        let tx = begin_immediate(self.conn)?;
        let description = format!("Completed {} section of Ikigai map", section.as_str());
        let total_points = credit_points(&tx, profile_id, SECTION_REWARD_POINTS, &description)?;

        let complete = SqliteIkigaiRepository::new(&tx)
            .get_map(profile_id)?
            .is_some_and(|map| map.entries.is_complete());
        let unlocked = if complete {
            SqliteAchievementRepository::new(&tx).award(profile_id, &IKIGAI_MASTER)?
        } else {
            None
        };
        tx.commit()?;

        Ok(SectionOutcome {
            section,
            total_points,
            unlocked,
        })
    }
}
