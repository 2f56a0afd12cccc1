//! Daily reflection use case.

use super::progression_service::{apply_streak_checkin, StreakUpdate};
use super::{begin_immediate, ServiceResult};
use crate::model::profile::ProfileId;
use crate::model::reflection::{DailyReflection, NewReflection};
use crate::model::streak::ACTIVITY_DAILY_REFLECTION;
use crate::repo::reflection_repo::{ReflectionRepository, SqliteReflectionRepository};
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionOutcome {
    pub reflection: DailyReflection,
    pub streak: StreakUpdate,
}

pub struct ReflectionService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> ReflectionService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Stores today's reflection and checks in the `daily_reflection` streak.
    ///
    /// # Errors
    /// - `Validation` listing every blank field.
    /// - `Conflict` when a reflection already exists for `today`.
    pub fn submit_reflection(
        &mut self,
        profile_id: ProfileId,
        request: &NewReflection,
        today: NaiveDate,
    ) -> ServiceResult<ReflectionOutcome> {
        let request = request.validated()?;

        let tx = begin_immediate(self.conn)?;
        let reflection =
            SqliteReflectionRepository::new(&tx).create_reflection(profile_id, today, &request)?;
        let streak = apply_streak_checkin(&tx, profile_id, ACTIVITY_DAILY_REFLECTION, today)?;
        tx.commit()?;

        info!(
            "event=reflection_submit module=reflection status=ok profile_id={} date={} streak={}",
            profile_id, today, streak.streak.current_count
        );
        Ok(ReflectionOutcome { reflection, streak })
    }

    pub fn reflection_for(
        &self,
        profile_id: ProfileId,
        date: NaiveDate,
    ) -> ServiceResult<Option<DailyReflection>> {
        Ok(SqliteReflectionRepository::new(&*self.conn).get_for_date(profile_id, date)?)
    }
}
