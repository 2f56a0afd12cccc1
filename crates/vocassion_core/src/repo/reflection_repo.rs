//! Daily reflection repository; one row per profile per calendar day.

use super::{classify_write_error, format_date, parse_date, parse_uuid, RepoError, RepoResult};
use crate::model::profile::ProfileId;
use crate::model::reflection::{DailyReflection, NewReflection};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub trait ReflectionRepository {
    /// Fails with `Conflict` when the profile already reflected on `date`.
    fn create_reflection(
        &self,
        profile_id: ProfileId,
        date: NaiveDate,
        reflection: &NewReflection,
    ) -> RepoResult<DailyReflection>;
    fn get_for_date(&self, profile_id: ProfileId, date: NaiveDate)
        -> RepoResult<Option<DailyReflection>>;
}

pub struct SqliteReflectionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReflectionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReflectionRepository for SqliteReflectionRepository<'_> {
    fn create_reflection(
        &self,
        profile_id: ProfileId,
        date: NaiveDate,
        reflection: &NewReflection,
    ) -> RepoResult<DailyReflection> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO daily_reflections (
                    id, profile_id, reflection_date, mood, gratitude, challenges, wins, content
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    id.to_string(),
                    profile_id.to_string(),
                    format_date(date),
                    reflection.mood.as_str(),
                    reflection.gratitude.as_str(),
                    reflection.challenges.as_str(),
                    reflection.wins.as_str(),
                    reflection.content.as_str(),
                ],
            )
            .map_err(|err| {
                classify_write_error(
                    err,
                    "profile",
                    profile_id,
                    "daily_reflection",
                    format!("already reflected on {}", format_date(date)),
                )
            })?;

        self.get_for_date(profile_id, date)?.ok_or_else(|| {
            RepoError::InvalidData("daily reflection missing in read-back".to_string())
        })
    }

    fn get_for_date(
        &self,
        profile_id: ProfileId,
        date: NaiveDate,
    ) -> RepoResult<Option<DailyReflection>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, reflection_date, mood, gratitude, challenges, wins,
                    content, created_at
             FROM daily_reflections
             WHERE profile_id = ?1 AND reflection_date = ?2;",
        )?;
        let mut rows = stmt.query(params![profile_id.to_string(), format_date(date)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reflection_row(row)?));
        }
        Ok(None)
    }
}

fn parse_reflection_row(row: &Row<'_>) -> RepoResult<DailyReflection> {
    let id_text: String = row.get("id")?;
    let profile_text: String = row.get("profile_id")?;
    let date_text: String = row.get("reflection_date")?;
    Ok(DailyReflection {
        id: parse_uuid(&id_text, "daily_reflections.id")?,
        profile_id: parse_uuid(&profile_text, "daily_reflections.profile_id")?,
        reflection_date: parse_date(&date_text, "daily_reflections.reflection_date")?,
        mood: row.get("mood")?,
        gratitude: row.get("gratitude")?,
        challenges: row.get("challenges")?,
        wins: row.get("wins")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}
