//! Streak repository keyed by `(profile, activity)`.

use super::{format_date, not_found_on_foreign_key, parse_count, parse_date, parse_uuid, RepoResult};
use crate::model::profile::ProfileId;
use crate::model::streak::Streak;
use rusqlite::{params, Connection, Row};

pub trait StreakRepository {
    fn get_streak(&self, profile_id: ProfileId, activity: &str) -> RepoResult<Option<Streak>>;
    /// Inserts or overwrites the record for `(profile, activity)`.
    fn save_streak(&self, streak: &Streak) -> RepoResult<()>;
    /// Sorted by activity name.
    fn list_streaks(&self, profile_id: ProfileId) -> RepoResult<Vec<Streak>>;
}

pub struct SqliteStreakRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStreakRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StreakRepository for SqliteStreakRepository<'_> {
    fn get_streak(&self, profile_id: ProfileId, activity: &str) -> RepoResult<Option<Streak>> {
        let mut stmt = self.conn.prepare(
            "SELECT profile_id, activity, current_count, longest_count, last_checkin
             FROM streaks
             WHERE profile_id = ?1 AND activity = ?2;",
        )?;
        let mut rows = stmt.query(params![profile_id.to_string(), activity])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_streak_row(row)?));
        }
        Ok(None)
    }

    fn save_streak(&self, streak: &Streak) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO streaks (profile_id, activity, current_count, longest_count, last_checkin)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(profile_id, activity) DO UPDATE SET
                    current_count = excluded.current_count,
                    longest_count = excluded.longest_count,
                    last_checkin = excluded.last_checkin;",
                params![
                    streak.profile_id.to_string(),
                    streak.activity.as_str(),
                    i64::from(streak.current_count),
                    i64::from(streak.longest_count),
                    format_date(streak.last_checkin),
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "profile", streak.profile_id))?;
        Ok(())
    }

    fn list_streaks(&self, profile_id: ProfileId) -> RepoResult<Vec<Streak>> {
        let mut stmt = self.conn.prepare(
            "SELECT profile_id, activity, current_count, longest_count, last_checkin
             FROM streaks
             WHERE profile_id = ?1
             ORDER BY activity ASC;",
        )?;
        let mut rows = stmt.query([profile_id.to_string()])?;
        let mut streaks = Vec::new();
        while let Some(row) = rows.next()? {
            streaks.push(parse_streak_row(row)?);
        }
        Ok(streaks)
    }
}

fn parse_streak_row(row: &Row<'_>) -> RepoResult<Streak> {
    let profile_text: String = row.get("profile_id")?;
    let last_checkin: String = row.get("last_checkin")?;
    Ok(Streak {
        profile_id: parse_uuid(&profile_text, "streaks.profile_id")?,
        activity: row.get("activity")?,
        current_count: parse_count(row.get("current_count")?, "streaks.current_count")?,
        longest_count: parse_count(row.get("longest_count")?, "streaks.longest_count")?,
        last_checkin: parse_date(&last_checkin, "streaks.last_checkin")?,
    })
}
