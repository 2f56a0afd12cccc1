//! Achievement repository with idempotent awarding.
//!
//! # Invariants
//! - `award` inserts at most one row per `(profile, title)`; existing rows are
//!   never modified.

use super::{not_found_on_foreign_key, parse_count, parse_uuid, RepoError, RepoResult};
use crate::model::achievement::{Achievement, AchievementDefinition};
use crate::model::profile::ProfileId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const ACHIEVEMENT_SELECT_SQL: &str = "SELECT
    id,
    profile_id,
    title,
    description,
    category,
    points,
    unlocked_at
FROM achievements";

pub trait AchievementRepository {
    /// Returns the new row, or `None` when the title was already unlocked.
    fn award(
        &self,
        profile_id: ProfileId,
        definition: &AchievementDefinition,
    ) -> RepoResult<Option<Achievement>>;
    /// Newest first, optionally limited.
    fn list_achievements(
        &self,
        profile_id: ProfileId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Achievement>>;
    fn count_achievements(&self, profile_id: ProfileId) -> RepoResult<u32>;
}

pub struct SqliteAchievementRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAchievementRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AchievementRepository for SqliteAchievementRepository<'_> {
    fn award(
        &self,
        profile_id: ProfileId,
        definition: &AchievementDefinition,
    ) -> RepoResult<Option<Achievement>> {
        let id = Uuid::new_v4();
        let inserted = self
            .conn
            .execute(
                "INSERT INTO achievements (id, profile_id, title, description, category, points)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(profile_id, title) DO NOTHING;",
                params![
                    id.to_string(),
                    profile_id.to_string(),
                    definition.title,
                    definition.description,
                    definition.category,
                    definition.points,
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "profile", profile_id))?;

        if inserted == 0 {
            return Ok(None);
        }

        let mut stmt = self
            .conn
            .prepare(&format!("{ACHIEVEMENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_achievement_row(row)?)),
            None => Err(RepoError::InvalidData(
                "achievement missing in read-back".to_string(),
            )),
        }
    }

    fn list_achievements(
        &self,
        profile_id: ProfileId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Achievement>> {
        let mut sql = format!(
            "{ACHIEVEMENT_SELECT_SQL} WHERE profile_id = ? ORDER BY unlocked_at DESC, rowid DESC"
        );
        let mut bind_values = vec![Value::Text(profile_id.to_string())];
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut achievements = Vec::new();
        while let Some(row) = rows.next()? {
            achievements.push(parse_achievement_row(row)?);
        }
        Ok(achievements)
    }

    fn count_achievements(&self, profile_id: ProfileId) -> RepoResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM achievements WHERE profile_id = ?1;",
            [profile_id.to_string()],
            |row| row.get(0),
        )?;
        parse_count(count, "achievements.count")
    }
}

fn parse_achievement_row(row: &Row<'_>) -> RepoResult<Achievement> {
    let id_text: String = row.get("id")?;
    let profile_text: String = row.get("profile_id")?;
    Ok(Achievement {
        id: parse_uuid(&id_text, "achievements.id")?,
        profile_id: parse_uuid(&profile_text, "achievements.profile_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        category: row.get("category")?,
        points: row.get("points")?,
        unlocked_at: row.get("unlocked_at")?,
    })
}
