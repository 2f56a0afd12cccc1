//! Challenge repository.
//!
//! # Invariants
//! - `mark_completed` only flips `pending` rows; a second call reports `false`.
//! - `ensure_daily` inserts a templated challenge at most once per
//!   `(profile, date, title)`.

use super::{
    format_date, not_found_on_foreign_key, parse_count, parse_date, parse_uuid, RepoError,
    RepoResult,
};
use crate::model::challenge::{Challenge, ChallengeId, ChallengeKind, ChallengeStatus};
use crate::model::ikigai::IkigaiSection;
use crate::model::profile::ProfileId;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const CHALLENGE_SELECT_SQL: &str = "SELECT
    id,
    profile_id,
    title,
    description,
    kind,
    category,
    points,
    status,
    challenge_date,
    completed_at,
    created_at
FROM challenges";

/// Insert payload for one challenge row.
#[derive(Debug, Clone, Copy)]
pub struct ChallengeInsert<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub kind: ChallengeKind,
    pub category: IkigaiSection,
    pub points: i64,
    pub challenge_date: NaiveDate,
}

pub trait ChallengeRepository {
    fn create_challenge(
        &self,
        profile_id: ProfileId,
        challenge: &ChallengeInsert<'_>,
    ) -> RepoResult<Challenge>;
    /// Inserts a daily challenge unless one with the same title exists for
    /// that date. Returns whether a row was written.
    fn ensure_daily(&self, profile_id: ProfileId, challenge: &ChallengeInsert<'_>)
        -> RepoResult<bool>;
    /// Fails with `NotFound` when missing or owned by someone else.
    fn get_challenge(&self, profile_id: ProfileId, challenge_id: ChallengeId)
        -> RepoResult<Challenge>;
    /// Challenges of one kind for one date, in creation order.
    fn list_for_date(
        &self,
        profile_id: ProfileId,
        kind: ChallengeKind,
        date: NaiveDate,
    ) -> RepoResult<Vec<Challenge>>;
    /// All challenges, newest first.
    fn list_challenges(&self, profile_id: ProfileId) -> RepoResult<Vec<Challenge>>;
    fn mark_completed(&self, challenge_id: ChallengeId) -> RepoResult<bool>;
    fn count_completed(&self, profile_id: ProfileId) -> RepoResult<u32>;
}

pub struct SqliteChallengeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChallengeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load(&self, challenge_id: ChallengeId) -> RepoResult<Option<Challenge>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHALLENGE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([challenge_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_challenge_row(row)?));
        }
        Ok(None)
    }
}

impl ChallengeRepository for SqliteChallengeRepository<'_> {
    fn create_challenge(
        &self,
        profile_id: ProfileId,
        challenge: &ChallengeInsert<'_>,
    ) -> RepoResult<Challenge> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO challenges (
                    id, profile_id, title, description, kind, category, points, status,
                    challenge_date
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', ?8);",
                params![
                    id.to_string(),
                    profile_id.to_string(),
                    challenge.title,
                    challenge.description,
                    challenge.kind.as_str(),
                    challenge.category.as_str(),
                    challenge.points,
                    format_date(challenge.challenge_date),
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "profile", profile_id))?;

        self.load(id)?
            .ok_or_else(|| RepoError::InvalidData("challenge missing in read-back".to_string()))
    }

    fn ensure_daily(
        &self,
        profile_id: ProfileId,
        challenge: &ChallengeInsert<'_>,
    ) -> RepoResult<bool> {
        let inserted = self
            .conn
            .execute(
                "INSERT INTO challenges (
                    id, profile_id, title, description, kind, category, points, status,
                    challenge_date
                 )
                 SELECT ?1, ?2, ?3, ?4, 'daily', ?5, ?6, 'pending', ?7
                 WHERE NOT EXISTS (
                    SELECT 1 FROM challenges
                    WHERE profile_id = ?2
                      AND kind = 'daily'
                      AND challenge_date = ?7
                      AND title = ?3
                 );",
                params![
                    Uuid::new_v4().to_string(),
                    profile_id.to_string(),
                    challenge.title,
                    challenge.description,
                    challenge.category.as_str(),
                    challenge.points,
                    format_date(challenge.challenge_date),
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "profile", profile_id))?;
        Ok(inserted == 1)
    }

    fn get_challenge(
        &self,
        profile_id: ProfileId,
        challenge_id: ChallengeId,
    ) -> RepoResult<Challenge> {
        match self.load(challenge_id)? {
            Some(challenge) if challenge.profile_id == profile_id => Ok(challenge),
            _ => Err(RepoError::not_found("challenge", challenge_id)),
        }
    }

    fn list_for_date(
        &self,
        profile_id: ProfileId,
        kind: ChallengeKind,
        date: NaiveDate,
    ) -> RepoResult<Vec<Challenge>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHALLENGE_SELECT_SQL}
             WHERE profile_id = ?1 AND kind = ?2 AND challenge_date = ?3
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            profile_id.to_string(),
            kind.as_str(),
            format_date(date)
        ])?;
        let mut challenges = Vec::new();
        while let Some(row) = rows.next()? {
            challenges.push(parse_challenge_row(row)?);
        }
        Ok(challenges)
    }

    fn list_challenges(&self, profile_id: ProfileId) -> RepoResult<Vec<Challenge>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHALLENGE_SELECT_SQL} WHERE profile_id = ?1 ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([profile_id.to_string()])?;
        let mut challenges = Vec::new();
        while let Some(row) = rows.next()? {
            challenges.push(parse_challenge_row(row)?);
        }
        Ok(challenges)
    }

    fn mark_completed(&self, challenge_id: ChallengeId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE challenges
             SET status = 'completed',
                 completed_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1 AND status = 'pending';",
            [challenge_id.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn count_completed(&self, profile_id: ProfileId) -> RepoResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM challenges WHERE profile_id = ?1 AND status = 'completed';",
            [profile_id.to_string()],
            |row| row.get(0),
        )?;
        parse_count(count, "challenges.count")
    }
}

fn parse_challenge_row(row: &Row<'_>) -> RepoResult<Challenge> {
    let id_text: String = row.get("id")?;
    let profile_text: String = row.get("profile_id")?;
    let kind_text: String = row.get("kind")?;
    let category_text: String = row.get("category")?;
    let status_text: String = row.get("status")?;
    let date_text: String = row.get("challenge_date")?;

    let kind = ChallengeKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in challenges.kind"))
    })?;
    let category = IkigaiSection::parse(&category_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in challenges.category"
        ))
    })?;
    let status = ChallengeStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in challenges.status"))
    })?;

    Ok(Challenge {
        id: parse_uuid(&id_text, "challenges.id")?,
        profile_id: parse_uuid(&profile_text, "challenges.profile_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        kind,
        category,
        points: row.get("points")?,
        status,
        challenge_date: parse_date(&date_text, "challenges.challenge_date")?,
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
    })
}
