//! Profile repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `user_id`, `username` and `slug` are unique; violations surface as
//!   `RepoError::Conflict`.

use super::{conflict_on_unique, parse_uuid, RepoError, RepoResult};
use crate::model::profile::{Profile, ProfileId};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    username,
    slug,
    name,
    email,
    image_url,
    created_at,
    updated_at
FROM profiles";

/// Insert payload once name and username are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInsert<'a> {
    pub user_id: &'a str,
    pub username: &'a str,
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub image_url: Option<&'a str>,
}

pub trait ProfileRepository {
    fn create_profile(&self, insert: &ProfileInsert<'_>) -> RepoResult<Profile>;
    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>>;
    fn find_by_user_id(&self, user_id: &str) -> RepoResult<Option<Profile>>;
    fn rename_profile(&self, id: ProfileId, name: &str) -> RepoResult<()>;
}

pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn create_profile(&self, insert: &ProfileInsert<'_>) -> RepoResult<Profile> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO profiles (id, user_id, username, slug, name, email, image_url)
                 VALUES (?1, ?2, ?3, ?3, ?4, ?5, ?6);",
                params![
                    id.to_string(),
                    insert.user_id,
                    insert.username,
                    insert.name,
                    insert.email,
                    insert.image_url,
                ],
            )
            .map_err(|err| {
                conflict_on_unique(err, "profile", format!("user `{}`", insert.user_id))
            })?;

        self.get_profile(id)?
            .ok_or_else(|| RepoError::InvalidData("created profile missing in read-back".into()))
    }

    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }
        Ok(None)
    }

    fn find_by_user_id(&self, user_id: &str) -> RepoResult<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE user_id = ?1;"))?;
        let mut rows = stmt.query([user_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }
        Ok(None)
    }

    fn rename_profile(&self, id: ProfileId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE profiles
             SET name = ?2, updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), name],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("profile", id));
        }
        Ok(())
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let id_text: String = row.get("id")?;
    Ok(Profile {
        id: parse_uuid(&id_text, "profiles.id")?,
        user_id: row.get("user_id")?,
        username: row.get("username")?,
        slug: row.get("slug")?,
        name: row.get("name")?,
        email: row.get("email")?,
        image_url: row.get("image_url")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
