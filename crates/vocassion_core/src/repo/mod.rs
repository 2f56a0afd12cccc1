//! Repository layer: one contract + SQLite implementation per aggregate.
//!
//! # Responsibility
//! - Keep SQL inside the persistence boundary.
//! - Translate constraint violations into semantic errors (`Conflict`).
//!
//! # Invariants
//! - Repositories never open transactions; services own the transaction
//!   boundary and hand repositories a `&Connection` (or a `Transaction`).
//! - Reads reject malformed persisted values instead of masking them.

use crate::db::DbError;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod achievement_repo;
pub mod challenge_repo;
pub mod community_repo;
pub mod goal_repo;
pub mod ikigai_repo;
pub mod ledger_repo;
pub mod profile_repo;
pub mod reflection_repo;
pub mod streak_repo;
pub mod team_challenge_repo;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all aggregates.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Row addressed by id does not exist (or belongs to someone else).
    NotFound { entity: &'static str, id: String },
    /// Unique constraint rejected the write.
    Conflict { entity: &'static str, detail: String },
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict { entity, detail } => write!(f, "{entity} conflict: {detail}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Conflict { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Maps a unique violation to `Conflict`, passing other errors through.
pub(crate) fn conflict_on_unique(
    err: rusqlite::Error,
    entity: &'static str,
    detail: impl Into<String>,
) -> RepoError {
    let db_error = DbError::Sqlite(err);
    if db_error.is_unique_violation() {
        RepoError::Conflict {
            entity,
            detail: detail.into(),
        }
    } else {
        RepoError::Db(db_error)
    }
}

/// Maps a foreign-key violation to `NotFound` for the referenced entity.
pub(crate) fn not_found_on_foreign_key(
    err: rusqlite::Error,
    entity: &'static str,
    id: impl ToString,
) -> RepoError {
    let db_error = DbError::Sqlite(err);
    if db_error.is_foreign_key_violation() {
        RepoError::not_found(entity, id)
    } else {
        RepoError::Db(db_error)
    }
}

/// Maps foreign-key violations to `NotFound` for `owner` and unique
/// violations to `Conflict` for `entity`.
pub(crate) fn classify_write_error(
    err: rusqlite::Error,
    owner: &'static str,
    owner_id: impl ToString,
    entity: &'static str,
    detail: impl Into<String>,
) -> RepoError {
    let db_error = DbError::Sqlite(err);
    if db_error.is_foreign_key_violation() {
        RepoError::not_found(owner, owner_id)
    } else if db_error.is_unique_violation() {
        RepoError::Conflict {
            entity,
            detail: detail.into(),
        }
    } else {
        RepoError::Db(db_error)
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

pub(crate) fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {column}"
        ))),
    }
}

pub(crate) fn parse_count(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid count `{value}` in {column}")))
}

pub(crate) fn parse_percent(value: i64, column: &str) -> RepoResult<u8> {
    match u8::try_from(value) {
        Ok(percent) if percent <= 100 => Ok(percent),
        _ => Err(RepoError::InvalidData(format!(
            "invalid percentage `{value}` in {column}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_bool, parse_date, parse_percent, RepoError};

    #[test]
    fn malformed_values_become_invalid_data() {
        assert!(matches!(
            parse_date("2026-13-01", "streaks.last_checkin"),
            Err(RepoError::InvalidData(_))
        ));
        assert!(matches!(
            parse_bool(2, "milestones.is_completed"),
            Err(RepoError::InvalidData(_))
        ));
        assert!(matches!(
            parse_percent(101, "goals.progress"),
            Err(RepoError::InvalidData(_))
        ));
    }
}
