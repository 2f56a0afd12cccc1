//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own the transaction boundary: each mutating use case runs in one
//!   `BEGIN IMMEDIATE` transaction and commits only when every step succeeds.
//!
//! # Invariants
//! - Repositories are always built over the open transaction, never over the
//!   outer connection, while a use case is in flight.
//! - A failed step drops the transaction, rolling back every row it wrote.

use crate::db::DbError;
use crate::model::ValidationError;
use crate::repo::RepoError;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod challenge_service;
pub mod community_service;
pub mod goal_service;
pub mod ikigai_service;
pub mod profile_service;
pub mod progression_service;
pub mod reflection_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by use-case services.
#[derive(Debug)]
pub enum ServiceError {
    /// Request payload failed validation.
    Validation(ValidationError),
    /// Addressed record is missing or owned by another profile.
    NotFound { entity: &'static str, id: String },
    /// Duplicate write or wrong lifecycle state.
    Conflict(String),
    /// Balance does not cover a goal unlock.
    InsufficientPoints { available: i64, required: i64 },
    /// Storage-level failure.
    Repo(RepoError),
}

impl ServiceError {
    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::InsufficientPoints {
                available,
                required,
            } => write!(
                f,
                "Insufficient points: {available} available, {required} required"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Conflict { entity, detail } => {
                Self::Conflict(format!("{entity} conflict: {detail}"))
            }
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(DbError::Sqlite(value)))
    }
}

/// Opens the write transaction every mutating use case runs in.
pub(crate) fn begin_immediate(conn: &mut Connection) -> ServiceResult<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(Into::into)
}
