//! Points ledger repository.
//!
//! # Invariants
//! - Rewards and penalties are insert-only; schema triggers reject updates.
//! - `point_balances` is maintained by triggers in the same statement as each
//!   ledger insert, so `balance()` never needs a summation.

use super::{not_found_on_foreign_key, parse_uuid, RepoError, RepoResult};
use crate::model::ledger::{LedgerAudit, Penalty, Reward};
use crate::model::profile::ProfileId;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

pub trait LedgerRepository {
    fn append_reward(
        &self,
        profile_id: ProfileId,
        points: i64,
        description: &str,
    ) -> RepoResult<Reward>;
    fn append_penalty(
        &self,
        profile_id: ProfileId,
        points_lost: i64,
        reason: &str,
    ) -> RepoResult<Penalty>;
    /// Newest first.
    fn list_rewards(&self, profile_id: ProfileId) -> RepoResult<Vec<Reward>>;
    /// Newest first.
    fn list_penalties(&self, profile_id: ProfileId) -> RepoResult<Vec<Penalty>>;
    /// Maintained balance; 0 for profiles without ledger activity.
    fn balance(&self, profile_id: ProfileId) -> RepoResult<i64>;
    /// Maintained balance next to a fresh summation of the ledger.
    fn audit(&self, profile_id: ProfileId) -> RepoResult<LedgerAudit>;
}

pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn append_reward(
        &self,
        profile_id: ProfileId,
        points: i64,
        description: &str,
    ) -> RepoResult<Reward> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO rewards (id, profile_id, points, description)
                 VALUES (?1, ?2, ?3, ?4);",
                params![id.to_string(), profile_id.to_string(), points, description],
            )
            .map_err(|err| not_found_on_foreign_key(err, "profile", profile_id))?;

        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, points, description, created_at
             FROM rewards WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_reward_row(row),
            None => Err(RepoError::InvalidData(
                "reward missing in read-back".to_string(),
            )),
        }
    }

    fn append_penalty(
        &self,
        profile_id: ProfileId,
        points_lost: i64,
        reason: &str,
    ) -> RepoResult<Penalty> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO penalties (id, profile_id, points_lost, reason)
                 VALUES (?1, ?2, ?3, ?4);",
                params![id.to_string(), profile_id.to_string(), points_lost, reason],
            )
            .map_err(|err| not_found_on_foreign_key(err, "profile", profile_id))?;

        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, points_lost, reason, created_at
             FROM penalties WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_penalty_row(row),
            None => Err(RepoError::InvalidData(
                "penalty missing in read-back".to_string(),
            )),
        }
    }

    fn list_rewards(&self, profile_id: ProfileId) -> RepoResult<Vec<Reward>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, points, description, created_at
             FROM rewards
             WHERE profile_id = ?1
             ORDER BY created_at DESC, rowid DESC;",
        )?;
        let mut rows = stmt.query([profile_id.to_string()])?;
        let mut rewards = Vec::new();
        while let Some(row) = rows.next()? {
            rewards.push(parse_reward_row(row)?);
        }
        Ok(rewards)
    }

    fn list_penalties(&self, profile_id: ProfileId) -> RepoResult<Vec<Penalty>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, points_lost, reason, created_at
             FROM penalties
             WHERE profile_id = ?1
             ORDER BY created_at DESC, rowid DESC;",
        )?;
        let mut rows = stmt.query([profile_id.to_string()])?;
        let mut penalties = Vec::new();
        while let Some(row) = rows.next()? {
            penalties.push(parse_penalty_row(row)?);
        }
        Ok(penalties)
    }

    fn balance(&self, profile_id: ProfileId) -> RepoResult<i64> {
        let balance = self
            .conn
            .query_row(
                "SELECT balance FROM point_balances WHERE profile_id = ?1;",
                [profile_id.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(balance.unwrap_or(0))
    }

    fn audit(&self, profile_id: ProfileId) -> RepoResult<LedgerAudit> {
        let id = profile_id.to_string();
        let (earned, lost): (i64, i64) = self.conn.query_row(
            "SELECT
                COALESCE((SELECT SUM(points) FROM rewards WHERE profile_id = ?1), 0),
                COALESCE((SELECT SUM(points_lost) FROM penalties WHERE profile_id = ?1), 0);",
            [id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let maintained = self
            .conn
            .query_row(
                "SELECT balance, lifetime_earned FROM point_balances WHERE profile_id = ?1;",
                [id.as_str()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        let (maintained_balance, lifetime_earned) = maintained.unwrap_or((0, 0));

        Ok(LedgerAudit {
            maintained_balance,
            ledger_total: earned - lost,
            lifetime_earned,
        })
    }
}

fn parse_reward_row(row: &Row<'_>) -> RepoResult<Reward> {
    let id_text: String = row.get("id")?;
    let profile_text: String = row.get("profile_id")?;
    Ok(Reward {
        id: parse_uuid(&id_text, "rewards.id")?,
        profile_id: parse_uuid(&profile_text, "rewards.profile_id")?,
        points: row.get("points")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_penalty_row(row: &Row<'_>) -> RepoResult<Penalty> {
    let id_text: String = row.get("id")?;
    let profile_text: String = row.get("profile_id")?;
    Ok(Penalty {
        id: parse_uuid(&id_text, "penalties.id")?,
        profile_id: parse_uuid(&profile_text, "penalties.profile_id")?,
        points_lost: row.get("points_lost")?,
        reason: row.get("reason")?,
        created_at: row.get("created_at")?,
    })
}
