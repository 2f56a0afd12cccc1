//! Points ledger: append-only rewards and penalties.
//!
//! # Invariants
//! - `Reward::points` and `Penalty::points_lost` are strictly positive.
//! - Total points = sum(rewards) - sum(penalties).
//! - Level = floor(max(points, 0) / 100) + 1.

use super::profile::ProfileId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Points needed per level step.
pub const POINTS_PER_LEVEL: i64 = 100;

/// Credit row in the points ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: Uuid,
    pub profile_id: ProfileId,
    pub points: i64,
    pub description: String,
    pub created_at: i64,
}

/// Debit row in the points ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Penalty {
    pub id: Uuid,
    pub profile_id: ProfileId,
    pub points_lost: i64,
    pub reason: String,
    pub created_at: i64,
}

/// Maintained balance compared against a fresh summation of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAudit {
    /// Balance kept up to date by ledger triggers.
    pub maintained_balance: i64,
    /// sum(rewards) - sum(penalties), recomputed at read time.
    pub ledger_total: i64,
    /// sum(rewards).
    pub lifetime_earned: i64,
}

impl LedgerAudit {
    pub fn is_consistent(&self) -> bool {
        self.maintained_balance == self.ledger_total
    }
}

/// Sums a ledger the way the balance triggers do.
pub fn ledger_total(rewards: &[Reward], penalties: &[Penalty]) -> i64 {
    let earned: i64 = rewards.iter().map(|reward| reward.points).sum();
    let lost: i64 = penalties.iter().map(|penalty| penalty.points_lost).sum();
    earned - lost
}

/// Level derived from a point total; never below 1.
pub fn level_for_points(points: i64) -> i64 {
    points.max(0) / POINTS_PER_LEVEL + 1
}
