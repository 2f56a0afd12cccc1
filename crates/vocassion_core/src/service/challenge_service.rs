//! Challenge use cases: daily set materialization, custom challenges and
//! completion.
//!
//! # Invariants
//! - Completing a challenge is atomic: status flip, reward, streak check-in
//!   and achievement re-check commit together or not at all.
//! - A challenge completes at most once; a repeat is a `Conflict`.

use super::progression_service::{
    apply_streak_checkin, award_challenge_achievements, credit_points, StreakUpdate,
};
use super::{begin_immediate, ServiceError, ServiceResult};
use crate::model::achievement::Achievement;
use crate::model::challenge::{
    Challenge, ChallengeId, ChallengeKind, DailyTask, NewChallenge, DAILY_TEMPLATES,
};
use crate::model::profile::ProfileId;
use crate::model::streak::ACTIVITY_DAILY_CHALLENGES;
use crate::model::ValidationError;
use crate::repo::challenge_repo::{ChallengeInsert, ChallengeRepository, SqliteChallengeRepository};
use crate::repo::ikigai_repo::{IkigaiRepository, SqliteIkigaiRepository};
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub challenge: Challenge,
    pub points_awarded: i64,
    pub total_points: i64,
    pub streak: StreakUpdate,
    /// Challenge achievements unlocked by this completion.
    pub unlocked: Vec<Achievement>,
}

pub struct ChallengeService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> ChallengeService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Returns today's daily challenges, creating any that are missing.
    pub fn daily_challenges(
        &mut self,
        profile_id: ProfileId,
        today: NaiveDate,
    ) -> ServiceResult<Vec<Challenge>> {
        let tx = begin_immediate(self.conn)?;
        let ikigai = SqliteIkigaiRepository::new(&tx).get_map(profile_id)?;
        let repo = SqliteChallengeRepository::new(&tx);

        let mut created = 0;
        for template in DAILY_TEMPLATES {
            let description =
                template.personalized_description(ikigai.as_ref().map(|map| &map.entries));
            let insert = ChallengeInsert {
                title: template.title,
                description: &description,
                kind: ChallengeKind::Daily,
                category: template.category,
                points: template.points,
                challenge_date: today,
            };
            if repo.ensure_daily(profile_id, &insert)? {
                created += 1;
            }
        }
        let challenges = repo.list_for_date(profile_id, ChallengeKind::Daily, today)?;
        tx.commit()?;

        if created > 0 {
            info!(
                "event=daily_challenges module=challenge status=ok profile_id={} date={} created={}",
                profile_id, today, created
            );
        }
        Ok(challenges)
    }

    /// Creates a custom weekly or special challenge dated `today`.
    ///
    /// Daily challenges come only from the templates.
    pub fn create_challenge(
        &mut self,
        profile_id: ProfileId,
        request: &NewChallenge,
        today: NaiveDate,
    ) -> ServiceResult<Challenge> {
        let request = request.validated()?;
        if request.kind == ChallengeKind::Daily {
            return Err(ValidationError::UnknownValue {
                field: "kind",
                value: request.kind.as_str().to_string(),
            }
            .into());
        }

        let tx = begin_immediate(self.conn)?;
        let challenge = SqliteChallengeRepository::new(&tx).create_challenge(
            profile_id,
            &ChallengeInsert {
                title: &request.title,
                description: &request.description,
                kind: request.kind,
                category: request.category,
                points: request.points,
                challenge_date: today,
            },
        )?;
        tx.commit()?;
        Ok(challenge)
    }

    /// All challenges, newest first.
    pub fn list_challenges(&self, profile_id: ProfileId) -> ServiceResult<Vec<Challenge>> {
        Ok(SqliteChallengeRepository::new(&*self.conn).list_challenges(profile_id)?)
    }

    /// Completes a challenge, credits its points, checks in the
    /// `daily_challenges` streak and re-checks challenge achievements.
    ///
    /// # Errors
    /// - `NotFound` for unknown ids or challenges owned by someone else.
    /// - `Conflict` when the challenge is already completed.
    pub fn complete_challenge(
        &mut self,
        profile_id: ProfileId,
        challenge_id: ChallengeId,
        today: NaiveDate,
    ) -> ServiceResult<CompletionOutcome> {
        let tx = begin_immediate(self.conn)?;
        let repo = SqliteChallengeRepository::new(&tx);
        let challenge = repo.get_challenge(profile_id, challenge_id)?;
        if !repo.mark_completed(challenge_id)? {
            return Err(ServiceError::conflict("Challenge already completed"));
        }

        let description = format!("Completed daily challenge: {}", challenge.title);
        let total_points = credit_points(&tx, profile_id, challenge.points, &description)?;
        let streak = apply_streak_checkin(&tx, profile_id, ACTIVITY_DAILY_CHALLENGES, today)?;
        let unlocked = award_challenge_achievements(&tx, profile_id)?;
        let challenge = repo.get_challenge(profile_id, challenge_id)?;
        tx.commit()?;

        info!(
            "event=challenge_complete module=challenge status=ok profile_id={} challenge_id={} points={} unlocked={}",
            profile_id,
            challenge_id,
            challenge.points,
            unlocked.len()
        );
        Ok(CompletionOutcome {
            points_awarded: challenge.points,
            challenge,
            total_points,
            streak,
            unlocked,
        })
    }

    /// Today's daily challenges as compact task rows.
    pub fn daily_tasks(
        &self,
        profile_id: ProfileId,
        today: NaiveDate,
    ) -> ServiceResult<Vec<DailyTask>> {
        let challenges = SqliteChallengeRepository::new(&*self.conn).list_for_date(
            profile_id,
            ChallengeKind::Daily,
            today,
        )?;
        Ok(challenges.iter().map(DailyTask::from).collect())
    }
}
