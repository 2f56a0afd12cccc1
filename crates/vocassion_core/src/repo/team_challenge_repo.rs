//! Team challenge repository: challenges and their participants.

use super::{
    classify_write_error, format_date, not_found_on_foreign_key, parse_count, parse_date,
    parse_percent, parse_uuid, RepoError, RepoResult,
};
use crate::model::community::{
    NewTeamChallenge, ParticipantStatus, TeamChallenge, TeamChallengeCategory, TeamChallengeId,
    TeamChallengeParticipant,
};
use crate::model::profile::ProfileId;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const TEAM_CHALLENGE_SELECT_SQL: &str = "SELECT
    t.id,
    t.creator_id,
    t.title,
    t.description,
    t.category,
    t.reward_points,
    t.end_date,
    t.created_at,
    (SELECT COUNT(*) FROM team_challenge_participants p WHERE p.challenge_id = t.id)
        AS participant_count
FROM team_challenges t";

pub trait TeamChallengeRepository {
    fn create_team_challenge(
        &self,
        creator_id: ProfileId,
        challenge: &NewTeamChallenge,
    ) -> RepoResult<TeamChallenge>;
    fn get_team_challenge(&self, challenge_id: TeamChallengeId) -> RepoResult<TeamChallenge>;
    /// Challenges whose end date is on or after `today`, soonest ending first.
    fn list_active(&self, today: NaiveDate) -> RepoResult<Vec<TeamChallenge>>;
    /// Fails with `Conflict` when the profile already joined.
    fn join(
        &self,
        challenge_id: TeamChallengeId,
        profile_id: ProfileId,
    ) -> RepoResult<TeamChallengeParticipant>;
    fn get_participant(
        &self,
        challenge_id: TeamChallengeId,
        profile_id: ProfileId,
    ) -> RepoResult<Option<TeamChallengeParticipant>>;
    fn update_participant(
        &self,
        challenge_id: TeamChallengeId,
        profile_id: ProfileId,
        progress: u8,
        status: ParticipantStatus,
    ) -> RepoResult<()>;
}

pub struct SqliteTeamChallengeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTeamChallengeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TeamChallengeRepository for SqliteTeamChallengeRepository<'_> {
    fn create_team_challenge(
        &self,
        creator_id: ProfileId,
        challenge: &NewTeamChallenge,
    ) -> RepoResult<TeamChallenge> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO team_challenges (
                    id, creator_id, title, description, category, reward_points, end_date
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    id.to_string(),
                    creator_id.to_string(),
                    challenge.title.as_str(),
                    challenge.description.as_str(),
                    challenge.category.as_str(),
                    challenge.reward_points,
                    format_date(challenge.end_date),
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "profile", creator_id))?;

        self.get_team_challenge(id)
    }

    fn get_team_challenge(&self, challenge_id: TeamChallengeId) -> RepoResult<TeamChallenge> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEAM_CHALLENGE_SELECT_SQL} WHERE t.id = ?1;"))?;
        let mut rows = stmt.query([challenge_id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_team_challenge_row(row),
            None => Err(RepoError::not_found("team_challenge", challenge_id)),
        }
    }

    fn list_active(&self, today: NaiveDate) -> RepoResult<Vec<TeamChallenge>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TEAM_CHALLENGE_SELECT_SQL}
             WHERE t.end_date >= ?1
             ORDER BY t.end_date ASC, t.rowid ASC;"
        ))?;
        let mut rows = stmt.query([format_date(today)])?;
        let mut challenges = Vec::new();
        while let Some(row) = rows.next()? {
            challenges.push(parse_team_challenge_row(row)?);
        }
        Ok(challenges)
    }

    fn join(
        &self,
        challenge_id: TeamChallengeId,
        profile_id: ProfileId,
    ) -> RepoResult<TeamChallengeParticipant> {
        self.conn
            .execute(
                "INSERT INTO team_challenge_participants (challenge_id, profile_id, status)
                 VALUES (?1, ?2, 'active');",
                params![challenge_id.to_string(), profile_id.to_string()],
            )
            .map_err(|err| {
                classify_write_error(
                    err,
                    "team_challenge",
                    challenge_id,
                    "team_challenge_participant",
                    "already joined this challenge",
                )
            })?;

        self.get_participant(challenge_id, profile_id)?.ok_or_else(|| {
            RepoError::InvalidData("participant missing in read-back".to_string())
        })
    }

    fn get_participant(
        &self,
        challenge_id: TeamChallengeId,
        profile_id: ProfileId,
    ) -> RepoResult<Option<TeamChallengeParticipant>> {
        let mut stmt = self.conn.prepare(
            "SELECT challenge_id, profile_id, progress, status, joined_at
             FROM team_challenge_participants
             WHERE challenge_id = ?1 AND profile_id = ?2;",
        )?;
        let mut rows = stmt.query(params![challenge_id.to_string(), profile_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_participant_row(row)?));
        }
        Ok(None)
    }

    fn update_participant(
        &self,
        challenge_id: TeamChallengeId,
        profile_id: ProfileId,
        progress: u8,
        status: ParticipantStatus,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE team_challenge_participants
             SET progress = ?3, status = ?4
             WHERE challenge_id = ?1 AND profile_id = ?2;",
            params![
                challenge_id.to_string(),
                profile_id.to_string(),
                i64::from(progress),
                status.as_str()
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("team_challenge_participant", profile_id));
        }
        Ok(())
    }
}

fn parse_team_challenge_row(row: &Row<'_>) -> RepoResult<TeamChallenge> {
    let id_text: String = row.get("id")?;
    let creator_text: String = row.get("creator_id")?;
    let category_text: String = row.get("category")?;
    let end_text: String = row.get("end_date")?;
    let category = TeamChallengeCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in team_challenges.category"
        ))
    })?;
    Ok(TeamChallenge {
        id: parse_uuid(&id_text, "team_challenges.id")?,
        creator_id: parse_uuid(&creator_text, "team_challenges.creator_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        category,
        reward_points: row.get("reward_points")?,
        end_date: parse_date(&end_text, "team_challenges.end_date")?,
        created_at: row.get("created_at")?,
        participant_count: parse_count(
            row.get("participant_count")?,
            "team_challenge_participants.count",
        )?,
    })
}

fn parse_participant_row(row: &Row<'_>) -> RepoResult<TeamChallengeParticipant> {
    let challenge_text: String = row.get("challenge_id")?;
    let profile_text: String = row.get("profile_id")?;
    let status_text: String = row.get("status")?;
    let status = ParticipantStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in team_challenge_participants.status"
        ))
    })?;
    Ok(TeamChallengeParticipant {
        challenge_id: parse_uuid(&challenge_text, "team_challenge_participants.challenge_id")?,
        profile_id: parse_uuid(&profile_text, "team_challenge_participants.profile_id")?,
        progress: parse_percent(row.get("progress")?, "team_challenge_participants.progress")?,
        status,
        joined_at: row.get("joined_at")?,
    })
}
