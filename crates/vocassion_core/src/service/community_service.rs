//! Community use cases: feed posts, likes, comments and team challenges.
//!
//! # Invariants
//! - Contribution rewards are credited in the same transaction as the post or
//!   comment that earns them.
//! - A participant reaching 100% completes once; the reward is never paid
//!   twice.

use super::progression_service::credit_points;
use super::{begin_immediate, ServiceError, ServiceResult};
use crate::model::community::{
    CommunityPost, LikeState, NewPost, NewTeamChallenge, ParticipantStatus, PostComment, PostId,
    PostSummary, TeamChallenge, TeamChallengeId, TeamChallengeParticipant,
};
use crate::model::goal::clamp_progress;
use crate::model::profile::ProfileId;
use crate::model::ValidationError;
use crate::repo::community_repo::{CommunityRepository, SqliteCommunityRepository};
use crate::repo::team_challenge_repo::{SqliteTeamChallengeRepository, TeamChallengeRepository};
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;
use serde::Serialize;

pub const POST_REWARD_POINTS: i64 = 10;
pub const COMMENT_REWARD_POINTS: i64 = 2;
/// Feed page size.
pub const FEED_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationOutcome {
    pub participant: TeamChallengeParticipant,
    /// Points credited by this update; non-zero only on completion.
    pub points_awarded: i64,
}

pub struct CommunityService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> CommunityService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Publishes a post and credits the contribution reward.
    ///
    /// # Errors
    /// - `Validation` for blank title/content.
    /// - `NotFound` for an unknown community.
    pub fn create_post(
        &mut self,
        profile_id: ProfileId,
        request: &NewPost,
    ) -> ServiceResult<CommunityPost> {
        let request = request.validated()?;
        let tx = begin_immediate(self.conn)?;
        let repo = SqliteCommunityRepository::new(&tx);
        let community_id = request.community_id.clone().unwrap_or_default();
        if !repo.community_exists(&community_id)? {
            return Err(ServiceError::NotFound {
                entity: "community",
                id: community_id,
            });
        }
        let post = repo.create_post(profile_id, &request)?;
        credit_points(&tx, profile_id, POST_REWARD_POINTS, "Community contribution")?;
        tx.commit()?;

        info!(
            "event=post_create module=community status=ok profile_id={} post_id={} kind={}",
            profile_id,
            post.id,
            post.kind.as_str()
        );
        Ok(post)
    }

    pub fn list_posts(&self) -> ServiceResult<Vec<PostSummary>> {
        Ok(SqliteCommunityRepository::new(&*self.conn).list_posts(FEED_LIMIT)?)
    }

    pub fn toggle_like(
        &mut self,
        profile_id: ProfileId,
        post_id: PostId,
    ) -> ServiceResult<LikeState> {
        let tx = begin_immediate(self.conn)?;
        let repo = SqliteCommunityRepository::new(&tx);
        repo.get_post(post_id)?;
        let state = repo.toggle_like(post_id, profile_id)?;
        tx.commit()?;
        Ok(state)
    }

    pub fn add_comment(
        &mut self,
        profile_id: ProfileId,
        post_id: PostId,
        content: &str,
    ) -> ServiceResult<PostComment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::Required("content").into());
        }

        let tx = begin_immediate(self.conn)?;
        let repo = SqliteCommunityRepository::new(&tx);
        repo.get_post(post_id)?;
        let comment = repo.add_comment(post_id, profile_id, content)?;
        credit_points(&tx, profile_id, COMMENT_REWARD_POINTS, "Community comment")?;
        tx.commit()?;
        Ok(comment)
    }

    /// Oldest first.
    pub fn list_comments(&self, post_id: PostId) -> ServiceResult<Vec<PostComment>> {
        let repo = SqliteCommunityRepository::new(&*self.conn);
        repo.get_post(post_id)?;
        Ok(repo.list_comments(post_id)?)
    }

    pub fn create_team_challenge(
        &mut self,
        profile_id: ProfileId,
        request: &NewTeamChallenge,
    ) -> ServiceResult<TeamChallenge> {
        let request = request.validated()?;
        let tx = begin_immediate(self.conn)?;
        let challenge =
            SqliteTeamChallengeRepository::new(&tx).create_team_challenge(profile_id, &request)?;
        tx.commit()?;
        Ok(challenge)
    }

    /// Challenges still open on `today`.
    pub fn list_team_challenges(&self, today: NaiveDate) -> ServiceResult<Vec<TeamChallenge>> {
        Ok(SqliteTeamChallengeRepository::new(&*self.conn).list_active(today)?)
    }

    /// # Errors
    /// - `NotFound` for unknown challenges.
    /// - `Conflict` when already joined or the challenge has ended.
    pub fn join_team_challenge(
        &mut self,
        profile_id: ProfileId,
        challenge_id: TeamChallengeId,
        today: NaiveDate,
    ) -> ServiceResult<TeamChallengeParticipant> {
        let tx = begin_immediate(self.conn)?;
        let repo = SqliteTeamChallengeRepository::new(&tx);
        let challenge = repo.get_team_challenge(challenge_id)?;
        if challenge.end_date < today {
            return Err(ServiceError::conflict("Team challenge has ended"));
        }
        let participant = repo.join(challenge_id, profile_id)?;
        tx.commit()?;
        Ok(participant)
    }

    /// Clamps progress to `0..=100`; reaching 100 completes the participation
    /// and credits the challenge reward once.
    pub fn update_team_progress(
        &mut self,
        profile_id: ProfileId,
        challenge_id: TeamChallengeId,
        progress: i64,
    ) -> ServiceResult<ParticipationOutcome> {
        let tx = begin_immediate(self.conn)?;
        let repo = SqliteTeamChallengeRepository::new(&tx);
        let challenge = repo.get_team_challenge(challenge_id)?;
        let participant = repo
            .get_participant(challenge_id, profile_id)?
            .ok_or_else(|| ServiceError::NotFound {
                entity: "team_challenge_participant",
                id: profile_id.to_string(),
            })?;
        if participant.status == ParticipantStatus::Completed {
            return Err(ServiceError::conflict("Team challenge already completed"));
        }

        let progress = clamp_progress(progress);
        let mut points_awarded = 0;
        if progress == 100 {
            repo.update_participant(challenge_id, profile_id, 100, ParticipantStatus::Completed)?;
            if challenge.reward_points > 0 {
                let description = format!("Completed team challenge: {}", challenge.title);
                credit_points(&tx, profile_id, challenge.reward_points, &description)?;
                points_awarded = challenge.reward_points;
            }
        } else {
            repo.update_participant(challenge_id, profile_id, progress, ParticipantStatus::Active)?;
        }

        let participant = repo
            .get_participant(challenge_id, profile_id)?
            .ok_or_else(|| ServiceError::NotFound {
                entity: "team_challenge_participant",
                id: profile_id.to_string(),
            })?;
        tx.commit()?;
        Ok(ParticipationOutcome {
            participant,
            points_awarded,
        })
    }
}
