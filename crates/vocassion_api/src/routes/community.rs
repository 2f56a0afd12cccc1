use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use vocassion_core::model::community::{
    CommunityPost, LikeState, NewPost, NewTeamChallenge, PostComment, PostId, PostSummary,
    TeamChallenge, TeamChallengeId, TeamChallengeParticipant,
};
use vocassion_core::service::community_service::ParticipationOutcome;
use vocassion_core::CommunityService;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    progress: i64,
}

/// Newest posts across all members.
pub async fn list_posts(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<PostSummary>>> {
    let posts = state
        .with_profile(user_id, |conn, _profile| CommunityService::new(conn).list_posts())
        .await?;
    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewPost>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CommunityPost>)> {
    let Json(request) = payload?;
    let post = state
        .with_profile(user_id, move |conn, profile| {
            CommunityService::new(conn).create_post(profile.id, &request)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<PostId>, PathRejection>,
) -> ApiResult<Json<LikeState>> {
    let Path(post_id) = path?;
    let like = state
        .with_profile(user_id, move |conn, profile| {
            CommunityService::new(conn).toggle_like(profile.id, post_id)
        })
        .await?;
    Ok(Json(like))
}

pub async fn list_comments(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<PostId>, PathRejection>,
) -> ApiResult<Json<Vec<PostComment>>> {
    let Path(post_id) = path?;
    let comments = state
        .with_profile(user_id, move |conn, _profile| {
            CommunityService::new(conn).list_comments(post_id)
        })
        .await?;
    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<PostId>, PathRejection>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PostComment>)> {
    let Path(post_id) = path?;
    let Json(request) = payload?;
    let comment = state
        .with_profile(user_id, move |conn, profile| {
            CommunityService::new(conn).add_comment(profile.id, post_id, &request.content)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Team challenges whose end date has not passed.
pub async fn list_team_challenges(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<TeamChallenge>>> {
    let today = state.today();
    let challenges = state
        .with_profile(user_id, move |conn, _profile| {
            CommunityService::new(conn).list_team_challenges(today)
        })
        .await?;
    Ok(Json(challenges))
}

pub async fn create_team_challenge(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewTeamChallenge>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TeamChallenge>)> {
    let Json(request) = payload?;
    let challenge = state
        .with_profile(user_id, move |conn, profile| {
            CommunityService::new(conn).create_team_challenge(profile.id, &request)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(challenge)))
}

pub async fn join_team_challenge(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<TeamChallengeId>, PathRejection>,
) -> ApiResult<(StatusCode, Json<TeamChallengeParticipant>)> {
    let Path(challenge_id) = path?;
    let today = state.today();
    let participant = state
        .with_profile(user_id, move |conn, profile| {
            CommunityService::new(conn).join_team_challenge(profile.id, challenge_id, today)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn update_team_progress(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<TeamChallengeId>, PathRejection>,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> ApiResult<Json<ParticipationOutcome>> {
    let Path(challenge_id) = path?;
    let Json(request) = payload?;
    let outcome = state
        .with_profile(user_id, move |conn, profile| {
            CommunityService::new(conn).update_team_progress(
                profile.id,
                challenge_id,
                request.progress,
            )
        })
        .await?;
    Ok(Json(outcome))
}
