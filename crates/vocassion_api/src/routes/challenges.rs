use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use vocassion_core::model::challenge::{Challenge, DailyTask, NewChallenge};
use vocassion_core::ChallengeService;

/// `POST /api/challenges` either completes an existing challenge or creates
/// a custom one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ChallengeRequest {
    Complete(CompleteChallenge),
    Create(NewChallenge),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteChallenge {
    challenge_id: Uuid,
}

/// Today's challenges, generating the daily set on first access.
pub async fn daily_challenges(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<Challenge>>> {
    let today = state.today();
    let challenges = state
        .with_profile(user_id, move |conn, profile| {
            ChallengeService::new(conn).daily_challenges(profile.id, today)
        })
        .await?;
    Ok(Json(challenges))
}

pub async fn post_challenge(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<ChallengeRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let today = state.today();
    match request {
        ChallengeRequest::Complete(CompleteChallenge { challenge_id }) => {
            let outcome = state
                .with_profile(user_id, move |conn, profile| {
                    ChallengeService::new(conn).complete_challenge(profile.id, challenge_id, today)
                })
                .await?;
            Ok(Json(outcome).into_response())
        }
        ChallengeRequest::Create(request) => {
            let challenge = state
                .with_profile(user_id, move |conn, profile| {
                    ChallengeService::new(conn).create_challenge(profile.id, &request, today)
                })
                .await?;
            Ok((StatusCode::CREATED, Json(challenge)).into_response())
        }
    }
}

pub async fn daily_tasks(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<DailyTask>>> {
    let today = state.today();
    let tasks = state
        .with_profile(user_id, move |conn, profile| {
            ChallengeService::new(conn).daily_tasks(profile.id, today)
        })
        .await?;
    Ok(Json(tasks))
}
