use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vocassion_core::model::achievement::category_emoji;
use vocassion_core::service::progression_service::{
    ActivityOutcome, LedgerHistory, ProgressSnapshot,
};
use vocassion_core::ProgressionService;

const RECENT_ACHIEVEMENTS_LIMIT: u32 = 5;

#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    #[serde(rename = "type", default)]
    activity: String,
    #[serde(default)]
    points: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAchievement {
    id: Uuid,
    title: String,
    description: String,
    /// Unlock time, epoch milliseconds.
    date: i64,
    emoji: &'static str,
}

pub async fn progress(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<ProgressSnapshot>> {
    let snapshot = state
        .with_profile(user_id, |conn, profile| {
            ProgressionService::new(conn).snapshot(profile.id)
        })
        .await?;
    Ok(Json(snapshot))
}

pub async fn record_activity(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<ActivityRequest>, JsonRejection>,
) -> ApiResult<Json<ActivityOutcome>> {
    let Json(request) = payload?;
    let today = state.today();
    let outcome = state
        .with_profile(user_id, move |conn, profile| {
            ProgressionService::new(conn).record_activity(
                profile.id,
                &request.activity,
                request.points,
                today,
            )
        })
        .await?;
    Ok(Json(outcome))
}

pub async fn ledger(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<LedgerHistory>> {
    let history = state
        .with_profile(user_id, |conn, profile| {
            ProgressionService::new(conn).ledger_history(profile.id)
        })
        .await?;
    Ok(Json(history))
}

pub async fn recent_achievements(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<RecentAchievement>>> {
    let achievements = state
        .with_profile(user_id, |conn, profile| {
            ProgressionService::new(conn).recent_achievements(profile.id, RECENT_ACHIEVEMENTS_LIMIT)
        })
        .await?;

    let recent = achievements
        .into_iter()
        .map(|achievement| RecentAchievement {
            emoji: category_emoji(&achievement.category),
            id: achievement.id,
            title: achievement.title,
            description: achievement.description,
            date: achievement.unlocked_at,
        })
        .collect();
    Ok(Json(recent))
}
