use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use vocassion_core::model::reflection::{DailyReflection, NewReflection};
use vocassion_core::service::reflection_service::ReflectionOutcome;
use vocassion_core::ReflectionService;

#[derive(Debug, Deserialize)]
pub struct ReflectionQuery {
    /// `YYYY-MM-DD`; defaults to today.
    date: Option<NaiveDate>,
}

pub async fn submit_reflection(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewReflection>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ReflectionOutcome>)> {
    let Json(request) = payload?;
    let today = state.today();
    let outcome = state
        .with_profile(user_id, move |conn, profile| {
            ReflectionService::new(conn).submit_reflection(profile.id, &request, today)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// `null` when nothing was written that day.
pub async fn get_reflection(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<ReflectionQuery>, QueryRejection>,
) -> ApiResult<Json<Option<DailyReflection>>> {
    let Query(query) = query?;
    let date = query.date.unwrap_or_else(|| state.today());
    let reflection = state
        .with_profile(user_id, move |conn, profile| {
            ReflectionService::new(conn).reflection_for(profile.id, date)
        })
        .await?;
    Ok(Json(reflection))
}
