use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use vocassion_core::model::profile::{NewProfile, Profile};
use vocassion_core::service::profile_service::PublicProfile;
use vocassion_core::ProfileService;

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    name: String,
}

pub async fn create_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewProfile>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Profile>)> {
    let Json(request) = payload?;
    let profile = state
        .with_conn(move |conn| ProfileService::new(conn).create_profile(&user_id, &request))
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Profile>> {
    let profile = state
        .with_conn(move |conn| ProfileService::new(conn).profile_for_user(&user_id))
        .await?;
    Ok(Json(profile))
}

pub async fn rename_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> ApiResult<Json<Profile>> {
    let Json(request) = payload?;
    let profile = state
        .with_profile(user_id, move |conn, profile| {
            ProfileService::new(conn).rename_profile(profile.id, &request.name)
        })
        .await?;
    Ok(Json(profile))
}

/// Another member's profile with their ikigai map; email stays private.
pub async fn public_profile(
    State(state): State<AppState>,
    CurrentUser(_viewer): CurrentUser,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<PublicProfile>> {
    let Path(user_id) = path?;
    let profile = state
        .with_conn(move |conn| ProfileService::new(conn).public_profile(&user_id))
        .await?;
    Ok(Json(profile))
}
