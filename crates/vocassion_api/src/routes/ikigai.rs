use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use vocassion_core::model::ikigai::{IkigaiEntries, IkigaiMap, IkigaiSection};
use vocassion_core::service::ikigai_service::{AssessmentOutcome, SectionOutcome};
use vocassion_core::{IkigaiService, ServiceError};

/// `null` until the first assessment.
pub async fn get_map(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Option<IkigaiMap>>> {
    let map = state
        .with_profile(user_id, |conn, profile| {
            IkigaiService::new(conn).get_map(profile.id)
        })
        .await?;
    Ok(Json(map))
}

/// Another member's map; 404 until they have submitted one.
pub async fn map_for_user(
    State(state): State<AppState>,
    CurrentUser(_viewer): CurrentUser,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<IkigaiMap>> {
    let Path(user_id) = path?;
    let map = state
        .with_conn(move |conn| IkigaiService::new(conn).map_for_user(&user_id))
        .await?;
    Ok(Json(map))
}

pub async fn submit_assessment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<IkigaiEntries>, JsonRejection>,
) -> ApiResult<Json<AssessmentOutcome>> {
    let Json(entries) = payload?;
    let outcome = state
        .with_profile(user_id, move |conn, profile| {
            IkigaiService::new(conn).submit_assessment(profile.id, &entries)
        })
        .await?;
    Ok(Json(outcome))
}

pub async fn complete_section(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<SectionOutcome>> {
    let Path(section) = path?;
    let section = IkigaiSection::parse(&section).map_err(ServiceError::from)?;
    let outcome = state
        .with_profile(user_id, move |conn, profile| {
            IkigaiService::new(conn).record_section_progress(profile.id, section)
        })
        .await?;
    Ok(Json(outcome))
}
