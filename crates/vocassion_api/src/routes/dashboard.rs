use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use vocassion_core::service::progression_service::Dashboard;
use vocassion_core::ProgressionService;

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Dashboard>> {
    let dashboard = state
        .with_profile(user_id, |conn, profile| {
            ProgressionService::new(conn).dashboard(profile)
        })
        .await?;
    Ok(Json(dashboard))
}
