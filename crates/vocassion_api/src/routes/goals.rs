use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use vocassion_core::model::goal::{
    Goal, GoalDetail, GoalId, Milestone, MilestoneId, NewGoal, NewGoalStep, SubGoal, SubGoalId,
};
use vocassion_core::service::goal_service::{MilestoneOutcome, UnlockOutcome};
use vocassion_core::GoalService;

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    progress: i64,
}

pub async fn list_goals(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<Goal>>> {
    let goals = state
        .with_profile(user_id, |conn, profile| {
            GoalService::new(conn).list_goals(profile.id)
        })
        .await?;
    Ok(Json(goals))
}

pub async fn create_goal(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewGoal>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    let Json(request) = payload?;
    let goal = state
        .with_profile(user_id, move |conn, profile| {
            GoalService::new(conn).create_goal(profile.id, &request)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn goal_detail(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<GoalId>, PathRejection>,
) -> ApiResult<Json<GoalDetail>> {
    let Path(goal_id) = path?;
    let detail = state
        .with_profile(user_id, move |conn, profile| {
            GoalService::new(conn).goal_detail(profile.id, goal_id)
        })
        .await?;
    Ok(Json(detail))
}

pub async fn set_progress(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<GoalId>, PathRejection>,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> ApiResult<Json<Goal>> {
    let Path(goal_id) = path?;
    let Json(request) = payload?;
    let goal = state
        .with_profile(user_id, move |conn, profile| {
            GoalService::new(conn).set_goal_progress(profile.id, goal_id, request.progress)
        })
        .await?;
    Ok(Json(goal))
}

pub async fn unlock_goal(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<GoalId>, PathRejection>,
) -> ApiResult<Json<UnlockOutcome>> {
    let Path(goal_id) = path?;
    let outcome = state
        .with_profile(user_id, move |conn, profile| {
            GoalService::new(conn).unlock_goal(profile.id, goal_id)
        })
        .await?;
    Ok(Json(outcome))
}

pub async fn add_sub_goal(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<GoalId>, PathRejection>,
    payload: Result<Json<NewGoalStep>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubGoal>)> {
    let Path(goal_id) = path?;
    let Json(request) = payload?;
    let sub_goal = state
        .with_profile(user_id, move |conn, profile| {
            GoalService::new(conn).add_sub_goal(profile.id, goal_id, &request)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(sub_goal)))
}

pub async fn add_milestone(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<(GoalId, SubGoalId)>, PathRejection>,
    payload: Result<Json<NewGoalStep>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Milestone>)> {
    let Path((goal_id, sub_goal_id)) = path?;
    let Json(request) = payload?;
    let milestone = state
        .with_profile(user_id, move |conn, profile| {
            GoalService::new(conn).add_milestone(profile.id, goal_id, sub_goal_id, &request)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(milestone)))
}

pub async fn complete_milestone(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<(GoalId, SubGoalId, MilestoneId)>, PathRejection>,
) -> ApiResult<Json<MilestoneOutcome>> {
    let Path((goal_id, sub_goal_id, milestone_id)) = path?;
    let outcome = state
        .with_profile(user_id, move |conn, profile| {
            GoalService::new(conn).complete_milestone(
                profile.id,
                goal_id,
                sub_goal_id,
                milestone_id,
            )
        })
        .await?;
    Ok(Json(outcome))
}
