//! HTTP routes, one module per resource.

use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

mod challenges;
mod chat;
mod community;
mod dashboard;
mod gamification;
mod goals;
mod ikigai;
mod profile;
mod reflection;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/profile",
            get(profile::get_profile)
                .post(profile::create_profile)
                .patch(profile::rename_profile),
        )
        .route("/api/profile/:user_id", get(profile::public_profile))
        .route("/api/dashboard", get(dashboard::dashboard))
        .route(
            "/api/ikigai",
            get(ikigai::get_map).post(ikigai::submit_assessment),
        )
        .route("/api/ikigai/sections/:section", post(ikigai::complete_section))
        .route("/api/ikigai/map/:user_id", get(ikigai::map_for_user))
        .route(
            "/api/challenges",
            get(challenges::daily_challenges).post(challenges::post_challenge),
        )
        .route("/api/tasks/daily", get(challenges::daily_tasks))
        .route(
            "/api/gamification",
            get(gamification::progress).post(gamification::record_activity),
        )
        .route("/api/gamification/ledger", get(gamification::ledger))
        .route("/api/achievements/recent", get(gamification::recent_achievements))
        .route("/api/goals", get(goals::list_goals).post(goals::create_goal))
        .route(
            "/api/goals/:id",
            get(goals::goal_detail).put(goals::set_progress),
        )
        .route("/api/goals/:id/unlock", post(goals::unlock_goal))
        .route("/api/goals/:id/subgoals", post(goals::add_sub_goal))
        .route(
            "/api/goals/:id/subgoals/:sub_id/milestones",
            post(goals::add_milestone),
        )
        .route(
            "/api/goals/:id/subgoals/:sub_id/milestones/:milestone_id/complete",
            post(goals::complete_milestone),
        )
        .route(
            "/api/community/posts",
            get(community::list_posts).post(community::create_post),
        )
        .route("/api/community/posts/:id/like", post(community::toggle_like))
        .route(
            "/api/community/posts/:id/comments",
            get(community::list_comments).post(community::add_comment),
        )
        .route(
            "/api/community/team-challenges",
            get(community::list_team_challenges).post(community::create_team_challenge),
        )
        .route(
            "/api/community/team-challenges/:id/join",
            post(community::join_team_challenge),
        )
        .route(
            "/api/community/team-challenges/:id/progress",
            put(community::update_team_progress),
        )
        .route(
            "/api/reflection",
            get(reflection::get_reflection).post(reflection::submit_reflection),
        )
        .route("/api/chat", post(chat::send_message))
        .route("/api/chat/stream", get(chat::stream_messages))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": vocassion_core::core_version(),
    }))
}
