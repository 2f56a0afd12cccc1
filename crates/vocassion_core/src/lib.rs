//! Core domain logic for Vocassion.
//! This crate is the single source of truth for progression invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{active_logging, init_logging, LogLevel, LoggingConfig, LoggingError};
pub use model::ValidationError;
pub use repo::{RepoError, RepoResult};
pub use service::challenge_service::ChallengeService;
pub use service::community_service::CommunityService;
pub use service::goal_service::GoalService;
pub use service::ikigai_service::IkigaiService;
pub use service::profile_service::{require_profile, ProfileService};
pub use service::progression_service::ProgressionService;
pub use service::reflection_service::ReflectionService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
