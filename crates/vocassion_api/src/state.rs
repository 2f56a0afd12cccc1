//! Shared handler state.
//!
//! # Invariants
//! - One SQLite connection per process, guarded by a mutex; services run on
//!   the blocking pool while holding it.
//! - A panicking service poisons the mutex but not the connection: its open
//!   transaction rolls back while unwinding, so later requests reuse the guard.

use crate::error::{ApiError, ApiResult};
use crate::realtime::Broadcaster;
use chrono::NaiveDate;
use log::warn;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};
use vocassion_core::model::profile::Profile;
use vocassion_core::{require_profile, Clock, ServiceResult};

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl AppState {
    pub fn new(conn: Connection, clock: Arc<dyn Clock>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            clock,
            broadcaster,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn broadcaster(&self) -> &dyn Broadcaster {
        self.broadcaster.as_ref()
    }

    /// Runs `f` with exclusive access to the connection.
    pub async fn with_conn<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Connection) -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
                warn!("event=db_lock module=api status=recovered reason=poisoned");
                db.clear_poison();
                poisoned.into_inner()
            });
            f(&mut conn).map_err(ApiError::from)
        })
        .await
        .map_err(|err| ApiError::Internal(format!("database task failed: {err}")))?
    }

    /// Like [`AppState::with_conn`], resolving the caller's profile first.
    pub async fn with_profile<T, F>(&self, user_id: String, f: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Connection, Profile) -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.with_conn(move |conn| {
            let profile = require_profile(conn, &user_id)?;
            f(conn, profile)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::AppState;
    use crate::error::ApiError;
    use crate::realtime::ChannelBroadcaster;
    use chrono::NaiveDate;
    use rusqlite::Connection;
    use std::sync::Arc;
    use vocassion_core::{open_db_in_memory, FixedClock, ServiceResult};

    fn state() -> AppState {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        AppState::new(
            open_db_in_memory().unwrap(),
            Arc::new(FixedClock(today)),
            Arc::new(ChannelBroadcaster::default()),
        )
    }

    #[tokio::test]
    async fn panicking_service_does_not_wedge_the_connection() {
        let state = state();

        let err = state
            .with_conn(|conn: &mut Connection| -> ServiceResult<()> {
                let tx = conn.transaction()?;
                tx.execute_batch("CREATE TABLE scratch (id INTEGER);")?;
                panic!("service blew up");
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));

        let leftovers: i64 = state
            .with_conn(|conn: &mut Connection| -> ServiceResult<i64> {
                let tx = conn.transaction()?;
                let count = tx.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE name = 'scratch';",
                    [],
                    |row| row.get(0),
                )?;
                tx.commit()?;
                Ok(count)
            })
            .await
            .unwrap();
        assert_eq!(leftovers, 0);
    }
}
