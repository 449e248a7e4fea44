//! Background request logging.
//!
//! Each routed request produces one [`LogEntry`]. Writing it happens on a task
//! owned by a [`TaskTracker`] so the response is never held up by the log
//! write, and [`RequestLogger::drain`] lets shutdown wait for pending writes.

use sea_orm::DatabaseConnection;
use tokio_util::task::TaskTracker;

use moodzic_domain::id::UserId;
use moodzic_domain::method::ApiMethod;

use crate::domain::repository::RequestLogRepository;
use crate::domain::types::RequestRecord;
use crate::error::ApiError;
use crate::infra::db::DbRequestLogRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub method: ApiMethod,
    /// Base path of the matched route pattern.
    pub endpoint: String,
    pub user_id: Option<UserId>,
    pub status_code: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    Appended,
    UnknownEndpoint,
}

#[derive(Clone)]
pub struct RequestLogger {
    repo: DbRequestLogRepository,
    tracker: TaskTracker,
}

impl RequestLogger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            repo: DbRequestLogRepository { db },
            tracker: TaskTracker::new(),
        }
    }

    /// Queue `entry` for writing. Failures are logged, never returned.
    pub fn record(&self, entry: LogEntry) {
        let repo = self.repo.clone();
        self.tracker.spawn(async move {
            match write_entry(&repo, &entry).await {
                Ok(LogOutcome::Appended) => {}
                Ok(LogOutcome::UnknownEndpoint) => tracing::warn!(
                    method = %entry.method,
                    endpoint = %entry.endpoint,
                    "no endpoint row for request; not logged"
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    method = %entry.method,
                    endpoint = %entry.endpoint,
                    "failed to log request"
                ),
            }
        });
    }

    /// Wait for every queued write, then accept new ones again.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

pub async fn write_entry<R: RequestLogRepository>(
    repo: &R,
    entry: &LogEntry,
) -> Result<LogOutcome, ApiError> {
    let Some(endpoint_id) = repo.find_endpoint_id(entry.method, &entry.endpoint).await? else {
        return Ok(LogOutcome::UnknownEndpoint);
    };
    repo.append(&RequestRecord {
        user_id: entry.user_id,
        endpoint_id,
        status_code: entry.status_code,
    })
    .await?;
    Ok(LogOutcome::Appended)
}
