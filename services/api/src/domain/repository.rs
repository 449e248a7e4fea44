#![allow(async_fn_in_trait)]

use bytes::Bytes;
use chrono::{DateTime, Utc};

use moodzic_domain::id::UserId;
use moodzic_domain::method::ApiMethod;
use moodzic_domain::user::UserRole;

use crate::domain::types::{
    EndpointUsage, NewUser, OutboxEvent, RequestRecord, ResetCode, User, UserUsage,
};
use crate::error::ApiError;

/// Repository for user accounts.
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ApiError>;

    /// Current role via the User → Role join. `None` when the user is gone.
    async fn find_role(&self, id: UserId) -> Result<Option<UserRole>, ApiError>;

    /// Insert a new account. A duplicate email is [`ApiError::UserAlreadyExists`].
    async fn create(&self, user: &NewUser) -> Result<(), ApiError>;

    /// Stamp `last_login` (and `updated_at`).
    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), ApiError>;

    /// Store a reset code and its outbox event atomically (same transaction).
    async fn set_reset_code_with_outbox(
        &self,
        id: UserId,
        code: &ResetCode,
        event: &OutboxEvent,
    ) -> Result<(), ApiError>;

    /// Replace the credentials and clear the reset fields, but only while the
    /// stored code still equals `code`. Returns `false` if it was already consumed.
    async fn consume_reset_code(
        &self,
        id: UserId,
        code: &str,
        password_hash: &str,
        salt: &str,
    ) -> Result<bool, ApiError>;

    /// Returns `false` if the user does not exist.
    async fn update_role(&self, id: UserId, role: UserRole) -> Result<bool, ApiError>;

    /// Returns `true` if deleted, `false` if not found.
    async fn delete(&self, id: UserId) -> Result<bool, ApiError>;
}

/// Aggregate reads over the request log.
pub trait UsageRepository: Send + Sync {
    /// Every user with its request count, zero-activity users included.
    async fn users_with_request_counts(&self) -> Result<Vec<UserUsage>, ApiError>;

    /// Request totals for every (method, endpoint) pair with at least one request.
    async fn endpoint_totals(&self) -> Result<Vec<EndpointUsage>, ApiError>;

    async fn endpoint_totals_for_user(&self, id: UserId) -> Result<Vec<EndpointUsage>, ApiError>;

    async fn count_user_calls(
        &self,
        id: UserId,
        method: ApiMethod,
        endpoint: &str,
    ) -> Result<u64, ApiError>;
}

/// Write side of the request log.
pub trait RequestLogRepository: Send + Sync {
    /// Resolve an endpoint row through the Method + Endpoint join.
    async fn find_endpoint_id(
        &self,
        method: ApiMethod,
        endpoint: &str,
    ) -> Result<Option<i32>, ApiError>;

    async fn append(&self, record: &RequestRecord) -> Result<(), ApiError>;
}

/// Port to the external audio-generation model.
pub trait AudioPort: Send + Sync {
    /// Returns the generated WAV bytes. Any failure is [`ApiError::Upstream`].
    async fn generate(&self, prompt: &str) -> Result<Bytes, ApiError>;
}
