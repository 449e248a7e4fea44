use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use moodzic_domain::id::UserId;
use moodzic_domain::user::UserRole;

/// Stored account, role already resolved through the Role table.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// PHC-format argon2 hash.
    pub password_hash: String,
    pub salt: String,
    pub role: UserRole,
    pub reset_code: Option<String>,
    pub reset_code_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl User {
    pub fn reset_code_matches(&self, code: &str) -> bool {
        self.reset_code.as_deref() == Some(code)
    }

    pub fn reset_code_expired(&self, now: DateTime<Utc>) -> bool {
        self.reset_code_expiry.is_none_or(|expiry| now > expiry)
    }
}

/// Row to insert on registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub role: UserRole,
}

/// A freshly issued password-reset code.
#[derive(Debug, Clone)]
pub struct ResetCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Outbox event for async delivery (the reset-code email).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub user_id: UserId,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

/// One row of the admin user listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUsage {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
    pub number_of_requests: i64,
}

/// Request count for one (method, endpoint) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUsage {
    pub method: String,
    pub endpoint: String,
    pub number_of_requests: i64,
}

/// Usage record appended by the request logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub user_id: Option<UserId>,
    pub endpoint_id: i32,
    pub status_code: u16,
}

/// Reset code length in digits.
pub const RESET_CODE_LEN: usize = 6;

/// Reset code time-to-live in seconds.
pub const RESET_CODE_TTL_SECS: i64 = 3600;

/// Outbox kind consumed by the mail relay.
pub const PASSWORD_RESET_REQUESTED: &str = "password_reset_requested";

/// Free `/generate-audio` calls per account before responses carry a usage warning.
pub const FREE_AUDIO_CALLS: u64 = 20;

pub const USAGE_WARNING: &str =
    "All free tokens have been used up. Your requests will still be processed.";
