use chrono::{Duration, Utc};
use rand::RngExt;
use serde_json::json;
use uuid::Uuid;

use moodzic_domain::id::UserId;
use moodzic_domain::user::UserRole;

use crate::domain::repository::UserRepository;
use crate::domain::types::{
    NewUser, OutboxEvent, PASSWORD_RESET_REQUESTED, RESET_CODE_LEN, RESET_CODE_TTL_SECS,
    ResetCode, User,
};
use crate::error::ApiError;
use crate::usecase::credential::{generate_salt, hash_password, verify_password};
use crate::usecase::token::issue_access_token;

fn require_present(fields: &[(&str, &str)]) -> Result<(), ApiError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(format!("required: {}", missing.join(", "))))
    }
}

fn generate_reset_code() -> String {
    let upper = 10u32.pow(RESET_CODE_LEN as u32);
    let n = rand::rng().random_range(0..upper);
    format!("{n:0width$}", width = RESET_CODE_LEN)
}

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

pub struct RegisterUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> RegisterUseCase<U> {
    pub async fn execute(&self, input: RegisterInput) -> Result<UserId, ApiError> {
        require_present(&[
            ("email", input.email.as_str()),
            ("password", input.password.as_str()),
        ])?;

        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(ApiError::UserAlreadyExists);
        }

        let salt = generate_salt();
        let user = NewUser {
            id: UserId::generate(),
            email: input.email,
            password_hash: hash_password(&input.password, &salt)?,
            salt,
            role: UserRole::DEFAULT,
        };
        // A concurrent registration can still win the race; the unique index
        // turns that into UserAlreadyExists as well.
        self.users.create(&user).await?;
        Ok(user.id)
    }
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub access_token: String,
    pub access_token_exp: u64,
}

pub struct LoginUseCase<U: UserRepository> {
    pub users: U,
    pub jwt_secret: String,
}

impl<U: UserRepository> LoginUseCase<U> {
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, ApiError> {
        require_present(&[
            ("email", input.email.as_str()),
            ("password", input.password.as_str()),
        ])?;

        let user = self
            .users
            .find_by_email(&input.email)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }

        self.users.record_login(user.id, Utc::now()).await?;

        let (access_token, access_token_exp) = issue_access_token(&user, &self.jwt_secret)?;
        Ok(LoginOutput {
            user,
            access_token,
            access_token_exp,
        })
    }
}

// ── RequestPasswordReset ─────────────────────────────────────────────────────

pub struct RequestPasswordResetUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> RequestPasswordResetUseCase<U> {
    pub async fn execute(&self, email: &str) -> Result<(), ApiError> {
        require_present(&[("email", email)])?;

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        let code = ResetCode {
            code: generate_reset_code(),
            expires_at: Utc::now() + Duration::seconds(RESET_CODE_TTL_SECS),
        };

        let event_id = Uuid::now_v7();
        let event = OutboxEvent {
            id: event_id,
            user_id: user.id,
            kind: PASSWORD_RESET_REQUESTED.to_owned(),
            payload: json!({
                "email": user.email,
                "reset_code": code.code,
                "expires_at": code.expires_at,
            }),
            idempotency_key: format!("{PASSWORD_RESET_REQUESTED}:{event_id}"),
        };

        self.users
            .set_reset_code_with_outbox(user.id, &code, &event)
            .await?;
        tracing::info!(user_id = %user.id, "password reset requested");
        Ok(())
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordInput {
    pub email: String,
    pub reset_code: String,
    pub new_password: String,
}

pub struct ResetPasswordUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ResetPasswordUseCase<U> {
    pub async fn execute(&self, input: ResetPasswordInput) -> Result<(), ApiError> {
        require_present(&[
            ("email", input.email.as_str()),
            ("resetCode", input.reset_code.as_str()),
            ("newPassword", input.new_password.as_str()),
        ])?;

        let user = self
            .users
            .find_by_email(&input.email)
            .await?
            .ok_or(ApiError::InvalidResetCode)?;

        if !user.reset_code_matches(&input.reset_code) {
            return Err(ApiError::InvalidResetCode);
        }
        if user.reset_code_expired(Utc::now()) {
            return Err(ApiError::ResetCodeExpired);
        }

        let salt = generate_salt();
        let password_hash = hash_password(&input.new_password, &salt)?;

        // Lost the race to a concurrent reset with the same code.
        let consumed = self
            .users
            .consume_reset_code(user.id, &input.reset_code, &password_hash, &salt)
            .await?;
        if !consumed {
            return Err(ApiError::InvalidResetCode);
        }
        Ok(())
    }
}

// ── Verify ───────────────────────────────────────────────────────────────────

pub struct VerifyUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> VerifyUseCase<U> {
    /// Current profile of the token's subject.
    pub async fn execute(&self, user_id: UserId) -> Result<User, ApiError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}
