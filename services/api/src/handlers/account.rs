use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};

use moodzic_domain::id::UserId;
use moodzic_domain::user::UserRole;

use crate::dispatch::RouteRequest;
use crate::error::ApiError;
use crate::handlers::MessageResponse;
use crate::state::AppState;
use crate::usecase::account::{
    LoginInput, LoginUseCase, RegisterInput, RegisterUseCase, RequestPasswordResetUseCase,
    ResetPasswordInput, ResetPasswordUseCase, VerifyUseCase,
};

// ── POST /register ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    state: AppState,
    request: RouteRequest,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let body: CredentialsRequest = request.json().await?;
    let usecase = RegisterUseCase {
        users: state.user_repo(),
    };
    let user_id = usecase
        .execute(RegisterInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    tracing::info!(%user_id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

// ── POST /login ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub role: UserRole,
}

pub async fn login(state: AppState, request: RouteRequest) -> Result<Json<LoginResponse>, ApiError> {
    let body: CredentialsRequest = request.json().await?;
    let usecase = LoginUseCase {
        users: state.user_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(Json(LoginResponse {
        token: out.access_token,
        email: out.user.email,
        role: out.user.role,
    }))
}

// ── POST /requestPasswordReset ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

pub async fn request_password_reset(
    state: AppState,
    request: RouteRequest,
) -> Result<Json<MessageResponse>, ApiError> {
    let body: PasswordResetRequest = request.json().await?;
    let usecase = RequestPasswordResetUseCase {
        users: state.user_repo(),
    };
    usecase.execute(&body.email).await?;
    Ok(Json(MessageResponse::new("Password reset code has been sent")))
}

// ── POST /resetPassword ───────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub reset_code: String,
    pub new_password: String,
}

pub async fn reset_password(
    state: AppState,
    request: RouteRequest,
) -> Result<Json<MessageResponse>, ApiError> {
    let body: ResetPasswordRequest = request.json().await?;
    let usecase = ResetPasswordUseCase {
        users: state.user_repo(),
    };
    usecase
        .execute(ResetPasswordInput {
            email: body.email,
            reset_code: body.reset_code,
            new_password: body.new_password,
        })
        .await?;
    Ok(Json(MessageResponse::new(
        "Password has been reset successfully",
    )))
}

// ── GET /verify ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct VerifyResponse {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
}

pub async fn verify(state: AppState, request: RouteRequest) -> Result<Json<VerifyResponse>, ApiError> {
    let identity = request.authenticate()?;
    let usecase = VerifyUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(identity.user_id).await?;
    Ok(Json(VerifyResponse {
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}
