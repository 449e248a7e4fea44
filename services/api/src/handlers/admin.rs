use axum::Json;
use serde::Serialize;

use moodzic_domain::id::UserId;
use moodzic_domain::user::UserRole;

use crate::dispatch::RouteRequest;
use crate::error::ApiError;
use crate::guard::require_admin;
use crate::handlers::MessageResponse;
use crate::state::AppState;
use crate::usecase::admin::{DeleteUserUseCase, ToggleRoleUseCase, parse_user_id};

/// Authenticate, gate on the live Admin role, then parse `:id`.
async fn admin_target(state: &AppState, request: RouteRequest) -> Result<UserId, ApiError> {
    let identity = request.authenticate()?;
    require_admin(&state.user_repo(), &identity).await?;
    let raw = request
        .param("id")
        .ok_or_else(|| ApiError::Validation("missing user id".into()))?;
    parse_user_id(raw)
}

// ── PATCH /updateRole/:id ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UpdateRoleResponse {
    pub message: String,
    pub role: UserRole,
}

pub async fn update_role(
    state: AppState,
    request: RouteRequest,
) -> Result<Json<UpdateRoleResponse>, ApiError> {
    let target = admin_target(&state, request).await?;
    let usecase = ToggleRoleUseCase {
        users: state.user_repo(),
    };
    let role = usecase.execute(target).await?;
    Ok(Json(UpdateRoleResponse {
        message: format!("User role updated to {role}"),
        role,
    }))
}

// ── DELETE /delete/:id ────────────────────────────────────────────────────────

pub async fn delete_user(
    state: AppState,
    request: RouteRequest,
) -> Result<Json<MessageResponse>, ApiError> {
    let target = admin_target(&state, request).await?;
    let usecase = DeleteUserUseCase {
        users: state.user_repo(),
    };
    usecase.execute(target).await?;
    Ok(Json(MessageResponse::new(format!(
        "User {target} deleted successfully"
    ))))
}
