use moodzic_domain::id::UserId;
use moodzic_domain::user::UserRole;

use crate::domain::repository::UserRepository;
use crate::error::ApiError;

/// Parse a `:id` path segment. Unparsable ids are a client error, not a 404.
pub fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse::<UserId>()
        .map_err(|e| ApiError::Validation(format!("invalid user id `{raw}`: {e}")))
}

// ── ToggleRole ───────────────────────────────────────────────────────────────

pub struct ToggleRoleUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ToggleRoleUseCase<U> {
    /// Flip Admin ↔ User. Returns the new role.
    pub async fn execute(&self, target: UserId) -> Result<UserRole, ApiError> {
        let current = self
            .users
            .find_role(target)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        let next = current.toggled();
        if !self.users.update_role(target, next).await? {
            return Err(ApiError::UserNotFound);
        }
        tracing::info!(user_id = %target, role = %next, "user role updated");
        Ok(next)
    }
}

// ── DeleteUser ───────────────────────────────────────────────────────────────

pub struct DeleteUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> DeleteUserUseCase<U> {
    pub async fn execute(&self, target: UserId) -> Result<(), ApiError> {
        if !self.users.delete(target).await? {
            return Err(ApiError::UserNotFound);
        }
        tracing::info!(user_id = %target, "user deleted");
        Ok(())
    }
}
