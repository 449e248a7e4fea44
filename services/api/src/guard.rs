use moodzic_auth_types::bearer::BearerCredential;
use moodzic_domain::id::UserId;
use moodzic_domain::user::UserRole;

use crate::domain::repository::UserRepository;
use crate::error::ApiError;

/// Caller identity taken from a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    /// Role claimed by the token. Informational; see [`require_admin`].
    pub token_role: UserRole,
}

pub fn authenticate(credential: &BearerCredential) -> Result<Identity, ApiError> {
    match credential {
        BearerCredential::Missing => Err(ApiError::Unauthenticated),
        BearerCredential::Rejected(reason) => {
            tracing::debug!(%reason, "bearer token rejected");
            Err(ApiError::InvalidToken)
        }
        BearerCredential::Verified(info) => Ok(Identity {
            user_id: info.user_id,
            token_role: info.user_role,
        }),
    }
}

/// Admin gate. The role is read from the store on every call, so a demoted
/// admin's still-valid token stops working immediately.
pub async fn require_admin<U: UserRepository>(
    users: &U,
    identity: &Identity,
) -> Result<(), ApiError> {
    match users.find_role(identity.user_id).await? {
        Some(role) if role.is_admin() => Ok(()),
        _ => Err(ApiError::Forbidden),
    }
}
