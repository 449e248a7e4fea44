use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use moodzic_auth_types::token::{ACCESS_TOKEN_EXP, JwtClaims};

use crate::domain::types::User;
use crate::error::ApiError;

fn now_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

/// Sign an HS256 access token for `user`. Returns the token and its `exp`.
pub fn issue_access_token(user: &User, secret: &str) -> Result<(String, u64), ApiError> {
    let exp = now_secs() + ACCESS_TOKEN_EXP;
    let claims = JwtClaims {
        sub: user.id.to_string(),
        role: user.role,
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow!(e)))?;
    Ok((token, exp))
}
