//! `Authorization: Bearer <token>` extraction.

use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use http::HeaderMap;
use http::header::AUTHORIZATION;

use crate::token::{AuthError, TokenInfo, validate_access_token};

/// Outcome of inspecting a request's `Authorization` header.
///
/// The three states are kept apart because callers answer them differently:
/// a missing credential is 401, a rejected one is 403.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BearerCredential {
    Missing,
    Rejected(AuthError),
    Verified(TokenInfo),
}

impl BearerCredential {
    pub fn from_headers(headers: &HeaderMap, secret: &str) -> Self {
        if !headers.contains_key(AUTHORIZATION) {
            return Self::Missing;
        }
        let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() else {
            tracing::debug!("authorization header is not a bearer credential");
            return Self::Rejected(AuthError::Malformed);
        };
        match validate_access_token(bearer.token(), secret) {
            Ok(info) => Self::Verified(info),
            Err(e) => Self::Rejected(e),
        }
    }

    pub fn verified(&self) -> Option<&TokenInfo> {
        match self {
            Self::Verified(info) => Some(info),
            _ => None,
        }
    }
}
