use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// API error variants. Every variant renders as `{kind, message, error?}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request")]
    Validation(String),
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("invalid reset code or user not found")]
    InvalidResetCode,
    #[error("reset code has expired")]
    ResetCodeExpired,
    #[error("unauthorized")]
    Unauthenticated,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("forbidden")]
    InvalidToken,
    #[error("forbidden")]
    Forbidden,
    #[error("user not found")]
    UserNotFound,
    #[error("route not found")]
    RouteNotFound,
    #[error("audio generation failed")]
    Upstream(String),
    #[error("error processing request")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::InvalidResetCode => "INVALID_RESET_CODE",
            Self::ResetCodeExpired => "RESET_CODE_EXPIRED",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::Upstream(_) => "UPSTREAM_FAILURE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::UserAlreadyExists
            | Self::InvalidResetCode
            | Self::ResetCodeExpired => StatusCode::BAD_REQUEST,
            Self::Unauthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InvalidToken | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UserNotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing detail, only for variants whose cause the caller can act on.
    fn detail(&self) -> Option<&str> {
        match self {
            Self::Validation(detail) | Self::Upstream(detail) => Some(detail),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Only 500s are logged here; TraceLayer already records method/uri/status.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        if let Self::Upstream(ref detail) = self {
            tracing::warn!(%detail, kind = "UPSTREAM_FAILURE", "upstream call failed");
        }
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Some(detail) = self.detail() {
            body["error"] = serde_json::Value::from(detail);
        }
        (status, axum::Json(body)).into_response()
    }
}
