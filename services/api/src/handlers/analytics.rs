use axum::Json;
use serde::Serialize;

use moodzic_domain::id::UserId;
use moodzic_domain::user::UserRole;

use crate::dispatch::RouteRequest;
use crate::domain::types::{EndpointUsage, UserUsage};
use crate::error::ApiError;
use crate::guard::require_admin;
use crate::state::AppState;
use crate::usecase::analytics::{EndpointTotalsUseCase, ListUsersUseCase, UserEndpointsUseCase};

#[derive(Serialize)]
pub struct UserUsageResponse {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
    pub number_of_requests: i64,
}

impl From<UserUsage> for UserUsageResponse {
    fn from(usage: UserUsage) -> Self {
        Self {
            user_id: usage.user_id,
            email: usage.email,
            role: usage.role,
            number_of_requests: usage.number_of_requests,
        }
    }
}

/// Column names match what the dashboard renders verbatim.
#[derive(Serialize)]
pub struct EndpointUsageResponse {
    #[serde(rename = "Method")]
    pub method: String,
    #[serde(rename = "Endpoint")]
    pub endpoint: String,
    #[serde(rename = "NumberOfRequests")]
    pub number_of_requests: i64,
}

impl From<EndpointUsage> for EndpointUsageResponse {
    fn from(usage: EndpointUsage) -> Self {
        Self {
            method: usage.method,
            endpoint: usage.endpoint,
            number_of_requests: usage.number_of_requests,
        }
    }
}

// ── GET /getAllUsersData ──────────────────────────────────────────────────────

pub async fn get_all_users_data(
    state: AppState,
    request: RouteRequest,
) -> Result<Json<Vec<UserUsageResponse>>, ApiError> {
    let identity = request.authenticate()?;
    require_admin(&state.user_repo(), &identity).await?;

    let usecase = ListUsersUseCase {
        usage: state.usage_repo(),
    };
    let rows = usecase.execute().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

// ── GET /getNumberOfRequestsByEndpoint ────────────────────────────────────────

pub async fn get_number_of_requests_by_endpoint(
    state: AppState,
    request: RouteRequest,
) -> Result<Json<Vec<EndpointUsageResponse>>, ApiError> {
    let identity = request.authenticate()?;
    require_admin(&state.user_repo(), &identity).await?;

    let usecase = EndpointTotalsUseCase {
        usage: state.usage_repo(),
    };
    let rows = usecase.execute().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

// ── GET /getEndpointsCalledByUser ─────────────────────────────────────────────

pub async fn get_endpoints_called_by_user(
    state: AppState,
    request: RouteRequest,
) -> Result<Json<Vec<EndpointUsageResponse>>, ApiError> {
    let identity = request.authenticate()?;

    let usecase = UserEndpointsUseCase {
        usage: state.usage_repo(),
    };
    let rows = usecase.execute(identity.user_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
