use moodzic_domain::id::UserId;
use moodzic_domain::method::ApiMethod;

use crate::domain::repository::UsageRepository;
use crate::domain::types::{EndpointUsage, UserUsage};
use crate::error::ApiError;

/// Log key of the per-user breakdown route. Its own rows are left out of its result.
pub const USER_ENDPOINTS_ENDPOINT: &str = "/getEndpointsCalledByUser";

pub struct ListUsersUseCase<R: UsageRepository> {
    pub usage: R,
}

impl<R: UsageRepository> ListUsersUseCase<R> {
    pub async fn execute(&self) -> Result<Vec<UserUsage>, ApiError> {
        self.usage.users_with_request_counts().await
    }
}

pub struct EndpointTotalsUseCase<R: UsageRepository> {
    pub usage: R,
}

impl<R: UsageRepository> EndpointTotalsUseCase<R> {
    pub async fn execute(&self) -> Result<Vec<EndpointUsage>, ApiError> {
        self.usage.endpoint_totals().await
    }
}

pub struct UserEndpointsUseCase<R: UsageRepository> {
    pub usage: R,
}

impl<R: UsageRepository> UserEndpointsUseCase<R> {
    /// Breakdown for one caller. Empty when the caller has no logged requests.
    ///
    /// Calls to this route are logged like any other, but not reported here,
    /// so repeated reads with no other activity return the same counts.
    pub async fn execute(&self, user_id: UserId) -> Result<Vec<EndpointUsage>, ApiError> {
        let mut rows = self.usage.endpoint_totals_for_user(user_id).await?;
        rows.retain(|row| {
            !(row.method == ApiMethod::Get.as_str() && row.endpoint == USER_ENDPOINTS_ENDPOINT)
        });
        Ok(rows)
    }
}
