use axum::http::Method;

use crate::dispatch::{BoxHandler, handler, preflight};
use crate::handlers::{account, admin, analytics, audio};
use crate::route::{PatternError, RouteTable};

/// The API surface. Registration order is match order within each method.
pub fn api_routes() -> Result<RouteTable<BoxHandler>, PatternError> {
    RouteTable::new()
        .route(Method::OPTIONS, "*", handler(preflight))?
        // Account
        .route(Method::POST, "/register", handler(account::register))?
        .route(Method::POST, "/login", handler(account::login))?
        .route(
            Method::POST,
            "/requestPasswordReset",
            handler(account::request_password_reset),
        )?
        .route(Method::POST, "/resetPassword", handler(account::reset_password))?
        .route(Method::GET, "/verify", handler(account::verify))?
        // Audio
        .route(Method::POST, "/generate-audio", handler(audio::generate_audio))?
        // Analytics
        .route(
            Method::GET,
            "/getAllUsersData",
            handler(analytics::get_all_users_data),
        )?
        .route(
            Method::GET,
            "/getNumberOfRequestsByEndpoint",
            handler(analytics::get_number_of_requests_by_endpoint),
        )?
        .route(
            Method::GET,
            "/getEndpointsCalledByUser",
            handler(analytics::get_endpoints_called_by_user),
        )?
        // Admin
        .route(Method::PATCH, "/updateRole/:id", handler(admin::update_role))?
        .route(Method::DELETE, "/delete/:id", handler(admin::delete_user))
}
