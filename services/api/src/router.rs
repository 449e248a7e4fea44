use axum::middleware::map_response_with_state;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use moodzic_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::dispatch::{BoxHandler, Cors, Dispatcher, cors_headers, dispatch};
use crate::handlers::health::{healthz, readyz};
use crate::logger::RequestLogger;
use crate::route::RouteTable;
use crate::state::AppState;

/// Health probes are plain axum routes; everything else goes through the
/// dispatcher, including other methods on the health paths.
pub fn build_router(
    state: AppState,
    routes: RouteTable<BoxHandler>,
    logger: RequestLogger,
    cors: Cors,
) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .method_not_allowed_fallback(dispatch)
        .fallback(dispatch)
        .with_state(Dispatcher::new(routes, state, logger))
        .layer(map_response_with_state(cors, cors_headers))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
