//! Per-request entry point for every API route.
//!
//! The dispatcher is installed as the axum fallback, and as the fallback for
//! methods an axum route does not handle. For each request it resolves a route
//! from the [`RouteTable`], decodes the bearer credential, runs the handler
//! with panics caught and hands the outcome to the request logger.
//! [`cors_headers`] stamps CORS headers on every response the router produces.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::anyhow;
use axum::Json;
use axum::extract::{FromRef, FromRequest, Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, InvalidHeaderValue,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;

use moodzic_auth_types::bearer::BearerCredential;
use moodzic_domain::method::ApiMethod;

use crate::error::ApiError;
use crate::guard::{self, Identity};
use crate::logger::{LogEntry, RequestLogger};
use crate::route::{PathParams, RouteMatch, RouteTable};
use crate::state::AppState;

pub const X_MOODZIC_USAGE_WARNING: &str = "x-moodzic-usage-warning";

const ALLOW_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const EXPOSE_HEADERS: &str = "Content-Disposition, x-moodzic-usage-warning";

// ── Handlers ──────────────────────────────────────────────────────────────────

pub type HandlerFuture = BoxFuture<'static, Result<Response, ApiError>>;

/// Type-erased route handler stored in the route table.
pub type BoxHandler = Arc<dyn Fn(AppState, RouteRequest) -> HandlerFuture + Send + Sync>;

/// Erase an `async fn(AppState, RouteRequest) -> Result<impl IntoResponse, ApiError>`.
pub fn handler<F, Fut, R>(f: F) -> BoxHandler
where
    F: Fn(AppState, RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ApiError>> + Send + 'static,
    R: IntoResponse,
{
    Arc::new(move |state, request| {
        let fut = f(state, request);
        async move { fut.await.map(IntoResponse::into_response) }.boxed()
    })
}

/// What a handler receives: the raw request, bound path parameters and the
/// already-decoded bearer credential.
pub struct RouteRequest {
    pub request: Request,
    pub params: PathParams,
    pub credential: BearerCredential,
}

impl RouteRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn authenticate(&self) -> Result<Identity, ApiError> {
        guard::authenticate(&self.credential)
    }

    /// Consume the body as JSON. Malformed or incomplete bodies are [`ApiError::Validation`].
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let Json(value) = Json::<T>::from_request(self.request, &())
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(value)
    }
}

// ── CORS ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Cors {
    allow_origin: HeaderValue,
}

impl Cors {
    pub fn new(allow_origin: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            allow_origin: HeaderValue::from_str(allow_origin)?,
        })
    }

    fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(EXPOSE_HEADERS),
        );
    }
}

/// Response mapper for `axum::middleware::map_response_with_state`.
pub async fn cors_headers(State(cors): State<Cors>, mut response: Response) -> Response {
    cors.apply(response.headers_mut());
    response
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Dispatcher {
    routes: Arc<RouteTable<BoxHandler>>,
    state: AppState,
    logger: RequestLogger,
}

impl FromRef<Dispatcher> for AppState {
    fn from_ref(dispatcher: &Dispatcher) -> Self {
        dispatcher.state.clone()
    }
}

impl Dispatcher {
    pub fn new(
        routes: RouteTable<BoxHandler>,
        state: AppState,
        logger: RequestLogger,
    ) -> Self {
        Self {
            routes: Arc::new(routes),
            state,
            logger,
        }
    }

    async fn handle(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();

        let (route, params) = match self.routes.find(&method, &path) {
            RouteMatch::Found { route, params } => (route, params),
            RouteMatch::NotFound | RouteMatch::MethodNotRecognized => {
                tracing::debug!(%method, %path, "no route");
                return ApiError::RouteNotFound.into_response();
            }
        };

        let credential = BearerCredential::from_headers(request.headers(), &self.state.jwt_secret);
        let caller = credential.verified().map(|info| info.user_id);

        let fut = (route.handler)(
            self.state.clone(),
            RouteRequest {
                request,
                params,
                credential,
            },
        );
        let response = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => e.into_response(),
            Err(panic) => {
                tracing::error!(
                    %method,
                    %path,
                    panic = panic_message(panic.as_ref()),
                    "handler panicked"
                );
                ApiError::Internal(anyhow!("handler panicked")).into_response()
            }
        };

        // Preflight routes are wildcards, so they have no base path and are never logged.
        if let Some(endpoint) = route.pattern.base_path() {
            match method.as_str().parse::<ApiMethod>() {
                Ok(api_method) => self.logger.record(LogEntry {
                    method: api_method,
                    endpoint,
                    user_id: caller,
                    status_code: response.status().as_u16(),
                }),
                Err(()) => tracing::debug!(%method, "method is not tracked"),
            }
        }

        response
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// axum fallback: every request not claimed by an axum route lands here.
pub async fn dispatch(State(dispatcher): State<Dispatcher>, request: Request) -> Response {
    dispatcher.handle(request).await
}

/// `OPTIONS *`: CORS headers are added by [`cors_headers`]; the body stays empty.
pub async fn preflight(_state: AppState, _request: RouteRequest) -> Result<StatusCode, ApiError> {
    Ok(StatusCode::NO_CONTENT)
}
