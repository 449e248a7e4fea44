use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use moodzic_api::dispatch::{RouteRequest, handler};
use moodzic_api::error::ApiError;
use moodzic_api::routes::api_routes;
use moodzic_api::state::AppState;
use moodzic_domain::id::UserId;

use crate::helpers::{TEST_PASSWORD, TestApp, TestResponse};

fn assert_cors(response: &TestResponse) {
    let headers = &response.headers;
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET, POST, PATCH, DELETE, OPTIONS"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type, Authorization"
    );
}

fn assert_error(response: &TestResponse, status: StatusCode, kind: &str) {
    assert_eq!(response.status, status, "body: {:?}", response.body);
    assert_eq!(response.json()["kind"], kind);
    assert_cors(response);
}

// ── Dispatcher ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_answer_preflight_with_empty_204() {
    let app = TestApp::new().await;
    let response = app.call(Method::OPTIONS, "/anything/at/all", None, None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());
    assert_cors(&response);
}

#[tokio::test]
async fn should_return_404_with_cors_for_unknown_route() {
    let app = TestApp::new().await;
    let response = app.call(Method::GET, "/nope", None, None).await;
    assert_error(&response, StatusCode::NOT_FOUND, "ROUTE_NOT_FOUND");

    // Known path, wrong method.
    let response = app.call(Method::GET, "/login", None, None).await;
    assert_error(&response, StatusCode::NOT_FOUND, "ROUTE_NOT_FOUND");

    // Logout is client-side; there is no route for it.
    let response = app.call(Method::POST, "/logout", None, None).await;
    assert_error(&response, StatusCode::NOT_FOUND, "ROUTE_NOT_FOUND");
}

async fn explode(_state: AppState, _request: RouteRequest) -> Result<StatusCode, ApiError> {
    panic!("boom")
}

#[tokio::test]
async fn should_turn_handler_panic_into_500_and_keep_serving() {
    let routes = api_routes()
        .unwrap()
        .route(Method::GET, "/explode", handler(explode))
        .unwrap();
    let app = TestApp::with_routes(routes).await;

    let response = app.call(Method::GET, "/explode", None, None).await;
    assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL");
    assert!(response.json().get("error").is_none());

    let response = app.call(Method::OPTIONS, "/explode", None, None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn should_serve_health_probes_outside_dispatcher() {
    let app = TestApp::new().await;
    let response = app.call(Method::GET, "/healthz", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_cors(&response);
    assert_eq!(app.call(Method::GET, "/readyz", None, None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn should_route_other_methods_on_health_paths_through_dispatcher() {
    let app = TestApp::new().await;

    let response = app.call(Method::OPTIONS, "/healthz", None, None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());
    assert_cors(&response);

    let response = app.call(Method::OPTIONS, "/readyz", None, None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_cors(&response);

    let response = app.call(Method::POST, "/healthz", None, None).await;
    assert_error(&response, StatusCode::NOT_FOUND, "ROUTE_NOT_FOUND");
}

// ── Account ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_register_login_and_verify() {
    let app = TestApp::new().await;

    let response = app.register("u@moodzic.dev", "pw-1").await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["message"], "User registered successfully");
    assert_cors(&response);

    let response = app.register("u@moodzic.dev", "pw-2").await;
    assert_error(&response, StatusCode::BAD_REQUEST, "USER_ALREADY_EXISTS");

    let response = app.login("u@moodzic.dev", "pw-1").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["email"], "u@moodzic.dev");
    assert_eq!(body["role"], "User");
    let token = body["token"].as_str().unwrap().to_owned();

    let response = app.call(Method::GET, "/verify", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["email"], "u@moodzic.dev");
}

#[tokio::test]
async fn should_reject_bad_logins() {
    let app = TestApp::new().await;
    app.user_token("u@moodzic.dev").await;

    let response = app.login("u@moodzic.dev", "wrong").await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS");

    let response = app.login("ghost@moodzic.dev", "pw").await;
    assert_error(&response, StatusCode::NOT_FOUND, "USER_NOT_FOUND");
}

#[tokio::test]
async fn should_reject_malformed_body_as_validation() {
    let app = TestApp::new().await;
    let response = app
        .call(Method::POST, "/register", None, Some(json!({ "email": "x@y.z" })))
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "VALIDATION");
    assert!(response.json()["error"].is_string());
}

#[tokio::test]
async fn should_distinguish_missing_and_invalid_tokens() {
    let app = TestApp::new().await;

    let response = app.call(Method::GET, "/verify", None, None).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED");

    let response = app.call(Method::GET, "/verify", Some("not-a-jwt"), None).await;
    assert_error(&response, StatusCode::FORBIDDEN, "INVALID_TOKEN");
}

#[tokio::test]
async fn should_run_password_reset_flow() {
    let app = TestApp::new().await;
    app.user_token("u@moodzic.dev").await;

    let response = app
        .call(
            Method::POST,
            "/requestPasswordReset",
            None,
            Some(json!({ "email": "u@moodzic.dev" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "Password reset code has been sent");

    // No mailer in tests; read the code the outbox event carries.
    use moodzic_api_schema::outbox_events;
    use sea_orm::EntityTrait;
    let events = outbox_events::Entity::find().all(&app.db).await.unwrap();
    assert_eq!(events.len(), 1);
    let code = events[0].payload["reset_code"].as_str().unwrap().to_owned();

    let reset = |code: String| {
        json!({ "email": "u@moodzic.dev", "resetCode": code, "newPassword": "fresh-pw" })
    };

    let response = app
        .call(Method::POST, "/resetPassword", None, Some(reset("999999x".into())))
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "INVALID_RESET_CODE");

    let response = app
        .call(Method::POST, "/resetPassword", None, Some(reset(code.clone())))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json()["message"],
        "Password has been reset successfully"
    );

    let response = app
        .call(Method::POST, "/resetPassword", None, Some(reset(code)))
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "INVALID_RESET_CODE");

    assert_eq!(app.login("u@moodzic.dev", TEST_PASSWORD).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("u@moodzic.dev", "fresh-pw").await.status, StatusCode::OK);
}

// ── Admin ────────────────────────────────────────────────────────────────────

async fn user_id_of(app: &TestApp, token: &str) -> String {
    let response = app.call(Method::GET, "/verify", Some(token), None).await;
    response.json()["user_id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn should_toggle_role_and_delete_as_admin() {
    let app = TestApp::new().await;
    let admin = app.admin_token("admin@moodzic.dev").await;
    let user = app.user_token("u@moodzic.dev").await;
    let user_id = user_id_of(&app, &user).await;

    let response = app
        .call(Method::PATCH, &format!("/updateRole/{user_id}"), Some(&admin), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "User role updated to Admin");
    assert_eq!(response.json()["role"], "Admin");

    // The promoted user's old token still says User, but the live role wins.
    let response = app.call(Method::GET, "/getAllUsersData", Some(&user), None).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .call(Method::PATCH, &format!("/updateRole/{user_id}"), Some(&admin), None)
        .await;
    assert_eq!(response.json()["role"], "User");

    let response = app
        .call(Method::DELETE, &format!("/delete/{user_id}"), Some(&admin), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json()["message"],
        format!("User {user_id} deleted successfully")
    );

    let response = app
        .call(Method::DELETE, &format!("/delete/{user_id}"), Some(&admin), None)
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "USER_NOT_FOUND");

    assert_eq!(app.login("u@moodzic.dev", TEST_PASSWORD).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_forbid_admin_routes_to_plain_users() {
    let app = TestApp::new().await;
    let user = app.user_token("u@moodzic.dev").await;
    let user_id = user_id_of(&app, &user).await;

    for (method, uri) in [
        (Method::GET, "/getAllUsersData".to_owned()),
        (Method::GET, "/getNumberOfRequestsByEndpoint".to_owned()),
        (Method::PATCH, format!("/updateRole/{user_id}")),
        (Method::DELETE, format!("/delete/{user_id}")),
        // Forbidden before the id is even looked at.
        (Method::DELETE, "/delete/not-a-uuid".to_owned()),
    ] {
        let response = app.call(method, &uri, Some(&user), None).await;
        assert_error(&response, StatusCode::FORBIDDEN, "FORBIDDEN");
    }

    let response = app.call(Method::PATCH, &format!("/updateRole/{user_id}"), None, None).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED");
}

#[tokio::test]
async fn should_validate_target_ids() {
    let app = TestApp::new().await;
    let admin = app.admin_token("admin@moodzic.dev").await;

    let response = app.call(Method::DELETE, "/delete/42", Some(&admin), None).await;
    assert_error(&response, StatusCode::BAD_REQUEST, "VALIDATION");

    let missing = UserId::generate();
    let response = app
        .call(Method::PATCH, &format!("/updateRole/{missing}"), Some(&admin), None)
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "USER_NOT_FOUND");

    // Empty id segment never binds the parameter.
    let response = app.call(Method::DELETE, "/delete/", Some(&admin), None).await;
    assert_error(&response, StatusCode::NOT_FOUND, "ROUTE_NOT_FOUND");
}

// ── Request log and analytics ────────────────────────────────────────────────

fn count_for(rows: &Value, method: &str, endpoint: &str) -> i64 {
    rows.as_array()
        .unwrap()
        .iter()
        .find(|row| row["Method"] == method && row["Endpoint"] == endpoint)
        .map(|row| row["NumberOfRequests"].as_i64().unwrap())
        .unwrap_or(0)
}

#[tokio::test]
async fn should_log_routed_requests_and_report_them() {
    let app = TestApp::new().await;
    let admin = app.admin_token("admin@moodzic.dev").await;
    let user = app.user_token("u@moodzic.dev").await;
    let user_id = user_id_of(&app, &user).await;

    app.call(Method::GET, "/verify", Some(&user), None).await;
    app.call(Method::OPTIONS, "/verify", None, None).await;
    app.call(Method::GET, "/nope", Some(&user), None).await;
    app.call(Method::PATCH, &format!("/updateRole/{user_id}"), Some(&user), None)
        .await;
    app.drain_log().await;

    let response = app
        .call(Method::GET, "/getNumberOfRequestsByEndpoint", Some(&admin), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let totals = response.json();
    // register(1) + logins(2) from the helpers.
    assert_eq!(count_for(&totals, "POST", "/register"), 1);
    assert_eq!(count_for(&totals, "POST", "/login"), 2);
    assert_eq!(count_for(&totals, "GET", "/verify"), 2);
    // Logged under the pattern's base path, even when rejected.
    assert_eq!(count_for(&totals, "PATCH", "/updateRole"), 1);
    assert!(
        totals
            .as_array()
            .unwrap()
            .iter()
            .all(|row| row["Endpoint"] != "/nope" && row["Method"] != "OPTIONS")
    );

    let response = app
        .call(Method::GET, "/getEndpointsCalledByUser", Some(&user), None)
        .await;
    let mine = response.json();
    assert_eq!(count_for(&mine, "GET", "/verify"), 2);
    assert_eq!(count_for(&mine, "POST", "/login"), 0);

    app.drain_log().await;
    let response = app.call(Method::GET, "/getAllUsersData", Some(&admin), None).await;
    let users = response.json();
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    let row = users.iter().find(|u| u["email"] == "u@moodzic.dev").unwrap();
    assert_eq!(row["role"], "User");
    // verify x2, rejected updateRole, getEndpointsCalledByUser.
    assert_eq!(row["number_of_requests"], 4);
}

#[tokio::test]
async fn should_return_same_breakdown_on_repeated_reads() {
    let app = TestApp::new().await;
    let token = app.user_token("u@moodzic.dev").await;
    app.call(Method::GET, "/verify", Some(&token), None).await;
    app.drain_log().await;

    let first = app
        .call(Method::GET, "/getEndpointsCalledByUser", Some(&token), None)
        .await;
    assert_eq!(first.status, StatusCode::OK);
    app.drain_log().await;
    let second = app
        .call(Method::GET, "/getEndpointsCalledByUser", Some(&token), None)
        .await;

    assert_eq!(first.json(), second.json());
    assert_eq!(count_for(&second.json(), "GET", "/verify"), 1);
    assert_eq!(count_for(&second.json(), "GET", "/getEndpointsCalledByUser"), 0);
}

#[tokio::test]
async fn should_keep_logging_requests_of_deleted_user() {
    let app = TestApp::new().await;
    let admin = app.admin_token("admin@moodzic.dev").await;
    let user = app.user_token("u@moodzic.dev").await;
    let user_id = user_id_of(&app, &user).await;
    app.drain_log().await;

    let response = app
        .call(Method::DELETE, &format!("/delete/{user_id}"), Some(&admin), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // Token still verifies; the account behind it is gone.
    let response = app.call(Method::GET, "/verify", Some(&user), None).await;
    assert_error(&response, StatusCode::NOT_FOUND, "USER_NOT_FOUND");
    app.drain_log().await;

    let response = app
        .call(Method::GET, "/getNumberOfRequestsByEndpoint", Some(&admin), None)
        .await;
    let totals = response.json();
    assert_eq!(count_for(&totals, "GET", "/verify"), 2);
    assert_eq!(count_for(&totals, "DELETE", "/delete"), 1);
}

// ── Audio proxy ──────────────────────────────────────────────────────────────

async fn spawn_upstream(status: StatusCode) -> String {
    let app = Router::new().route(
        "/generate-audio",
        post(move |Json(body): Json<Value>| async move {
            assert!(body["promptText"].is_string());
            assert_eq!(body["filename"], "generated_audio");
            (status, b"RIFF....WAVE".to_vec())
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/generate-audio")
}

fn prompt(text: &str) -> Option<Value> {
    Some(json!({ "promptText": text }))
}

#[tokio::test]
async fn should_proxy_generated_audio() {
    let url = spawn_upstream(StatusCode::OK).await;
    let app = TestApp::with_audio_url(&url).await;
    let token = app.user_token("u@moodzic.dev").await;

    let response = app
        .call(Method::POST, "/generate-audio", Some(&token), prompt("rain on a tin roof"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"RIFF....WAVE");
    let headers: &HeaderMap = &response.headers;
    assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"generated_audio.wav\""
    );
    assert!(headers.get("x-moodzic-usage-warning").is_none());
    assert_cors(&response);
}

#[tokio::test]
async fn should_warn_once_free_calls_are_used_up() {
    let url = spawn_upstream(StatusCode::OK).await;
    let app = TestApp::with_audio_url(&url).await;
    let token = app.user_token("u@moodzic.dev").await;

    for _ in 0..20 {
        let response = app
            .call(Method::POST, "/generate-audio", Some(&token), prompt("p"))
            .await;
        assert!(response.headers.get("x-moodzic-usage-warning").is_none());
        app.drain_log().await;
    }

    let response = app
        .call(Method::POST, "/generate-audio", Some(&token), prompt("p"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers["x-moodzic-usage-warning"],
        "All free tokens have been used up. Your requests will still be processed."
    );
}

#[tokio::test]
async fn should_map_upstream_failure_to_502() {
    let url = spawn_upstream(StatusCode::SERVICE_UNAVAILABLE).await;
    let app = TestApp::with_audio_url(&url).await;
    let token = app.user_token("u@moodzic.dev").await;

    let response = app
        .call(Method::POST, "/generate-audio", Some(&token), prompt("p"))
        .await;
    assert_error(&response, StatusCode::BAD_GATEWAY, "UPSTREAM_FAILURE");
}

#[tokio::test]
async fn should_map_unreachable_upstream_to_502() {
    let app = TestApp::new().await;
    let token = app.user_token("u@moodzic.dev").await;

    let response = app
        .call(Method::POST, "/generate-audio", Some(&token), prompt("p"))
        .await;
    assert_error(&response, StatusCode::BAD_GATEWAY, "UPSTREAM_FAILURE");

    let response = app.call(Method::POST, "/generate-audio", None, prompt("p")).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED");
}
