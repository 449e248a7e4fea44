use serde::Deserialize;

use moodzic_core::config::Config;

/// API service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// sea-orm connection URL (e.g. `postgres://…`).
    pub database_url: String,
    /// HMAC secret for signing JWT access tokens.
    pub jwt_secret: String,
    /// TCP port to listen on (default 3000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// `Access-Control-Allow-Origin` value (default `*`).
    #[serde(default = "default_cors_allowed_origin")]
    pub cors_allowed_origin: String,
    /// Upstream generate-audio endpoint.
    pub audio_service_url: String,
    /// Bootstrap admin account; created at startup only when both are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_cors_allowed_origin() -> String {
    "*".to_owned()
}

impl Config for ApiConfig {}

impl ApiConfig {
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (self.admin_email.as_deref(), self.admin_password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}
