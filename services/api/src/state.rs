use sea_orm::DatabaseConnection;

use crate::infra::db::{DbUsageRepository, DbUserRepository};
use crate::infra::upstream::HttpAudioPort;

/// Shared application state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub http: reqwest::Client,
    pub audio_service_url: String,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn usage_repo(&self) -> DbUsageRepository {
        DbUsageRepository {
            db: self.db.clone(),
        }
    }

    pub fn audio_port(&self) -> HttpAudioPort {
        HttpAudioPort {
            client: self.http.clone(),
            url: self.audio_service_url.clone(),
        }
    }
}
