use serde::Serialize;

pub mod account;
pub mod admin;
pub mod analytics;
pub mod audio;
pub mod health;

/// `{message}` body shared by the plain success responses.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
