pub mod account;
pub mod admin;
pub mod analytics;
pub mod audio;
pub mod credential;
pub mod token;
