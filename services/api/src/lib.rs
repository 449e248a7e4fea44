pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod infra;
pub mod logger;
pub mod route;
pub mod router;
pub mod routes;
pub mod state;
pub mod usecase;
