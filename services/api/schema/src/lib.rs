//! sea-orm entities for the Moodzic API database.

pub mod endpoints;
pub mod methods;
pub mod outbox_events;
pub mod requests;
pub mod roles;
pub mod users;
