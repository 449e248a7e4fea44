//! Domain types shared across Moodzic crates.
//!
//! This crate contains only pure types with no framework dependencies.

pub mod id;
pub mod method;
pub mod user;
