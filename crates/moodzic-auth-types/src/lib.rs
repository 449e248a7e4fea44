//! Auth types shared by the Moodzic API.
//!
//! Provides JWT claims and validation, and bearer-credential extraction.

pub mod bearer;
pub mod token;
