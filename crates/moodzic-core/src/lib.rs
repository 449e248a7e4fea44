//! Service plumbing shared by Moodzic binaries: configuration loading,
//! tracing setup and request-id middleware.

pub mod config;
pub mod middleware;
pub mod tracing;
