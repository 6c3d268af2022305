// bluemoon-rbac/src/api/mod.rs
pub mod client;
pub mod endpoints;

pub use client::{ApiClient, ApiError, ApiMethod, Transport};
pub use endpoints::{AuthApi, EntityApi};
