// bluemoon-rbac/src/controllers/mod.rs
pub mod auth_controller;
pub mod dashboard_controller;
