// bluemoon-rbac/src/helpers/mod.rs
pub mod auth_helper;
pub mod template_helper;
