// bluemoon-rbac/src/middleware/mod.rs
pub mod page_guard;
