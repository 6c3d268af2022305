// bluemoon-rbac/src/utils/mod.rs
pub mod guard;
pub mod rbac;
pub mod role;
pub mod session;
pub mod structs;
