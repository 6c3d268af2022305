// bluemoon-rbac/src/configs/mod.rs
pub mod initializer;
