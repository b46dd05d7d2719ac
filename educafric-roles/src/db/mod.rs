//! Database access layer for educafric-roles
//!
//! Thin query functions over the shared schema created by
//! `educafric_common::db::init`. Business rules live in `services`.

pub mod directory;
pub mod sessions;
pub mod user_roles;
pub mod users;
