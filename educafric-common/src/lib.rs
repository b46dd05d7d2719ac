//! # EDUCAFRIC Common Library
//!
//! Shared code for EDUCAFRIC services including:
//! - Database models, schema and migrations
//! - Role model and multi-role suggestion rules
//! - Configuration loading
//! - Credential primitives (passwords, session tokens)
//! - Utility functions

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod phone;
pub mod roles;
pub mod time;

pub use error::{Error, Result};
pub use roles::Role;
