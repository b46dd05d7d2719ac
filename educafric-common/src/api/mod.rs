//! API module for shared HTTP API functionality
//!
//! Credential primitives and response types used by EDUCAFRIC services.
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared types
//!
//! Each service wraps these with framework-specific middleware (Axum, etc.).

pub mod auth;
pub mod types;

pub use auth::{
    generate_session_token, hash_password, hash_session_token, session_token_from_cookie_header,
    verify_password, SESSION_COOKIE_NAME,
};
pub use types::{ErrorDetail, ErrorResponse, HealthResponse};
