//! Request-level operations shared by the HTTP handlers
//!
//! Each function validates its input, runs the queries in `db` and maps
//! failures onto [`ApiError`](crate::error::ApiError) statuses.

pub mod detection;
pub mod membership;
pub mod registration;

use educafric_common::phone::normalize_phone;

use crate::error::{ApiError, ApiResult};

/// Normalize a phone number from a request body, rejecting malformed input
pub(crate) fn require_phone(raw: &str) -> ApiResult<String> {
    normalize_phone(raw).ok_or_else(|| ApiError::BadRequest(format!("Invalid phone number: {:?}", raw)))
}
