//! Shared API response types

use serde::{Deserialize, Serialize};

// ========================================
// Error Response Types
// ========================================

/// Error body returned by every failing request
///
/// ```json
/// {"error": {"code": "NOT_FOUND", "message": "User 42 not found"}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Machine-readable code plus human-readable message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

// ========================================
// Health
// ========================================

/// Health check response: status, module name, and version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

// ========================================
// Tests
// ========================================
