//! API-wide constants.

/// Versioned path prefix for all authenticated endpoints.
pub const API_PREFIX: &str = "/api/v0";
