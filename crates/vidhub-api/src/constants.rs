//! API constants

/// Versioned prefix for every REST route.
pub const API_PREFIX: &str = "/api/v0";
