//! Vidhub Core Library
//!
//! This crate provides core domain models, error types and configuration
//! shared across all Vidhub components.

pub mod config;
pub mod error;
pub mod models;
pub mod provider_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, VideoPlatformConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use provider_types::ProviderBackend;
