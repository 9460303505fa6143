//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use vidhub_core::Config;

/// Validate critical configuration values
///
/// Structural checks live in [`Config::validate`]; this adds the checks that
/// depend on the deployment environment.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();

    if is_production && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production. \
            Set specific allowed origins via the CORS_ORIGINS environment variable."
        ));
    }

    if config.reconcile_concurrency() > 16 {
        tracing::warn!(
            reconcile_concurrency = config.reconcile_concurrency(),
            "RECONCILE_CONCURRENCY is high - the provider may throttle thumbnail lookups"
        );
    }

    Ok(())
}
