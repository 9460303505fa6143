use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Video hosting backends
///
/// Defined in core because configuration selects one at startup and the
/// provider crate builds the matching implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    Streamtape,
    Bunny,
}

impl FromStr for ProviderBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "streamtape" => Ok(ProviderBackend::Streamtape),
            "bunny" | "bunnynet" | "bunny.net" => Ok(ProviderBackend::Bunny),
            _ => Err(anyhow::anyhow!("Invalid video provider: {}", s)),
        }
    }
}

impl Display for ProviderBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProviderBackend::Streamtape => write!(f, "streamtape"),
            ProviderBackend::Bunny => write!(f, "bunny"),
        }
    }
}
