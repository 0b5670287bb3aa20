use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Where response data comes from for the whole process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    /// Live browser scraping, with demo fallback on failure.
    Real,
    /// Synthetic data only.
    Demo,
}

impl DataMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DataMode::Real => "real",
            DataMode::Demo => "demo",
        }
    }
}

impl std::fmt::Display for DataMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment profile.
///
/// `Lite` keeps the monitoring endpoints reachable but never schedules work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Full,
    Lite,
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Full => write!(f, "full"),
            Profile::Lite => write!(f, "lite"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub mode: DataMode,
    pub profile: Profile,
    pub scraper_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub chrome_path: Option<PathBuf>,
    pub bulk_delay_ms: u64,
    pub cache_ttl_secs: u64,
}
