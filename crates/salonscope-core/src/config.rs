use crate::app_config::{AppConfig, DataMode, Environment, Profile};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a demo-mode,
/// full-profile server on port 3001.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("SALONSCOPE_ENV", "development"))?;

    let bind_addr = match lookup("SALONSCOPE_BIND_ADDR") {
        Ok(raw) => raw
            .parse::<SocketAddr>()
            .map_err(|e| invalid("SALONSCOPE_BIND_ADDR", e.to_string()))?,
        Err(_) => {
            let port = or_default("PORT", "3001")
                .parse::<u16>()
                .map_err(|e| invalid("PORT", e.to_string()))?;
            SocketAddr::from(([0, 0, 0, 0], port))
        }
    };

    let log_level = or_default("SALONSCOPE_LOG_LEVEL", "info");
    let mode = parse_mode(&or_default("USE_REAL_SCRAPING", "false"));
    let profile = parse_profile(&or_default("SALONSCOPE_PROFILE", "full"))?;

    let scraper_timeout_secs = parse_u64("SALONSCOPE_SCRAPER_TIMEOUT_SECS", "30")?;
    if scraper_timeout_secs == 0 {
        return Err(invalid(
            "SALONSCOPE_SCRAPER_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let scraper_user_agent = or_default("SALONSCOPE_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let chrome_path = lookup("SALONSCOPE_CHROME_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let bulk_delay_ms = parse_u64("SALONSCOPE_BULK_DELAY_MS", "2000")?;
    let cache_ttl_secs = parse_u64("SALONSCOPE_CACHE_TTL_SECS", "900")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        mode,
        profile,
        scraper_timeout_secs,
        scraper_user_agent,
        chrome_path,
        bulk_delay_ms,
        cache_ttl_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SALONSCOPE_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

/// Only the exact string `true` turns live scraping on.
fn parse_mode(s: &str) -> DataMode {
    if s == "true" {
        DataMode::Real
    } else {
        DataMode::Demo
    }
}

fn parse_profile(s: &str) -> Result<Profile, ConfigError> {
    match s {
        "full" => Ok(Profile::Full),
        "lite" => Ok(Profile::Lite),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SALONSCOPE_PROFILE".to_string(),
            reason: format!("expected full or lite, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
