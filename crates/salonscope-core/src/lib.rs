pub mod analysis;
pub mod app_config;
pub mod config;
pub mod records;

use thiserror::Error;

pub use analysis::{analyze_market, parse_price, parse_review_count};
pub use app_config::{AppConfig, DataMode, Environment, Profile};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{
    CompetitorRecord, Coupon, MarketAnalysis, PriceRange, RankResult, ReviewRecord, ShopDetail,
    ShopSnapshot, DEFAULT_SERVICE, TARGET_DOMAIN, TOP_N,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
