use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host every listing, shop, and search URL must belong to.
pub const TARGET_DOMAIN: &str = "beauty.hotpepper.jp";

/// Service used when a request does not name one.
pub const DEFAULT_SERVICE: &str = "integrated-care";

/// Upper bound on list-producing lookups; ranks never exceed this.
pub const TOP_N: usize = 10;

/// One salon from a listing page, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorRecord {
    pub name: String,
    /// Absolute link into [`TARGET_DOMAIN`].
    pub url: String,
    /// Currency-formatted (`"¥2,980"`) or raw text as shown on the page.
    pub price: String,
    pub review_count: String,
    pub rating: String,
    /// 1-based, contiguous within a result set.
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub name: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopDetail {
    pub name: String,
    /// Page order is preserved.
    pub coupons: Vec<Coupon>,
    pub review_count: String,
    pub rating: String,
    pub photo_count: u32,
    pub staff_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub text: String,
    pub rating: String,
    pub date: String,
}

/// Outcome of a single keyword search-position lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankResult {
    pub keyword: String,
    /// 1-based position, or [`RankResult::NOT_FOUND`].
    pub rank: i32,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RankResult {
    /// Sentinel for "not in the observed result window" and "lookup failed".
    pub const NOT_FOUND: i32 = -1;

    #[must_use]
    pub fn found(keyword: impl Into<String>, rank: i32) -> Self {
        Self {
            keyword: keyword.into(),
            rank,
            date: Utc::now(),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(keyword: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            rank: Self::NOT_FOUND,
            date: Utc::now(),
            error: Some(error.into()),
        }
    }
}

/// Price bounds over the parseable prices of a competitor set.
///
/// Both bounds are `None` when no price could be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub area: String,
    pub service: String,
    pub competitor_count: usize,
    pub average_price: u64,
    pub price_range: PriceRange,
    pub average_review_count: u64,
    pub top_shops: Vec<CompetitorRecord>,
}

/// Quick single-page summary of one shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSnapshot {
    pub url: String,
    pub shop_id: String,
    pub name: String,
    pub price: String,
    pub review_count: String,
    pub rating: String,
    pub last_check: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn competitor_record_serializes_camel_case() {
        let record = CompetitorRecord {
            name: "Relaxation Space Shibuya".to_string(),
            url: "https://beauty.hotpepper.jp/slnH000123/".to_string(),
            price: "¥2,980".to_string(),
            review_count: "120".to_string(),
            rating: "4.5".to_string(),
            rank: 1,
        };
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["reviewCount"], "120");
        assert_eq!(json["rank"], 1);
        assert!(json.get("review_count").is_none());
    }

    #[test]
    fn rank_result_omits_error_when_absent() {
        let json = serde_json::to_value(RankResult::found("massage", 3)).expect("serialize");
        assert_eq!(json["rank"], 3);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failed_rank_result_uses_sentinel_and_keeps_error() {
        let result = RankResult::failed("massage", "navigation timed out");
        assert_eq!(result.rank, RankResult::NOT_FOUND);
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["error"], "navigation timed out");
    }

    #[test]
    fn empty_price_range_serializes_as_nulls() {
        let json = serde_json::to_value(PriceRange {
            min: None,
            max: None,
        })
        .expect("serialize");
        assert!(json["min"].is_null());
        assert!(json["max"].is_null());
    }
}
