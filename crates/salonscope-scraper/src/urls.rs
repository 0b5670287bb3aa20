//! Target-site URL derivation and validation.

use std::sync::LazyLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use salonscope_core::TARGET_DOMAIN;

const ORIGIN: &str = "https://beauty.hotpepper.jp";

/// Characters left as-is by a browser's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static SHOP_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sln[A-Z]\d+").expect("valid shop id regex"));

fn encode(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Search page listing salons for an area and service.
#[must_use]
pub fn competitors_url(area: &str, service: &str) -> String {
    format!("{ORIGIN}/CSP/bt/search/?word={}", encode(&format!("{area} {service}")))
}

/// Keyword search page used for rank checks.
#[must_use]
pub fn ranking_url(keyword: &str) -> String {
    format!("{ORIGIN}/CSP/bt/search/?keyword={}", encode(keyword))
}

/// Shop page with the review tab selected.
#[must_use]
pub fn review_url(shop_url: &str) -> String {
    if shop_url.contains('?') {
        format!("{shop_url}&tab=review")
    } else {
        format!("{shop_url}?tab=review")
    }
}

/// `true` when `url` points into the listings site.
#[must_use]
pub fn is_listing_url(url: &str) -> bool {
    url.contains(TARGET_DOMAIN)
}

/// Salon identifier embedded in a shop URL (`slnH000123456`).
#[must_use]
pub fn shop_id(url: &str) -> Option<&str> {
    SHOP_ID.find(url).map(|m| m.as_str())
}

/// Resolves a link found on a listing page into an absolute URL.
///
/// Returns `None` for fragments, scripts, and other non-navigable hrefs.
#[must_use]
pub fn resolve_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        Some(href.to_string())
    } else if let Some(rest) = href.strip_prefix("//") {
        Some(format!("https://{rest}"))
    } else if href.starts_with('/') {
        Some(format!("{ORIGIN}{href}"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn competitors_url_encodes_area_and_service() {
        assert_eq!(
            competitors_url("Shibuya", "integrated-care"),
            "https://beauty.hotpepper.jp/CSP/bt/search/?word=Shibuya%20integrated-care"
        );
    }

    #[test]
    fn ranking_url_encodes_multibyte_keyword() {
        assert_eq!(
            ranking_url("渋谷 整体"),
            "https://beauty.hotpepper.jp/CSP/bt/search/?keyword=%E6%B8%8B%E8%B0%B7%20%E6%95%B4%E4%BD%93"
        );
    }

    #[test]
    fn review_url_respects_existing_query() {
        assert_eq!(
            review_url("https://beauty.hotpepper.jp/slnH000123/"),
            "https://beauty.hotpepper.jp/slnH000123/?tab=review"
        );
        assert_eq!(
            review_url("https://beauty.hotpepper.jp/slnH000123/?vos=1"),
            "https://beauty.hotpepper.jp/slnH000123/?vos=1&tab=review"
        );
    }

    #[test]
    fn is_listing_url_checks_domain_substring() {
        assert!(is_listing_url("https://beauty.hotpepper.jp/slnH000123/"));
        assert!(!is_listing_url("https://example.com/slnH000123/"));
    }

    #[test]
    fn shop_id_extracts_salon_identifier() {
        assert_eq!(
            shop_id("https://beauty.hotpepper.jp/kr/slnH000412345/"),
            Some("slnH000412345")
        );
        assert_eq!(shop_id("https://beauty.hotpepper.jp/kr/"), None);
    }

    #[test]
    fn resolve_href_handles_relative_forms() {
        assert_eq!(
            resolve_href("/slnH000123/").as_deref(),
            Some("https://beauty.hotpepper.jp/slnH000123/")
        );
        assert_eq!(
            resolve_href("//beauty.hotpepper.jp/slnH1/").as_deref(),
            Some("https://beauty.hotpepper.jp/slnH1/")
        );
        assert_eq!(resolve_href("javascript:void(0)"), None);
        assert_eq!(resolve_href("#top"), None);
    }
}
