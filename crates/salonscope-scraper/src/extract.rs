//! Pure extraction routines over rendered listing-site HTML.
//!
//! Every field is read through [`text_or`]: the first selector that yields
//! non-empty text wins, otherwise the field takes its sentinel. A missing
//! field never drops the record.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use salonscope_core::{
    CompetitorRecord, Coupon, ReviewRecord, ShopDetail, ShopSnapshot, TOP_N,
};
use scraper::{ElementRef, Html, Selector};

use crate::urls::{is_listing_url, resolve_href, shop_id};

const MISSING: &str = "N/A";
const ZERO: &str = "0";

fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter()
        .map(|css| Selector::parse(css).expect("valid selector"))
        .collect()
}

static LISTING: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&[".slnList"]));
static LISTING_LINK: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[".slnName a", ".shopName a", "h3 a"]));
static LISTING_PRICE: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[".price", "[class*=\"price\"]", "[class*=\"yen\"]"]));
static LISTING_REVIEWS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[".revCount", "[class*=\"review\"]", "[class*=\"kuchikomi\"]"])
});
static LISTING_RATING: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[".rating", "[class*=\"rating\"]", "[class*=\"star\"]"]));
static RATING: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&[".rating"]));

static SHOP_NAME: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[".shopName", ".slnName", "h1"]));
static COUPON_NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&[".couponName"]));
static COUPON_PRICE: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[".price", ".couponPrice"]));
static DETAIL_REVIEWS: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&[".reviewCount"]));
static GALLERY: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&[".galleryImg"]));
static STAFF: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&[".staffItem"]));

static REVIEW_ITEM: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&[".reviewItem"]));
static REVIEW_TEXT: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&[".reviewText"]));
static REVIEW_DATE: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&[".reviewDate"]));

static RANK_NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&[".slnName a"]));

static SNAPSHOT_NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[".shopName", ".slnName", "h1", "[class*=\"salon-name\"]"])
});
static SNAPSHOT_PRICE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&["[class*=\"price\"]", "[class*=\"yen\"]", ".couponPrice"])
});
static SNAPSHOT_REVIEWS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&["[class*=\"review\"]", "[class*=\"kuchikomi\"]", "[class*=\"voice\"]"])
});
static SNAPSHOT_RATING: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&["[class*=\"rating\"]", "[class*=\"star\"]", "[class*=\"score\"]"])
});

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid digits regex"));
static PRICE_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"¥|\d{3,}").expect("valid price regex"));
static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid decimal regex"));

/// Visible text of an element with whitespace runs collapsed.
fn text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// All matches of `list` under `scope`, in document order per selector.
fn select_all<'a>(scope: ElementRef<'a>, list: &[Selector]) -> Vec<ElementRef<'a>> {
    list.iter().flat_map(|sel| scope.select(sel)).collect()
}

/// First non-empty text for any selector in `list`, else `default`.
fn text_or(scope: ElementRef<'_>, list: &[Selector], default: &str) -> String {
    select_all(scope, list)
        .into_iter()
        .map(text)
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// First text under `scope` that `accept` maps to a value.
fn first_matching<F>(scope: ElementRef<'_>, list: &[Selector], accept: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    select_all(scope, list)
        .into_iter()
        .find_map(|el| accept(&text(el)))
}

fn count(scope: ElementRef<'_>, list: &[Selector]) -> u32 {
    let n = select_all(scope, list).len();
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Top listings on a search results page.
///
/// Entries without a link into the listings site are skipped; ranks are
/// assigned to the kept entries so they stay contiguous from 1.
#[must_use]
pub fn competitors(html: &str) -> Vec<CompetitorRecord> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut results = Vec::new();

    for item in select_all(root, &LISTING) {
        if results.len() >= TOP_N {
            break;
        }

        let Some(link) = select_all(item, &LISTING_LINK).into_iter().next() else {
            continue;
        };
        let Some(url) = link.value().attr("href").and_then(resolve_href) else {
            continue;
        };
        if !is_listing_url(&url) {
            continue;
        }

        let name = text(link);
        let rank = u32::try_from(results.len() + 1).unwrap_or(u32::MAX);
        results.push(CompetitorRecord {
            name: if name.is_empty() { MISSING.to_string() } else { name },
            url,
            price: text_or(item, &LISTING_PRICE, MISSING),
            review_count: text_or(item, &LISTING_REVIEWS, ZERO),
            rating: text_or(item, &LISTING_RATING, MISSING),
            rank,
        });
    }

    results
}

/// Detail page of a single shop.
#[must_use]
pub fn shop_detail(html: &str) -> ShopDetail {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let coupons = select_all(root, &COUPON_NAME)
        .into_iter()
        .map(|name_el| {
            let price = name_el
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| has_class(*a, "coupon"))
                .map(|block| text_or(block, &COUPON_PRICE, ""))
                .unwrap_or_default();
            Coupon {
                name: text(name_el),
                price,
            }
        })
        .collect();

    ShopDetail {
        name: text_or(root, &SHOP_NAME, ""),
        coupons,
        review_count: text_or(root, &DETAIL_REVIEWS, ZERO),
        rating: text_or(root, &RATING, ZERO),
        photo_count: count(root, &GALLERY),
        staff_count: count(root, &STAFF),
    }
}

/// Every review present on the page. No pagination is followed.
#[must_use]
pub fn reviews(html: &str) -> Vec<ReviewRecord> {
    let document = Html::parse_document(html);
    select_all(document.root_element(), &REVIEW_ITEM)
        .into_iter()
        .map(|item| ReviewRecord {
            text: text_or(item, &REVIEW_TEXT, ""),
            rating: text_or(item, &RATING, ZERO),
            date: text_or(item, &REVIEW_DATE, ""),
        })
        .collect()
}

/// 1-based position of `shop_name` among the result names, or `-1`.
///
/// The whole list is scanned; if the name recurs the last position wins.
#[must_use]
pub fn rank_of(html: &str, shop_name: &str) -> i32 {
    let document = Html::parse_document(html);
    let mut rank = -1;
    for (index, el) in select_all(document.root_element(), &RANK_NAME)
        .into_iter()
        .enumerate()
    {
        if text(el).contains(shop_name) {
            rank = i32::try_from(index + 1).unwrap_or(i32::MAX);
        }
    }
    rank
}

/// Single-page summary of a shop: name plus the first plausible price,
/// review count, and rating found anywhere on the page.
#[must_use]
pub fn shop_snapshot(html: &str, url: &str) -> ShopSnapshot {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let price = first_matching(root, &SNAPSHOT_PRICE, |t| {
        PRICE_LIKE.is_match(t).then(|| t.to_string())
    });
    let review_count = first_matching(root, &SNAPSHOT_REVIEWS, |t| {
        DIGITS.find(t).map(|m| m.as_str().to_string())
    });
    let rating = first_matching(root, &SNAPSHOT_RATING, |t| {
        DECIMAL.find(t).map(|m| m.as_str().to_string())
    });

    ShopSnapshot {
        url: url.to_string(),
        shop_id: shop_id(url).unwrap_or("Unknown").to_string(),
        name: text_or(root, &SNAPSHOT_NAME, MISSING),
        price: price.unwrap_or_else(|| MISSING.to_string()),
        review_count: review_count.unwrap_or_else(|| ZERO.to_string()),
        rating: rating.unwrap_or_else(|| MISSING.to_string()),
        last_check: Utc::now(),
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
