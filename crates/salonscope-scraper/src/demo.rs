//! Synthetic listing data.
//!
//! Every function returns exactly the shape its [`Fetcher`](crate::Fetcher)
//! counterpart would, with randomized values, so callers never branch on
//! schema. Nothing here performs I/O or fails.

use chrono::Utc;
use rand::Rng;
use salonscope_core::{
    CompetitorRecord, Coupon, RankResult, ReviewRecord, ShopDetail, ShopSnapshot, TARGET_DOMAIN,
};

use crate::urls::shop_id;

const SHOP_NAMES: [&str; 10] = [
    "Relaxation Space",
    "Healing Seitai Clinic",
    "Body Care Salon",
    "Healthcare Seitai",
    "Refresh House",
    "Comfort Seitai",
    "Kneading Specialists",
    "Body Reset",
    "Stretch Seitai",
    "Total Care",
];

/// Index-aligned with [`SHOP_NAMES`].
const BASE_PRICES: [u64; 10] = [2980, 3500, 3980, 4500, 4980, 5500, 5980, 6500, 7000, 7500];

const SNAPSHOT_PRICES: [u64; 6] = [2980, 3500, 3980, 4500, 4980, 5500];

const SAMPLE_REVIEWS: [(&str, &str, &str); 8] = [
    ("Careful treatment and my back pain improved. The staff were kind too.", "5.0", "2025-01-20"),
    ("Close to the station and easy to book. Very satisfied.", "4.5", "2025-01-18"),
    ("The first-visit discount was a good deal. I'd like to come again.", "4.0", "2025-01-15"),
    ("Clear explanations, so I felt at ease during the session.", "5.0", "2025-01-12"),
    ("Would be nice if it were a bit cheaper, but it worked.", "3.5", "2025-01-10"),
    ("Clean interior and I could really relax.", "4.5", "2025-01-08"),
    ("My stiff shoulders feel much lighter. Will be back.", "5.0", "2025-01-05"),
    ("Friendly staff who were easy to talk to.", "4.5", "2025-01-03"),
];

/// Formats yen with thousands separators: `2980` → `"¥2,980"`.
#[must_use]
pub fn format_yen(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("¥{grouped}")
}

fn review_count<R: Rng>(rng: &mut R) -> String {
    rng.random_range(50..250_u32).to_string()
}

/// One decimal place in `[3.5, 5.0]`.
fn rating<R: Rng>(rng: &mut R) -> String {
    let tenths = rng.random_range(35..=50_u32);
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Always ten records ranked 1..=10, one per name template.
#[must_use]
pub fn competitors(area: &str, _service: &str) -> Vec<CompetitorRecord> {
    let mut rng = rand::rng();
    SHOP_NAMES
        .iter()
        .zip(BASE_PRICES)
        .zip(1_u32..)
        .map(|((name, price), rank)| CompetitorRecord {
            name: format!("{name} {area}"),
            url: format!("https://{TARGET_DOMAIN}/demo/{area}/{}", rank - 1),
            price: format_yen(price),
            review_count: review_count(&mut rng),
            rating: rating(&mut rng),
            rank,
        })
        .collect()
}

#[must_use]
pub fn shop_detail(_url: &str) -> ShopDetail {
    let coupon = |name: &str, price: u64| Coupon {
        name: name.to_string(),
        price: format_yen(price),
    };
    ShopDetail {
        name: "Sample Seitai Clinic".to_string(),
        coupons: vec![
            coupon("First-visit coupon", 2980),
            coupon("Returning-customer discount", 3500),
            coupon("Weekdays only", 3200),
        ],
        review_count: "120".to_string(),
        rating: "4.3".to_string(),
        photo_count: 25,
        staff_count: 5,
    }
}

#[must_use]
pub fn reviews(_url: &str) -> Vec<ReviewRecord> {
    SAMPLE_REVIEWS
        .iter()
        .map(|(text, rating, date)| ReviewRecord {
            text: (*text).to_string(),
            rating: (*rating).to_string(),
            date: (*date).to_string(),
        })
        .collect()
}

/// Random position in `1..=20`.
#[must_use]
pub fn rank(keyword: &str, _shop_name: &str) -> RankResult {
    RankResult::found(keyword, rand::rng().random_range(1..=20))
}

#[must_use]
pub fn shop_snapshot(url: &str) -> ShopSnapshot {
    let mut rng = rand::rng();
    let id = shop_id(url).unwrap_or("Unknown");
    let price = SNAPSHOT_PRICES[rng.random_range(0..SNAPSHOT_PRICES.len())];
    ShopSnapshot {
        url: url.to_string(),
        shop_id: id.to_string(),
        name: format!("Shop {id}"),
        price: format_yen(price),
        review_count: review_count(&mut rng),
        rating: rating(&mut rng),
        last_check: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_yen_groups_thousands() {
        assert_eq!(format_yen(0), "¥0");
        assert_eq!(format_yen(980), "¥980");
        assert_eq!(format_yen(2980), "¥2,980");
        assert_eq!(format_yen(1_234_567), "¥1,234,567");
    }

    #[test]
    fn competitors_always_ten_contiguous_ranks() {
        for area in ["Shibuya", "Shinjuku", ""] {
            let records = competitors(area, "integrated-care");
            assert_eq!(records.len(), 10);
            for (i, record) in records.iter().enumerate() {
                assert_eq!(record.rank as usize, i + 1);
                assert!(record.name.ends_with(area));
                assert!(record.url.contains(TARGET_DOMAIN));
            }
        }
    }

    #[test]
    fn competitors_values_stay_in_range() {
        for _ in 0..50 {
            for record in competitors("Ebisu", "massage") {
                let reviews: u32 = record.review_count.parse().expect("numeric review count");
                assert!((50..250).contains(&reviews), "review count {reviews}");
                let rating: f64 = record.rating.parse().expect("numeric rating");
                assert!((3.5..=5.0).contains(&rating), "rating {rating}");
            }
        }
    }

    #[test]
    fn competitors_prices_follow_base_ladder() {
        let prices: Vec<String> = competitors("Ginza", "massage")
            .into_iter()
            .map(|r| r.price)
            .collect();
        assert_eq!(prices.first().map(String::as_str), Some("¥2,980"));
        assert_eq!(prices.last().map(String::as_str), Some("¥7,500"));
    }

    #[test]
    fn reviews_have_valid_ratings_and_dates() {
        let records = reviews("https://beauty.hotpepper.jp/slnH1/");
        assert_eq!(records.len(), 8);
        for record in records {
            let rating: f64 = record.rating.parse().expect("numeric rating");
            assert!((0.0..=5.0).contains(&rating));
            assert!(
                chrono::NaiveDate::parse_from_str(&record.date, "%Y-%m-%d").is_ok(),
                "bad date {}",
                record.date
            );
        }
    }

    #[test]
    fn rank_is_between_one_and_twenty() {
        for _ in 0..100 {
            let result = rank("shoulder massage Shibuya", "Sample Salon");
            assert_eq!(result.keyword, "shoulder massage Shibuya");
            assert!((1..=20).contains(&result.rank));
            assert!(result.error.is_none());
        }
    }

    #[test]
    fn shop_snapshot_uses_shop_id_from_url() {
        let snapshot = shop_snapshot("https://beauty.hotpepper.jp/slnH000123456/");
        assert_eq!(snapshot.shop_id, "slnH000123456");
        assert_eq!(snapshot.name, "Shop slnH000123456");
        assert!(snapshot.price.starts_with('¥'));
    }

    #[test]
    fn shop_detail_shape_is_fixed() {
        let detail = shop_detail("https://beauty.hotpepper.jp/slnH1/");
        assert_eq!(detail.coupons.len(), 3);
        assert_eq!(detail.photo_count, 25);
        assert_eq!(detail.staff_count, 5);
    }
}
