//! Area market aggregation over a competitor listing.
//!
//! Source text is scraped and frequently messy (`"¥2,980~"`, `"口コミ 120件"`,
//! `"N/A"`), so every numeric read here degrades to "absent" instead of
//! failing the aggregate.

use crate::records::{CompetitorRecord, MarketAnalysis, PriceRange};

/// Number of leading records reported as `topShops`.
const TOP_SHOPS: usize = 5;

/// Returns the first run of digits in `text`, allowing `,` thousands
/// separators inside the run (`"¥2,980"` → `2980`).
fn first_number(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let bytes = text.as_bytes();
    let mut digits = String::new();
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b @ b'0'..=b'9' => digits.push(char::from(b)),
            b',' if bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {}
            _ => break,
        }
        i += 1;
    }
    digits.parse().ok()
}

/// Parses a price label into yen. `None` when the text carries no digits.
#[must_use]
pub fn parse_price(text: &str) -> Option<u64> {
    first_number(text)
}

/// Parses a review-count label, substituting `0` for non-numeric text.
#[must_use]
pub fn parse_review_count(text: &str) -> u64 {
    first_number(text).unwrap_or(0)
}

/// Half-up mean of `count` values summing to `sum`. Sums are carried in
/// `u128` so any number of `u64` inputs fits.
fn rounded_mean(sum: u128, count: usize) -> u64 {
    let count = u128::try_from(count).unwrap_or(u128::MAX);
    if count == 0 {
        return 0;
    }
    let mean = sum.saturating_add(count / 2) / count;
    u64::try_from(mean).unwrap_or(u64::MAX)
}

fn widened_sum(values: impl Iterator<Item = u64>) -> u128 {
    values.map(u128::from).fold(0, u128::saturating_add)
}

/// Aggregates a competitor listing for one area/service pair.
///
/// `averagePrice` and `priceRange` cover only records whose price parses;
/// with no parseable price the average is `0` and both bounds are `None`.
/// `averageReviewCount` covers every record, unparseable counts reading as
/// zero.
#[must_use]
pub fn analyze_market(
    area: &str,
    service: &str,
    competitors: &[CompetitorRecord],
) -> MarketAnalysis {
    let prices: Vec<u64> = competitors
        .iter()
        .filter_map(|c| parse_price(&c.price))
        .collect();

    let review_total = widened_sum(
        competitors
            .iter()
            .map(|c| parse_review_count(&c.review_count)),
    );

    MarketAnalysis {
        area: area.to_string(),
        service: service.to_string(),
        competitor_count: competitors.len(),
        average_price: rounded_mean(widened_sum(prices.iter().copied()), prices.len()),
        price_range: PriceRange {
            min: prices.iter().copied().min(),
            max: prices.iter().copied().max(),
        },
        average_review_count: rounded_mean(review_total, competitors.len()),
        top_shops: competitors.iter().take(TOP_SHOPS).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rank: u32, price: &str, reviews: &str) -> CompetitorRecord {
        CompetitorRecord {
            name: format!("Salon {rank}"),
            url: format!("https://beauty.hotpepper.jp/slnH{rank:09}/"),
            price: price.to_string(),
            review_count: reviews.to_string(),
            rating: "4.0".to_string(),
            rank,
        }
    }

    #[test]
    fn parse_price_handles_currency_and_separators() {
        assert_eq!(parse_price("¥2,980"), Some(2980));
        assert_eq!(parse_price("7500"), Some(7500));
        assert_eq!(parse_price("from ¥12,345~"), Some(12345));
        assert_eq!(parse_price("N/A"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn parse_price_stops_at_trailing_comma() {
        assert_eq!(parse_price("3500, tax incl."), Some(3500));
    }

    #[test]
    fn parse_review_count_defaults_to_zero() {
        assert_eq!(parse_review_count("120"), 120);
        assert_eq!(parse_review_count("reviews (1,024)"), 1024);
        assert_eq!(parse_review_count("none yet"), 0);
    }

    #[test]
    fn analyze_market_over_demo_price_ladder() {
        let prices = [2980, 3500, 3980, 4500, 4980, 5500, 5980, 6500, 7000, 7500];
        let competitors: Vec<CompetitorRecord> = prices
            .iter()
            .zip(1..)
            .map(|(p, rank)| record(rank, &format!("¥{p}"), "100"))
            .collect();

        let analysis = analyze_market("Shibuya", "integrated-care", &competitors);

        // (2980 + ... + 7500) / 10 = 5242.0
        assert_eq!(analysis.average_price, 5242);
        assert_eq!(analysis.price_range.min, Some(2980));
        assert_eq!(analysis.price_range.max, Some(7500));
        assert_eq!(analysis.competitor_count, 10);
        assert_eq!(analysis.average_review_count, 100);
        assert_eq!(
            analysis.top_shops.iter().map(|c| c.rank).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn analyze_market_rounds_half_up() {
        let competitors = vec![record(1, "¥1000", "1"), record(2, "¥1001", "2")];
        let analysis = analyze_market("Shinjuku", "massage", &competitors);
        assert_eq!(analysis.average_price, 1001);
        assert_eq!(analysis.average_review_count, 2);
    }

    #[test]
    fn analyze_market_without_parseable_prices_is_degenerate_not_error() {
        let competitors = vec![record(1, "N/A", "abc"), record(2, "", "10")];
        let analysis = analyze_market("Ikebukuro", "massage", &competitors);
        assert_eq!(analysis.average_price, 0);
        assert_eq!(analysis.price_range.min, None);
        assert_eq!(analysis.price_range.max, None);
        assert_eq!(analysis.average_review_count, 5);
    }

    #[test]
    fn analyze_market_survives_prices_near_u64_max() {
        let competitors = vec![
            record(1, "¥18,446,744,073,709,551,615", "18446744073709551615"),
            record(2, "¥10,000,000,000,000,000,000", "18446744073709551615"),
        ];
        let analysis = analyze_market("Roppongi", "massage", &competitors);

        assert_eq!(analysis.average_price, 14_223_372_036_854_775_808);
        assert_eq!(analysis.price_range.min, Some(10_000_000_000_000_000_000));
        assert_eq!(analysis.price_range.max, Some(u64::MAX));
        assert_eq!(analysis.average_review_count, u64::MAX);
    }

    #[test]
    fn price_beyond_u64_reads_as_absent() {
        assert_eq!(parse_price("¥100,000,000,000,000,000,000"), None);
    }

    #[test]
    fn analyze_market_on_empty_listing() {
        let analysis = analyze_market("Ueno", "massage", &[]);
        assert_eq!(analysis.competitor_count, 0);
        assert_eq!(analysis.average_review_count, 0);
        assert!(analysis.top_shops.is_empty());
    }
}
