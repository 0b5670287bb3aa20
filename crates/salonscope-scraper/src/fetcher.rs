//! Live acquisition of listing-site data.

use std::sync::Arc;

use salonscope_core::{CompetitorRecord, RankResult, ReviewRecord, ShopDetail, ShopSnapshot};

use crate::browser::PageRenderer;
use crate::error::ScraperError;
use crate::{extract, urls};

/// Scrapes the listings site through a [`PageRenderer`].
///
/// Each call renders exactly one page. Failures are returned as-is; choosing
/// a fallback is the caller's job.
#[derive(Clone)]
pub struct Fetcher {
    renderer: Arc<dyn PageRenderer>,
}

impl Fetcher {
    #[must_use]
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self { renderer }
    }

    /// Top listings for an area and service.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures, and returns [`ScraperError::NoResults`]
    /// when the page renders but holds no usable listing.
    pub async fn competitors(
        &self,
        area: &str,
        service: &str,
    ) -> Result<Vec<CompetitorRecord>, ScraperError> {
        let url = urls::competitors_url(area, service);
        tracing::info!(area, service, url = %url, "fetcher: scraping competitors");

        let html = self.renderer.render(&url).await?;
        let records = extract::competitors(&html);
        if records.is_empty() {
            return Err(ScraperError::NoResults { url });
        }

        tracing::info!(area, service, count = records.len(), "fetcher: competitors scraped");
        Ok(records)
    }

    /// Detail page for one shop.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures.
    pub async fn shop_detail(&self, shop_url: &str) -> Result<ShopDetail, ScraperError> {
        tracing::info!(url = shop_url, "fetcher: scraping shop detail");
        let html = self.renderer.render(shop_url).await?;
        Ok(extract::shop_detail(&html))
    }

    /// All reviews shown on a shop's review tab.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures.
    pub async fn reviews(&self, shop_url: &str) -> Result<Vec<ReviewRecord>, ScraperError> {
        let url = urls::review_url(shop_url);
        tracing::info!(url = %url, "fetcher: scraping reviews");
        let html = self.renderer.render(&url).await?;
        Ok(extract::reviews(&html))
    }

    /// Search position of `shop_name` for `keyword`; `-1` when absent.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures.
    pub async fn rank(&self, keyword: &str, shop_name: &str) -> Result<RankResult, ScraperError> {
        let url = urls::ranking_url(keyword);
        tracing::info!(keyword, shop_name, "fetcher: checking ranking");
        let html = self.renderer.render(&url).await?;
        Ok(RankResult::found(keyword, extract::rank_of(&html, shop_name)))
    }

    /// Single-page summary of a shop URL.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures.
    pub async fn shop_snapshot(&self, url: &str) -> Result<ShopSnapshot, ScraperError> {
        tracing::info!(url, "fetcher: scraping shop snapshot");
        let html = self.renderer.render(url).await?;
        Ok(extract::shop_snapshot(&html, url))
    }
}
