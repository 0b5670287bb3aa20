//! Chooses between live scraping and generated demo data for each request.
//!
//! A live failure never reaches the client: it is logged and the request is
//! answered with demo data, and the response `mode` reports `demo`.

use std::future::Future;
use std::time::Duration;

use salonscope_core::{
    CompetitorRecord, DataMode, RankResult, ReviewRecord, ShopDetail, ShopSnapshot,
};
use salonscope_scraper::{demo, Fetcher, ScraperError};
use serde::Serialize;

/// Payload plus the mode that actually produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub data: T,
    pub mode: DataMode,
}

impl<T> Sourced<T> {
    fn demo(data: T) -> Self {
        Self {
            data,
            mode: DataMode::Demo,
        }
    }
}

pub struct Sourcing {
    mode: DataMode,
    fetcher: Option<Fetcher>,
    bulk_delay: Duration,
}

impl Sourcing {
    /// `fetcher` is ignored in demo mode. In real mode a missing fetcher
    /// means every request is served from demo data.
    #[must_use]
    pub fn new(mode: DataMode, fetcher: Option<Fetcher>, bulk_delay: Duration) -> Self {
        Self {
            mode,
            fetcher,
            bulk_delay,
        }
    }

    #[must_use]
    pub fn mode(&self) -> DataMode {
        self.mode
    }

    /// Mode requests can actually be served in: `demo` when real mode was
    /// requested but no browser is available.
    #[must_use]
    pub fn effective_mode(&self) -> DataMode {
        if self.live().is_some() {
            DataMode::Real
        } else {
            DataMode::Demo
        }
    }

    fn live(&self) -> Option<&Fetcher> {
        match self.mode {
            DataMode::Real => self.fetcher.as_ref(),
            DataMode::Demo => None,
        }
    }

    async fn acquire<T, F, Fut>(
        &self,
        kind: &'static str,
        live: F,
        demo: impl FnOnce() -> T,
    ) -> Sourced<T>
    where
        F: FnOnce(Fetcher) -> Fut,
        Fut: Future<Output = Result<T, ScraperError>>,
    {
        let Some(fetcher) = self.live() else {
            return Sourced::demo(demo());
        };

        match live(fetcher.clone()).await {
            Ok(data) => Sourced {
                data,
                mode: DataMode::Real,
            },
            Err(e) => {
                tracing::warn!(
                    kind,
                    error = %e,
                    "sourcing: live scrape failed; serving demo data"
                );
                Sourced::demo(demo())
            }
        }
    }

    pub async fn competitors(&self, area: &str, service: &str) -> Sourced<Vec<CompetitorRecord>> {
        self.acquire(
            "competitors",
            |f| async move { f.competitors(area, service).await },
            || demo::competitors(area, service),
        )
        .await
    }

    pub async fn shop_detail(&self, url: &str) -> Sourced<ShopDetail> {
        self.acquire(
            "shop_detail",
            |f| async move { f.shop_detail(url).await },
            || demo::shop_detail(url),
        )
        .await
    }

    pub async fn reviews(&self, url: &str) -> Sourced<Vec<ReviewRecord>> {
        self.acquire(
            "reviews",
            |f| async move { f.reviews(url).await },
            || demo::reviews(url),
        )
        .await
    }

    pub async fn rank(&self, keyword: &str, shop_name: &str) -> Sourced<RankResult> {
        self.acquire(
            "rank",
            |f| async move { f.rank(keyword, shop_name).await },
            || demo::rank(keyword, shop_name),
        )
        .await
    }

    pub async fn shop_snapshot(&self, url: &str) -> Sourced<ShopSnapshot> {
        self.acquire(
            "shop_snapshot",
            |f| async move { f.shop_snapshot(url).await },
            || demo::shop_snapshot(url),
        )
        .await
    }

    /// Ranks every keyword in order, one at a time.
    ///
    /// Against a live fetcher consecutive checks are separated by the bulk
    /// delay. The batch reports `real` only if every keyword was answered live.
    pub async fn bulk_rank(
        &self,
        keywords: &[String],
        shop_name: &str,
    ) -> Sourced<Vec<RankResult>> {
        let live = self.live().is_some();
        let mut mode = self.effective_mode();
        let mut results = Vec::with_capacity(keywords.len());

        for (i, keyword) in keywords.iter().enumerate() {
            if live && i > 0 {
                self.pause().await;
            }
            let ranked = self.rank(keyword, shop_name).await;
            if ranked.mode == DataMode::Demo {
                mode = DataMode::Demo;
            }
            results.push(ranked.data);
        }

        Sourced {
            data: results,
            mode,
        }
    }

    /// Ranks for a scheduled monitoring run.
    ///
    /// Unlike [`Sourcing::bulk_rank`] a live failure is recorded in the
    /// result (`rank` -1 plus the error text) instead of being replaced by a
    /// made-up position.
    pub async fn monitor_ranks(&self, keywords: &[String], shop_name: &str) -> Vec<RankResult> {
        let Some(fetcher) = self.live() else {
            return keywords
                .iter()
                .map(|keyword| demo::rank(keyword, shop_name))
                .collect();
        };

        let mut results = Vec::with_capacity(keywords.len());
        for (i, keyword) in keywords.iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }
            let result = match fetcher.rank(keyword, shop_name).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(
                        keyword = %keyword,
                        error = %e,
                        "sourcing: monitoring check failed"
                    );
                    RankResult::failed(keyword.as_str(), e.to_string())
                }
            };
            results.push(result);
        }
        results
    }

    async fn pause(&self) {
        if !self.bulk_delay.is_zero() {
            tokio::time::sleep(self.bulk_delay).await;
        }
    }
}
