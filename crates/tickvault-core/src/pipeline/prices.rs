use std::collections::HashSet;

use crate::cache::{decode_records, Dataset};
use crate::{normalize, IsoDate, PipelineError, PricePoint, Ticker};

use super::{check_range, in_range, DataPipeline};

impl DataPipeline {
    /// Daily prices for `ticker` within `[start, end]`, newest first.
    pub async fn get_prices(
        &self,
        ticker: &Ticker,
        start: IsoDate,
        end: IsoDate,
    ) -> Result<Vec<PricePoint>, PipelineError> {
        check_range(start, end)?;

        let rows = self.cache.get(Dataset::Prices, ticker.as_str()).await?;
        let cached = bound_prices(
            decode_records(Dataset::Prices, ticker.as_str(), rows),
            start,
            end,
        );
        if !cached.is_empty() {
            tracing::debug!(ticker = %ticker, points = cached.len(), "prices served from cache");
            return Ok(cached);
        }

        tracing::debug!(ticker = %ticker, %start, %end, "prices cache miss");
        let raw = self.provider.historical_prices(ticker, start, end).await?;
        let prices = bound_prices(normalize::price_points(&raw), start, end);
        if prices.is_empty() {
            return Ok(prices);
        }

        self.write_back(Dataset::Prices, ticker, &prices).await?;
        Ok(prices)
    }

    /// [`get_prices`](Self::get_prices) ordered oldest first.
    pub async fn get_price_data(
        &self,
        ticker: &Ticker,
        start: IsoDate,
        end: IsoDate,
    ) -> Result<Vec<PricePoint>, PipelineError> {
        let prices = self.get_prices(ticker, start, end).await?;
        Ok(price_frame(prices))
    }
}

/// Order points oldest first for time-series consumers.
pub fn price_frame(mut prices: Vec<PricePoint>) -> Vec<PricePoint> {
    prices.sort_by_key(|point| point.time);
    prices
}

/// Keep in-range points, first occurrence per date, newest first.
fn bound_prices(points: Vec<PricePoint>, start: IsoDate, end: IsoDate) -> Vec<PricePoint> {
    let mut seen = HashSet::new();
    let mut bounded = points
        .into_iter()
        .filter(|point| in_range(point.time, Some(start), end))
        .filter(|point| seen.insert(point.time))
        .collect::<Vec<_>>();
    bounded.sort_by(|a, b| b.time.cmp(&a.time));
    bounded
}
