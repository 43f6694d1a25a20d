//! Cache-backed fetch-normalize pipeline.
//!
//! Every cached operation follows the same shape:
//!
//! 1. load the `(dataset, ticker)` bucket from the [`CacheStore`]
//! 2. keep the records inside the requested range
//! 3. if any survive, sort and return them without calling the provider
//! 4. otherwise fetch the full range, normalize, bound, and write the result
//!    back when it is non-empty
//!
//! A hit on any overlap is a hit: a cache holding one day of a requested month
//! answers with that one day. Staleness is not tracked.

mod financials;
mod insider;
mod line_items;
mod market_cap;
mod news;
mod prices;
mod ratings;

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{encode_records, CacheStore, Dataset, MemoryCacheStore};
use crate::config::ConfigError;
use crate::provider::{FmpClient, LineItemClient, MarketDataProvider};
use crate::{IsoDate, PipelineError, Ticker, ValidationError};

pub use prices::price_frame;

/// Quarterly rows requested from each statement endpoint.
pub const STATEMENT_FETCH_LIMIT: usize = 1_000;

/// Provider market-cap window on each side of the requested date, in days.
pub const MARKET_CAP_WINDOW_DAYS: i64 = 10;

/// Entry point for every data operation.
#[derive(Clone)]
pub struct DataPipeline {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<dyn CacheStore>,
    line_items: Option<LineItemClient>,
}

impl std::fmt::Debug for DataPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataPipeline")
            .field("line_items", &self.line_items)
            .finish_non_exhaustive()
    }
}

impl DataPipeline {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            provider,
            cache,
            line_items: None,
        }
    }

    pub fn with_line_items(mut self, client: LineItemClient) -> Self {
        self.line_items = Some(client);
        self
    }

    /// FMP over reqwest with an in-process cache, configured from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = FmpClient::from_env()?;
        let line_items = LineItemClient::from_env()?;
        Ok(Self::new(Arc::new(provider), Arc::new(MemoryCacheStore::new())).with_line_items(line_items))
    }

    pub fn provider(&self) -> &dyn MarketDataProvider {
        self.provider.as_ref()
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    async fn write_back<T: Serialize>(
        &self,
        dataset: Dataset,
        ticker: &Ticker,
        records: &[T],
    ) -> Result<(), PipelineError> {
        let rows = encode_records(dataset, records)?;
        self.cache.set(dataset, ticker.as_str(), rows).await?;
        tracing::info!(%dataset, ticker = %ticker, records = records.len(), "cache updated");
        Ok(())
    }
}

fn check_range(start: IsoDate, end: IsoDate) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::InvertedRange { start, end });
    }
    Ok(())
}

fn in_range(date: IsoDate, start: Option<IsoDate>, end: IsoDate) -> bool {
    start.map_or(true, |start| date >= start) && date <= end
}
