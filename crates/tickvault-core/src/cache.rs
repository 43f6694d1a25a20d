//! Per-ticker dataset cache.
//!
//! Records are stored as plain JSON values so that any backend can hold them
//! without knowing the typed schema. A bucket is addressed by a [`Dataset`] and
//! a ticker string; `set` replaces the whole bucket.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tickvault_warehouse::{Warehouse, WarehouseError};

/// Cache bucket kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Prices,
    FinancialMetrics,
    InsiderTrades,
    CompanyNews,
}

impl Dataset {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prices => "prices",
            Self::FinancialMetrics => "financial_metrics",
            Self::InsiderTrades => "insider_trades",
            Self::CompanyNews => "company_news",
        }
    }
}

impl Display for Dataset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache backend failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to encode {dataset} records for cache: {source}")]
    Encode {
        dataset: Dataset,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error("warehouse task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + Send + 'a>>;

/// Storage contract used by the pipeline.
pub trait CacheStore: Send + Sync {
    /// Every record cached for the bucket; an unknown bucket is empty.
    fn get<'a>(&'a self, dataset: Dataset, ticker: &'a str) -> CacheFuture<'a, Vec<Value>>;

    /// Replace the bucket with `records`.
    fn set<'a>(
        &'a self,
        dataset: Dataset,
        ticker: &'a str,
        records: Vec<Value>,
    ) -> CacheFuture<'a, ()>;
}

/// Process-local cache with no expiry.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    inner: Arc<tokio::sync::RwLock<HashMap<(Dataset, String), Vec<Value>>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-empty buckets.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

impl CacheStore for MemoryCacheStore {
    fn get<'a>(&'a self, dataset: Dataset, ticker: &'a str) -> CacheFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let store = self.inner.read().await;
            Ok(store
                .get(&(dataset, ticker.to_owned()))
                .cloned()
                .unwrap_or_default())
        })
    }

    fn set<'a>(
        &'a self,
        dataset: Dataset,
        ticker: &'a str,
        records: Vec<Value>,
    ) -> CacheFuture<'a, ()> {
        Box::pin(async move {
            let mut store = self.inner.write().await;
            store.insert((dataset, ticker.to_owned()), records);
            Ok(())
        })
    }
}

/// Durable cache backed by the DuckDB warehouse.
///
/// DuckDB calls block, so each one runs on the blocking thread pool.
#[derive(Clone)]
pub struct WarehouseCacheStore {
    warehouse: Warehouse,
}

impl WarehouseCacheStore {
    pub fn new(warehouse: Warehouse) -> Self {
        Self { warehouse }
    }

    pub fn open_default() -> Result<Self, CacheError> {
        Ok(Self::new(Warehouse::open_default()?))
    }

    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }
}

impl CacheStore for WarehouseCacheStore {
    fn get<'a>(&'a self, dataset: Dataset, ticker: &'a str) -> CacheFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let warehouse = self.warehouse.clone();
            let ticker = ticker.to_owned();
            let rows =
                tokio::task::spawn_blocking(move || warehouse.load(dataset.as_str(), &ticker))
                    .await??;
            Ok(rows)
        })
    }

    fn set<'a>(
        &'a self,
        dataset: Dataset,
        ticker: &'a str,
        records: Vec<Value>,
    ) -> CacheFuture<'a, ()> {
        Box::pin(async move {
            let warehouse = self.warehouse.clone();
            let ticker = ticker.to_owned();
            tokio::task::spawn_blocking(move || {
                warehouse.store(dataset.as_str(), &ticker, &records)
            })
            .await??;
            Ok(())
        })
    }
}

/// Encode typed records into the cache's plain form.
pub fn encode_records<T: Serialize>(
    dataset: Dataset,
    records: &[T],
) -> Result<Vec<Value>, CacheError> {
    records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| CacheError::Encode { dataset, source })
}

/// Decode cached rows, skipping any that no longer match the record shape.
pub fn decode_records<T>(dataset: Dataset, ticker: &str, rows: Vec<Value>) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!(%dataset, ticker, %error, "skipping undecodable cached row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_store_round_trips_bucket() {
        let store = MemoryCacheStore::new();
        let rows = vec![json!({"time": "2024-01-02", "close": 10.0})];

        store
            .set(Dataset::Prices, "AAPL", rows.clone())
            .await
            .expect("set");

        assert_eq!(store.get(Dataset::Prices, "AAPL").await.expect("get"), rows);
        assert!(store
            .get(Dataset::CompanyNews, "AAPL")
            .await
            .expect("get")
            .is_empty());
    }

    #[tokio::test]
    async fn memory_store_set_replaces_bucket() {
        let store = MemoryCacheStore::new();
        store
            .set(Dataset::Prices, "AAPL", vec![json!(1), json!(2)])
            .await
            .expect("set");
        store
            .set(Dataset::Prices, "AAPL", vec![json!(3)])
            .await
            .expect("set");

        assert_eq!(
            store.get(Dataset::Prices, "AAPL").await.expect("get"),
            vec![json!(3)]
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn warehouse_store_persists_across_instances() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = tickvault_warehouse::WarehouseConfig::with_home(temp.path());

        let first = WarehouseCacheStore::new(Warehouse::open(config.clone()).expect("open"));
        first
            .set(Dataset::InsiderTrades, "MSFT", vec![json!({"name": "A"})])
            .await
            .expect("set");
        drop(first);

        let second = WarehouseCacheStore::new(Warehouse::open(config).expect("reopen"));
        let rows = second
            .get(Dataset::InsiderTrades, "MSFT")
            .await
            .expect("get");
        assert_eq!(rows, vec![json!({"name": "A"})]);
    }

    #[test]
    fn decode_skips_mismatched_rows() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Row {
            value: i64,
        }

        let rows = vec![json!({"value": 1}), json!({"other": true}), json!({"value": 3})];
        let decoded: Vec<Row> = decode_records(Dataset::Prices, "AAPL", rows);
        assert_eq!(decoded, vec![Row { value: 1 }, Row { value: 3 }]);
    }
}
