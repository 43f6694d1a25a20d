//! # Tickvault Warehouse
//!
//! DuckDB-backed durable store for normalized dataset records.
//!
//! Each `(dataset, ticker)` pair owns exactly one row holding the JSON array of
//! records last written for it. Writes replace the whole bucket; nothing expires.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use tickvault_warehouse::{Warehouse, WarehouseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open(WarehouseConfig::default())?;
//!
//!     warehouse.store("prices", "AAPL", &[json!({"time": "2024-01-02", "close": 185.6})])?;
//!     let rows = warehouse.load("prices", "AAPL")?;
//!     assert_eq!(rows.len(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `dataset_cache` | One JSON payload per dataset and ticker |
//! | `schema_migrations` | Applied migration versions |

pub mod duckdb;
pub mod migrations;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::{Connection, ToSql};
use serde_json::Value;
use thiserror::Error;

pub use duckdb::{ConnectionPool, PooledConnection};

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error while preparing the database directory.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Records could not be encoded to JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored payload is not a JSON array.
    #[error("payload for {dataset}/{ticker} is corrupt: {reason}")]
    CorruptPayload {
        dataset: String,
        ticker: String,
        reason: String,
    },
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for tickvault data.
    pub tickvault_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let tickvault_home = resolve_tickvault_home();
        let db_path = tickvault_home.join("cache").join("warehouse.duckdb");
        Self {
            tickvault_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

impl WarehouseConfig {
    /// Place the database under `home/cache/warehouse.duckdb`.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let tickvault_home = home.into();
        let db_path = tickvault_home.join("cache").join("warehouse.duckdb");
        Self {
            tickvault_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

/// Bookkeeping for one stored bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub dataset: String,
    pub ticker: String,
    pub row_count: i64,
    pub updated_at: String,
}

/// Durable dataset store.
#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    pool: ConnectionPool,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open (creating if needed) the database described by `config` and migrate it.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::open(config.db_path.clone(), config.max_pool_size)?;
        let warehouse = Self { config, pool };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply pending schema migrations.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Read the records stored for `dataset`/`ticker`; an unknown bucket is empty.
    pub fn load(&self, dataset: &str, ticker: &str) -> Result<Vec<Value>, WarehouseError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection
            .prepare("SELECT payload FROM dataset_cache WHERE dataset = ? AND ticker = ?")?;
        let params: [&dyn ToSql; 2] = [&dataset, &ticker];
        let mut rows = statement.query(params.as_slice())?;

        let Some(row) = rows.next()? else {
            return Ok(Vec::new());
        };
        let payload: String = row.get(0)?;

        match serde_json::from_str::<Value>(&payload) {
            Ok(Value::Array(records)) => Ok(records),
            Ok(other) => Err(WarehouseError::CorruptPayload {
                dataset: dataset.to_owned(),
                ticker: ticker.to_owned(),
                reason: format!("expected array, found {}", json_kind(&other)),
            }),
            Err(error) => Err(WarehouseError::CorruptPayload {
                dataset: dataset.to_owned(),
                ticker: ticker.to_owned(),
                reason: error.to_string(),
            }),
        }
    }

    /// Replace the records stored for `dataset`/`ticker`.
    ///
    /// All values are bound as parameters; the whole replacement runs in one
    /// transaction.
    pub fn store(&self, dataset: &str, ticker: &str, rows: &[Value]) -> Result<(), WarehouseError> {
        let payload = serde_json::to_string(rows)?;
        let row_count = i64::try_from(rows.len()).unwrap_or(i64::MAX);

        let connection = self.pool.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            let params: [&dyn ToSql; 2] = [&dataset, &ticker];
            connection.execute(
                "DELETE FROM dataset_cache WHERE dataset = ? AND ticker = ?",
                params.as_slice(),
            )?;

            let params: [&dyn ToSql; 4] = [&dataset, &ticker, &payload, &row_count];
            connection.execute(
                "INSERT INTO dataset_cache (dataset, ticker, payload, row_count, updated_at) \
                 VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)",
                params.as_slice(),
            )?;
            Ok(())
        })();

        finalize_transaction(&connection, result)
    }

    /// List every bucket stored for `ticker`, ordered by dataset name.
    pub fn datasets_for(&self, ticker: &str) -> Result<Vec<DatasetSummary>, WarehouseError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection.prepare(
            "SELECT dataset, ticker, row_count, CAST(updated_at AS VARCHAR) \
             FROM dataset_cache WHERE ticker = ? ORDER BY dataset",
        )?;
        let rows = statement.query_map([ticker], |row| {
            Ok(DatasetSummary {
                dataset: row.get(0)?,
                ticker: row.get(1)?,
                row_count: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })?;

        let mut summaries = Vec::new();
        for summary in rows {
            summaries.push(summary?);
        }
        Ok(summaries)
    }
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolve the tickvault home directory from environment or default.
fn resolve_tickvault_home() -> PathBuf {
    if let Some(path) = env::var_os("TICKVAULT_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".tickvault");
    }

    PathBuf::from(".tickvault")
}
