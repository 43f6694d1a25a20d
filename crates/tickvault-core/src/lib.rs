//! # Tickvault Core
//!
//! Cache-backed access to equity market data.
//!
//! ## Overview
//!
//! This crate fetches prices, fundamentals, insider trades and news for equity
//! tickers from a market-data provider, normalizes the provider's JSON into
//! typed records, and caches the records per ticker so repeated queries stay
//! off the network.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`analytics`] | EMA, EMA percent-delta and extreme-mover ranking |
//! | [`cache`] | Cache contract plus in-memory and warehouse backends |
//! | [`config`] | Environment-driven provider configuration |
//! | [`domain`] | Canonical records (PricePoint, FinancialMetrics, ...) |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`normalize`] | Raw provider rows to canonical records |
//! | [`pipeline`] | Fetch-normalize operations |
//! | [`provider`] | Provider contract and the FMP client |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tickvault_core::{DataPipeline, IsoDate, Ticker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = DataPipeline::from_env()?;
//!     let ticker = Ticker::parse("AAPL")?;
//!
//!     let prices = pipeline
//!         .get_prices(&ticker, IsoDate::parse("2024-01-01")?, IsoDate::parse("2024-01-31")?)
//!         .await?;
//!
//!     for point in &prices {
//!         println!("{}: {:.2}", point.time, point.close);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │  DataPipeline   │────▶│   Cache Store    │
//! └────────┬────────┘     │ (memory/duckdb)  │
//!          │              └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ MarketData      │────▶│ HTTP Client      │
//! │ Provider (FMP)  │     │ (reqwest/script) │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   normalize     │
//! │ (raw → domain)  │
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Pipeline operations return [`PipelineError`]; provider failures keep their
//! classification:
//!
//! ```rust
//! use tickvault_core::{PipelineError, ProviderErrorKind};
//!
//! fn describe(error: &PipelineError) -> &'static str {
//!     match error {
//!         PipelineError::Provider(e) if e.kind() == ProviderErrorKind::Status => "rejected",
//!         PipelineError::Provider(_) => "unreachable",
//!         PipelineError::Validation(_) => "bad input",
//!         _ => "other",
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API keys come from the environment and are redacted from `Debug` output
//! - Logged request URLs have the `apikey` parameter masked

pub mod analytics;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod normalize;
pub mod pipeline;
pub mod provider;

// Analytics
pub use analytics::{
    ema, ema_delta_series, ema_extreme_movers, percent_ema_delta, rank_extreme_movers,
    DeltaPoint, ExtremeMovers, Mover,
};

// Caching
pub use cache::{CacheError, CacheStore, Dataset, MemoryCacheStore, WarehouseCacheStore};

// Configuration
pub use config::{ConfigError, FmpConfig, LineItemConfig};

// Domain models
pub use domain::{
    CompanyNews, FinancialMetrics, InsiderTrade, IsoDate, LineItem, PeriodKind, PricePoint,
    Rating, Ticker, TimeFrame,
};

// Error types
pub use error::{ComputationError, PipelineError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};

// Pipeline
pub use pipeline::{price_frame, DataPipeline};

// Provider
pub use provider::{
    batch_historical_prices, FmpClient, LineItemClient, LineItemQuery, MarketDataProvider,
    ProviderError, ProviderErrorKind, ScreenerQuery,
};

// Warehouse (re-exported from tickvault-warehouse)
pub use tickvault_warehouse::{Warehouse, WarehouseConfig, WarehouseError};
