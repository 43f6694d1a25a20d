//! # Domain Models
//!
//! Canonical records produced by the fetch-normalize pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PricePoint`] | Daily OHLCV point |
//! | [`FinancialMetrics`] | Ratios, margins and growth for one report period |
//! | [`InsiderTrade`] | Reported insider transaction |
//! | [`CompanyNews`] | News article for a ticker |
//! | [`LineItem`] | Requested statement line items |
//! | [`Ticker`] | Validated ticker symbol |
//! | [`IsoDate`] | `YYYY-MM-DD` calendar date |
//!
//! Every record is `Serialize + Deserialize`; the cache keeps them as plain
//! JSON between calls.

mod date;
mod models;
mod ticker;

pub use date::IsoDate;
pub use models::{
    CompanyNews, FinancialMetrics, InsiderTrade, LineItem, PeriodKind, PricePoint, Rating,
    TimeFrame,
};
pub use ticker::Ticker;
