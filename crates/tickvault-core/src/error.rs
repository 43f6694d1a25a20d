use thiserror::Error;

use crate::cache::CacheError;
use crate::provider::ProviderError;
use crate::IsoDate;

/// Input validation errors exposed by `tickvault-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker must start with an ASCII letter: '{ch}'")]
    TickerInvalidStart { ch: char },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },
    #[error("share-class separator '{ch}' at index {index} must be followed by a letter or digit")]
    TickerDanglingSeparator { ch: char, index: usize },

    #[error("date must be ISO YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("date range start {start} is after end {end}")]
    InvertedRange { start: IsoDate, end: IsoDate },

    #[error("invalid period '{value}', expected one of quarterly, annual, ttm")]
    InvalidPeriod { value: String },
    #[error("invalid timeframe '{value}'")]
    InvalidTimeFrame { value: String },
    #[error("rating score {score} is outside 1..=5")]
    InvalidRating { score: i64 },
}

/// Failures while deriving analytics from a price series.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComputationError {
    #[error("ema period must be greater than zero")]
    ZeroPeriod,
    #[error("price history has {len} points, fewer than the ema period {period}")]
    InsufficientHistory { len: usize, period: usize },
    #[error("ema on {date} is {value}, cannot divide by it")]
    DegenerateEma { date: IsoDate, value: f64 },
    #[error("close on {date} is not finite")]
    NonFiniteClose { date: IsoDate },
}

/// Top-level error for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The requested date is not covered by the filled market-cap calendar.
    #[error("no market cap for {ticker} on {date}")]
    MarketCapLookup { ticker: String, date: IsoDate },
}
