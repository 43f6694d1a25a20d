//! Provider contract and request helpers.
//!
//! [`MarketDataProvider`] is the fixed method surface the pipeline talks to.
//! Every method returns the provider's raw rows (see [`schema`]); turning them
//! into canonical records is the pipeline's job.
//!
//! | Method | Endpoint | Paginated |
//! |--------|----------|-----------|
//! | [`historical_prices`](MarketDataProvider::historical_prices) | daily EOD bars | no |
//! | [`historical_prices_group`](MarketDataProvider::historical_prices_group) | daily EOD bars, up to 5 symbols | no |
//! | [`ratios`](MarketDataProvider::ratios) | financial ratios | no |
//! | [`income_statement_growth`](MarketDataProvider::income_statement_growth) | growth rates | no |
//! | [`enterprise_values`](MarketDataProvider::enterprise_values) | market cap and EV | no |
//! | [`income_statements`](MarketDataProvider::income_statements) | income statement | no |
//! | [`insider_trades`](MarketDataProvider::insider_trades) | insider filings | yes |
//! | [`company_news`](MarketDataProvider::company_news) | stock news | yes |
//! | [`press_releases`](MarketDataProvider::press_releases) | press releases | yes |
//! | [`market_capitalization`](MarketDataProvider::market_capitalization) | daily market cap | no |
//! | [`rating_snapshot`](MarketDataProvider::rating_snapshot) | analyst rating | no |
//! | [`screener`](MarketDataProvider::screener) | company screener | no |
//! | [`intraday_chart`](MarketDataProvider::intraday_chart) | intraday bars | no |

pub mod fmp;
pub mod line_items;
pub mod schema;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{IsoDate, PeriodKind, Ticker, TimeFrame};

use self::schema::{
    RawEnterpriseValue, RawIncomeGrowth, RawIncomeStatement, RawInsiderTrade, RawIntradayBar,
    RawMarketCap, RawNewsArticle, RawPriceBar, RawRatingSnapshot, RawRatios, RawScreenerEntry,
};

pub use self::fmp::FmpClient;
pub use self::line_items::{LineItemClient, LineItemQuery};

/// Maximum symbols per batch price request.
pub const PRICE_GROUP_SIZE: usize = 5;

/// Page ceiling that stands in for "walk until the provider runs dry".
pub const MAX_PAGES: usize = 10_000;

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Transport,
    Status,
    Decode,
    InvalidRequest,
    Unsupported,
}

/// Structured provider error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    status: Option<u16>,
}

impl ProviderError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Transport,
            message: message.into(),
            status: None,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            kind: ProviderErrorKind::Status,
            message: format!("provider returned status {status}: {}", body.trim()),
            status: Some(status),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Decode,
            message: message.into(),
            status: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::InvalidRequest,
            message: message.into(),
            status: None,
        }
    }

    pub fn unsupported(operation: &str) -> Self {
        Self {
            kind: ProviderErrorKind::Unsupported,
            message: format!("operation '{operation}' is not supported by this provider"),
            status: None,
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn http_status(&self) -> Option<u16> {
        self.status
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::Transport => "provider.transport",
            ProviderErrorKind::Status => "provider.status",
            ProviderErrorKind::Decode => "provider.decode",
            ProviderErrorKind::InvalidRequest => "provider.invalid_request",
            ProviderErrorKind::Unsupported => "provider.unsupported",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

/// Screener filters; unset filters are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenerQuery {
    pub market_cap_more_than: Option<f64>,
    pub market_cap_lower_than: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub volume_more_than: Option<f64>,
    pub is_actively_trading: Option<bool>,
    pub limit: Option<usize>,
}

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Remote market-data surface consumed by the pipeline and analytics.
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars for `ticker` over the inclusive range.
    fn historical_prices<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: IsoDate,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawPriceBar>>;

    /// Daily bars for at most [`PRICE_GROUP_SIZE`] tickers in one request.
    ///
    /// The default walks the group one ticker at a time.
    fn historical_prices_group<'a>(
        &'a self,
        tickers: &'a [Ticker],
        start: IsoDate,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawPriceBar>> {
        Box::pin(async move {
            let mut rows = Vec::new();
            for ticker in tickers {
                let mut fetched = self.historical_prices(ticker, start, end).await?;
                for row in &mut fetched {
                    if row.symbol.is_none() {
                        row.symbol = Some(ticker.as_str().to_owned());
                    }
                }
                rows.extend(fetched);
            }
            Ok(rows)
        })
    }

    fn ratios<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        limit: usize,
    ) -> ProviderFuture<'a, Vec<RawRatios>>;

    fn income_statement_growth<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        limit: usize,
    ) -> ProviderFuture<'a, Vec<RawIncomeGrowth>>;

    fn enterprise_values<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        limit: usize,
    ) -> ProviderFuture<'a, Vec<RawEnterpriseValue>>;

    fn income_statements<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        limit: usize,
    ) -> ProviderFuture<'a, Vec<RawIncomeStatement>>;

    /// Every insider filing the provider holds for `ticker`.
    fn insider_trades<'a>(&'a self, ticker: &'a Ticker) -> ProviderFuture<'a, Vec<RawInsiderTrade>>;

    /// All news pages for `ticker`; no lower bound when `start` is `None`.
    fn company_news<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: Option<IsoDate>,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawNewsArticle>>;

    fn market_capitalization<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: IsoDate,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawMarketCap>>;

    fn press_releases<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: Option<IsoDate>,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawNewsArticle>> {
        let _ = (ticker, start, end);
        Box::pin(async { Err(ProviderError::unsupported("press_releases")) })
    }

    fn rating_snapshot<'a>(
        &'a self,
        ticker: &'a Ticker,
    ) -> ProviderFuture<'a, Option<RawRatingSnapshot>> {
        let _ = ticker;
        Box::pin(async { Err(ProviderError::unsupported("rating_snapshot")) })
    }

    fn screener<'a>(&'a self, query: &'a ScreenerQuery) -> ProviderFuture<'a, Vec<RawScreenerEntry>> {
        let _ = query;
        Box::pin(async { Err(ProviderError::unsupported("screener")) })
    }

    fn intraday_chart<'a>(
        &'a self,
        ticker: &'a Ticker,
        timeframe: TimeFrame,
        start: IsoDate,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawIntradayBar>> {
        let _ = (ticker, timeframe, start, end);
        Box::pin(async { Err(ProviderError::unsupported("intraday_chart")) })
    }
}

/// Fetch daily bars for many tickers in groups of [`PRICE_GROUP_SIZE`].
///
/// Groups run one after another. Rows are bucketed by their `symbol`; a row
/// without one is dropped. Returns `Ok(None)` as soon as any group comes back
/// empty.
pub async fn batch_historical_prices(
    provider: &dyn MarketDataProvider,
    tickers: &[Ticker],
    start: IsoDate,
    end: IsoDate,
) -> Result<Option<BTreeMap<String, Vec<RawPriceBar>>>, ProviderError> {
    let mut by_symbol: BTreeMap<String, Vec<RawPriceBar>> = BTreeMap::new();

    for group in tickers.chunks(PRICE_GROUP_SIZE) {
        let rows = provider.historical_prices_group(group, start, end).await?;
        if rows.is_empty() {
            tracing::debug!(
                group = ?group.iter().map(Ticker::as_str).collect::<Vec<_>>(),
                "price group returned no rows, abandoning batch"
            );
            return Ok(None);
        }

        for row in rows {
            match row.symbol.clone() {
                Some(symbol) => by_symbol.entry(symbol).or_default().push(row),
                None => tracing::debug!("dropping price row without symbol"),
            }
        }
    }

    Ok(Some(by_symbol))
}

/// Walk zero-based pages until one comes back empty or short.
///
/// A page is short when it holds fewer rows than the largest page seen so
/// far. The provider may cap pages below the requested size, so the
/// requested size never ends the walk on its own.
pub(crate) async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, ProviderError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ProviderError>>,
{
    let mut collected = Vec::new();
    let mut widest_page = 0;
    for page in 0..MAX_PAGES {
        let rows = fetch_page(page).await?;
        let fetched = rows.len();
        collected.extend(rows);
        tracing::debug!(page, fetched, total = collected.len(), "fetched page");

        if fetched == 0 || fetched < widest_page {
            return Ok(collected);
        }
        widest_page = fetched;
    }

    tracing::warn!(max_pages = MAX_PAGES, "pagination ceiling reached");
    Ok(collected)
}
