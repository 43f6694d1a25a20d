use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ConfigError, FmpConfig};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{IsoDate, PeriodKind, Ticker, TimeFrame};

use super::schema::{
    RawEnterpriseValue, RawIncomeGrowth, RawIncomeStatement, RawInsiderTrade, RawIntradayBar,
    RawMarketCap, RawNewsArticle, RawPriceBar, RawRatingSnapshot, RawRatios, RawScreenerEntry,
};
use super::{collect_pages, MarketDataProvider, ProviderError, ProviderFuture, ScreenerQuery};

const INSIDER_PAGE_SIZE: usize = 1_000;

/// Financial Modeling Prep client over the `stable` REST API.
#[derive(Clone)]
pub struct FmpClient {
    config: FmpConfig,
    http_client: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for FmpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FmpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FmpClient {
    pub fn new(config: FmpConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Client configured from the environment over a real HTTP transport.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(
            FmpConfig::from_env()?,
            Arc::new(ReqwestHttpClient::new()),
        ))
    }

    pub fn config(&self) -> &FmpConfig {
        &self.config
    }

    async fn get_rows<T>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>, ProviderError>
    where
        T: DeserializeOwned,
    {
        let mut request = HttpRequest::get(self.config.endpoint(path));
        for (name, value) in query {
            request = request.with_query(name, value);
        }
        let request = request
            .with_query("apikey", &self.config.api_key)
            .with_timeout_ms(self.config.timeout_ms);

        tracing::debug!(url = %request.redacted_url(), "provider request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| ProviderError::transport(format!("{path}: {}", e.message())))?;

        if !response.is_success() {
            return Err(ProviderError::status(response.status, &response.body));
        }

        decode_rows(path, &response.body)
    }

    fn range_query(ticker: &Ticker, start: IsoDate, end: IsoDate) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", ticker.to_string()),
            ("from", start.to_string()),
            ("to", end.to_string()),
        ]
    }

    fn statement_query(ticker: &Ticker, period: PeriodKind, limit: usize) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", ticker.to_string()),
            ("period", period.provider_param().to_owned()),
            ("limit", limit.to_string()),
        ]
    }

    async fn news_pages(
        &self,
        path: &str,
        ticker: &Ticker,
        start: Option<IsoDate>,
        end: IsoDate,
    ) -> Result<Vec<RawNewsArticle>, ProviderError> {
        let page_size = self.config.news_page_limit;
        collect_pages(|page| {
            let mut query = vec![("symbols", ticker.to_string())];
            if let Some(start) = start {
                query.push(("from", start.to_string()));
            }
            query.push(("to", end.to_string()));
            query.push(("page", page.to_string()));
            query.push(("limit", page_size.to_string()));
            async move { self.get_rows::<RawNewsArticle>(path, &query).await }
        })
        .await
    }
}

/// Decode a JSON array body row by row.
///
/// The provider reports some failures as a 200 with an object body; those
/// become decode errors. An empty body or empty object means no data.
fn decode_rows<T>(path: &str, body: &str) -> Result<Vec<T>, ProviderError>
where
    T: DeserializeOwned,
{
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let payload: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::decode(format!("{path}: invalid JSON: {e}")))?;

    match payload {
        Value::Array(rows) => Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<T>(row) {
                Ok(parsed) => Some(parsed),
                Err(error) => {
                    tracing::warn!(path, %error, "skipping malformed provider row");
                    None
                }
            })
            .collect()),
        Value::Object(object) if object.is_empty() => Ok(Vec::new()),
        Value::Object(object) => {
            let message = object
                .get("Error Message")
                .or_else(|| object.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unexpected object payload");
            Err(ProviderError::decode(format!("{path}: {message}")))
        }
        Value::Null => Ok(Vec::new()),
        other => Err(ProviderError::decode(format!(
            "{path}: expected array payload, got {other}"
        ))),
    }
}

impl MarketDataProvider for FmpClient {
    fn historical_prices<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: IsoDate,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawPriceBar>> {
        Box::pin(async move {
            let query = Self::range_query(ticker, start, end);
            self.get_rows("historical-price-eod/full", &query).await
        })
    }

    fn historical_prices_group<'a>(
        &'a self,
        tickers: &'a [Ticker],
        start: IsoDate,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawPriceBar>> {
        Box::pin(async move {
            if tickers.is_empty() {
                return Ok(Vec::new());
            }
            let symbols = tickers
                .iter()
                .map(Ticker::as_str)
                .collect::<Vec<_>>()
                .join(",");
            let query = vec![
                ("symbol", symbols),
                ("from", start.to_string()),
                ("to", end.to_string()),
            ];
            self.get_rows("historical-price-eod/full", &query).await
        })
    }

    fn ratios<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        limit: usize,
    ) -> ProviderFuture<'a, Vec<RawRatios>> {
        Box::pin(async move {
            let query = Self::statement_query(ticker, period, limit);
            self.get_rows("ratios", &query).await
        })
    }

    fn income_statement_growth<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        limit: usize,
    ) -> ProviderFuture<'a, Vec<RawIncomeGrowth>> {
        Box::pin(async move {
            let query = Self::statement_query(ticker, period, limit);
            self.get_rows("income-statement-growth", &query).await
        })
    }

    fn enterprise_values<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        limit: usize,
    ) -> ProviderFuture<'a, Vec<RawEnterpriseValue>> {
        Box::pin(async move {
            let query = Self::statement_query(ticker, period, limit);
            self.get_rows("enterprise-values", &query).await
        })
    }

    fn income_statements<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        limit: usize,
    ) -> ProviderFuture<'a, Vec<RawIncomeStatement>> {
        Box::pin(async move {
            let query = Self::statement_query(ticker, period, limit);
            self.get_rows("income-statement", &query).await
        })
    }

    fn insider_trades<'a>(&'a self, ticker: &'a Ticker) -> ProviderFuture<'a, Vec<RawInsiderTrade>> {
        Box::pin(async move {
            collect_pages(|page| {
                let query = vec![
                    ("symbol", ticker.to_string()),
                    ("page", page.to_string()),
                    ("limit", INSIDER_PAGE_SIZE.to_string()),
                ];
                async move {
                    self.get_rows::<RawInsiderTrade>("insider-trading/search", &query)
                        .await
                }
            })
            .await
        })
    }

    fn company_news<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: Option<IsoDate>,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawNewsArticle>> {
        Box::pin(async move { self.news_pages("news/stock", ticker, start, end).await })
    }

    fn market_capitalization<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: IsoDate,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawMarketCap>> {
        Box::pin(async move {
            let query = Self::range_query(ticker, start, end);
            self.get_rows("historical-market-capitalization", &query)
                .await
        })
    }

    fn press_releases<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: Option<IsoDate>,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawNewsArticle>> {
        Box::pin(async move {
            self.news_pages("news/press-releases", ticker, start, end)
                .await
        })
    }

    fn rating_snapshot<'a>(
        &'a self,
        ticker: &'a Ticker,
    ) -> ProviderFuture<'a, Option<RawRatingSnapshot>> {
        Box::pin(async move {
            let query = vec![("symbol", ticker.to_string())];
            let rows: Vec<RawRatingSnapshot> = self.get_rows("ratings-snapshot", &query).await?;
            Ok(rows.into_iter().next())
        })
    }

    fn screener<'a>(&'a self, query: &'a ScreenerQuery) -> ProviderFuture<'a, Vec<RawScreenerEntry>> {
        Box::pin(async move {
            let mut params: Vec<(&str, String)> = Vec::new();
            if let Some(value) = query.market_cap_more_than {
                params.push(("marketCapMoreThan", value.to_string()));
            }
            if let Some(value) = query.market_cap_lower_than {
                params.push(("marketCapLowerThan", value.to_string()));
            }
            if let Some(value) = &query.sector {
                params.push(("sector", value.clone()));
            }
            if let Some(value) = &query.industry {
                params.push(("industry", value.clone()));
            }
            if let Some(value) = &query.exchange {
                params.push(("exchange", value.clone()));
            }
            if let Some(value) = query.volume_more_than {
                params.push(("volumeMoreThan", value.to_string()));
            }
            if let Some(value) = query.is_actively_trading {
                params.push(("isActivelyTrading", value.to_string()));
            }
            if let Some(value) = query.limit {
                params.push(("limit", value.to_string()));
            }
            self.get_rows("company-screener", &params).await
        })
    }

    fn intraday_chart<'a>(
        &'a self,
        ticker: &'a Ticker,
        timeframe: TimeFrame,
        start: IsoDate,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawIntradayBar>> {
        Box::pin(async move {
            let path = format!("historical-chart/{timeframe}");
            let query = Self::range_query(ticker, start, end);
            self.get_rows(&path, &query).await
        })
    }
}
