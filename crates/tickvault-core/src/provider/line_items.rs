use std::sync::Arc;

use serde::Serialize;

use crate::config::{ConfigError, LineItemConfig};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{IsoDate, LineItem, PeriodKind, Ticker};

use super::schema::RawLineItemSearch;
use super::ProviderError;

/// Body of a line-item search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemQuery {
    pub tickers: Vec<Ticker>,
    pub line_items: Vec<String>,
    pub end_date: IsoDate,
    pub period: PeriodKind,
    pub limit: usize,
}

impl LineItemQuery {
    pub fn new(ticker: Ticker, line_items: Vec<String>, end_date: IsoDate) -> Self {
        Self {
            tickers: vec![ticker],
            line_items,
            end_date,
            period: PeriodKind::TrailingTwelveMonths,
            limit: 10,
        }
    }

    pub fn with_period(mut self, period: PeriodKind) -> Self {
        self.period = period;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Client for the statement line-item search service.
#[derive(Clone)]
pub struct LineItemClient {
    config: LineItemConfig,
    http_client: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for LineItemClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineItemClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LineItemClient {
    pub fn new(config: LineItemConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(
            LineItemConfig::from_env()?,
            Arc::new(ReqwestHttpClient::new()),
        ))
    }

    /// Run one search; the result never exceeds `query.limit` rows.
    pub async fn search(&self, query: &LineItemQuery) -> Result<Vec<LineItem>, ProviderError> {
        let auth = match &self.config.api_key {
            Some(key) => HttpAuth::Header {
                name: String::from("X-API-KEY"),
                value: key.clone(),
            },
            None => HttpAuth::None,
        };

        let request = HttpRequest::post(self.config.search_url())
            .with_auth(&auth)
            .with_timeout_ms(self.config.timeout_ms)
            .with_json_body(query)
            .map_err(|e| ProviderError::invalid_request(format!("line item query: {e}")))?;

        tracing::debug!(
            url = %request.url,
            tickers = query.tickers.len(),
            line_items = query.line_items.len(),
            "line item search"
        );

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| ProviderError::transport(format!("line item search: {}", e.message())))?;

        if !response.is_success() {
            return Err(ProviderError::status(response.status, &response.body));
        }

        let payload: RawLineItemSearch = serde_json::from_str(&response.body)
            .map_err(|e| ProviderError::decode(format!("line item search: {e}")))?;

        let mut items = payload
            .search_results
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<LineItem>(row) {
                Ok(item) => Some(item),
                Err(error) => {
                    tracing::warn!(%error, "skipping malformed line item");
                    None
                }
            })
            .collect::<Vec<_>>();
        items.truncate(query.limit);
        Ok(items)
    }
}
