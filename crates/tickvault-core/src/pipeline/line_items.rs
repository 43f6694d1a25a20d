use crate::provider::{LineItemQuery, ProviderError};
use crate::{IsoDate, LineItem, PeriodKind, PipelineError, Ticker};

use super::DataPipeline;

impl DataPipeline {
    /// Search statement line items for `ticker`. Bypasses the cache.
    pub async fn search_line_items(
        &self,
        ticker: &Ticker,
        line_items: &[String],
        end: IsoDate,
        period: PeriodKind,
        limit: usize,
    ) -> Result<Vec<LineItem>, PipelineError> {
        let client = self.line_items.as_ref().ok_or_else(|| {
            ProviderError::invalid_request("line item search client is not configured")
        })?;

        let query = LineItemQuery::new(ticker.clone(), line_items.to_vec(), end)
            .with_period(period)
            .with_limit(limit);
        Ok(client.search(&query).await?)
    }
}
