use std::collections::BTreeMap;

use crate::cache::{decode_records, Dataset};
use crate::normalize::{self, merge_statement_rows, StatementSnapshot};
use crate::{FinancialMetrics, IsoDate, PeriodKind, PipelineError, Ticker};

use super::{DataPipeline, STATEMENT_FETCH_LIMIT};

impl DataPipeline {
    /// Up to `limit` fundamentals snapshots reported on or before `end`, newest first.
    ///
    /// Statements are always fetched quarterly; `period` is recorded in logs
    /// only and every record carries the provider's own period label.
    pub async fn get_financial_metrics(
        &self,
        ticker: &Ticker,
        end: IsoDate,
        period: PeriodKind,
        limit: usize,
    ) -> Result<Vec<FinancialMetrics>, PipelineError> {
        let rows = self
            .cache
            .get(Dataset::FinancialMetrics, ticker.as_str())
            .await?;
        let cached = bound_metrics(
            decode_records(Dataset::FinancialMetrics, ticker.as_str(), rows),
            end,
            limit,
        );
        if !cached.is_empty() {
            tracing::debug!(ticker = %ticker, records = cached.len(), "financial metrics served from cache");
            return Ok(cached);
        }

        tracing::debug!(ticker = %ticker, %end, %period, "financial metrics cache miss");
        let quarterly = PeriodKind::Quarterly;
        let ratios = self
            .provider
            .ratios(ticker, quarterly, STATEMENT_FETCH_LIMIT)
            .await?;
        let growth = self
            .provider
            .income_statement_growth(ticker, quarterly, STATEMENT_FETCH_LIMIT)
            .await?;
        let enterprise = self
            .provider
            .enterprise_values(ticker, quarterly, STATEMENT_FETCH_LIMIT)
            .await?;
        let income = self
            .provider
            .income_statements(ticker, quarterly, STATEMENT_FETCH_LIMIT)
            .await?;

        // Order matters: a later source overwrites fields an earlier one set.
        let mut merged: BTreeMap<String, StatementSnapshot> = BTreeMap::new();
        merge_statement_rows(&mut merged, &ratios);
        merge_statement_rows(&mut merged, &growth);
        merge_statement_rows(&mut merged, &enterprise);
        merge_statement_rows(&mut merged, &income);

        let metrics = merged
            .values()
            .filter_map(|snapshot| normalize::financial_metrics(ticker.as_str(), snapshot))
            .collect::<Vec<_>>();
        let metrics = bound_metrics(metrics, end, limit);
        if metrics.is_empty() {
            return Ok(metrics);
        }

        self.write_back(Dataset::FinancialMetrics, ticker, &metrics)
            .await?;
        Ok(metrics)
    }
}

/// Filter to `report_period <= end`, sort newest first, then truncate.
fn bound_metrics(
    metrics: Vec<FinancialMetrics>,
    end: IsoDate,
    limit: usize,
) -> Vec<FinancialMetrics> {
    let mut bounded = metrics
        .into_iter()
        .filter(|metric| metric.report_period <= end)
        .collect::<Vec<_>>();
    bounded.sort_by(|a, b| b.report_period.cmp(&a.report_period));
    bounded.truncate(limit);
    bounded
}
