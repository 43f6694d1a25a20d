use crate::cache::{decode_records, Dataset};
use crate::{normalize, InsiderTrade, IsoDate, PipelineError, Ticker};

use super::{check_range, in_range, DataPipeline};

impl DataPipeline {
    /// Insider trades dated within the range, newest first, at most `limit`.
    ///
    /// A trade is dated by its transaction date, or its filing date when the
    /// transaction date is missing.
    pub async fn get_insider_trades(
        &self,
        ticker: &Ticker,
        end: IsoDate,
        start: Option<IsoDate>,
        limit: usize,
    ) -> Result<Vec<InsiderTrade>, PipelineError> {
        if let Some(start) = start {
            check_range(start, end)?;
        }

        let rows = self
            .cache
            .get(Dataset::InsiderTrades, ticker.as_str())
            .await?;
        let cached = bound_trades(
            decode_records(Dataset::InsiderTrades, ticker.as_str(), rows),
            start,
            end,
            limit,
        );
        if !cached.is_empty() {
            tracing::debug!(ticker = %ticker, trades = cached.len(), "insider trades served from cache");
            return Ok(cached);
        }

        tracing::debug!(ticker = %ticker, "insider trades cache miss");
        let raw = self.provider.insider_trades(ticker).await?;
        let trades = raw
            .iter()
            .filter_map(|row| normalize::insider_trade(ticker.as_str(), row))
            .collect::<Vec<_>>();
        let trades = bound_trades(trades, start, end, limit);
        if trades.is_empty() {
            return Ok(trades);
        }

        self.write_back(Dataset::InsiderTrades, ticker, &trades)
            .await?;
        Ok(trades)
    }
}

fn bound_trades(
    trades: Vec<InsiderTrade>,
    start: Option<IsoDate>,
    end: IsoDate,
    limit: usize,
) -> Vec<InsiderTrade> {
    let mut bounded = trades
        .into_iter()
        .filter(|trade| in_range(trade.effective_date(), start, end))
        .collect::<Vec<_>>();
    bounded.sort_by(|a, b| b.effective_date().cmp(&a.effective_date()));
    bounded.truncate(limit);
    bounded
}
