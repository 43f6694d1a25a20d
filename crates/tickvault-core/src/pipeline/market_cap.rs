use std::collections::BTreeMap;

use crate::provider::schema::RawMarketCap;
use crate::{IsoDate, PipelineError, Ticker};

use super::{DataPipeline, MARKET_CAP_WINDOW_DAYS};

impl DataPipeline {
    /// Market capitalization of `ticker` on `date`, gap-filled from neighbours.
    ///
    /// Not cached. Fetches ten days either side of `date`, lays the values on a
    /// complete daily calendar, forward-fills then back-fills, and reads `date`.
    /// `Ok(None)` means the provider returned dates but no values at all.
    pub async fn get_market_cap(
        &self,
        ticker: &Ticker,
        date: IsoDate,
    ) -> Result<Option<f64>, PipelineError> {
        let rows = self
            .provider
            .market_capitalization(
                ticker,
                date.add_days(-MARKET_CAP_WINDOW_DAYS),
                date.add_days(MARKET_CAP_WINDOW_DAYS),
            )
            .await?;

        let calendar = filled_calendar(&rows);
        match calendar.get(&date) {
            Some(value) => Ok(*value),
            None => Err(PipelineError::MarketCapLookup {
                ticker: ticker.to_string(),
                date,
            }),
        }
    }
}

/// Daily calendar from the earliest to the latest dated row, gaps filled
/// forward then backward. First row wins on a repeated date.
pub(crate) fn filled_calendar(rows: &[RawMarketCap]) -> BTreeMap<IsoDate, Option<f64>> {
    let mut observed: BTreeMap<IsoDate, Option<f64>> = BTreeMap::new();
    for row in rows {
        if let Some(day) = row.date.as_deref().and_then(IsoDate::parse_prefix) {
            observed.entry(day).or_insert(row.market_cap.get());
        }
    }

    let (Some(first), Some(last)) = (
        observed.keys().next().copied(),
        observed.keys().next_back().copied(),
    ) else {
        return BTreeMap::new();
    };

    let mut days = Vec::new();
    let mut cursor = Some(first);
    while let Some(day) = cursor.filter(|day| *day <= last) {
        days.push((day, observed.get(&day).copied().flatten()));
        cursor = day.next_day();
    }

    let mut carried = None;
    for (_, value) in days.iter_mut() {
        if value.is_some() {
            carried = *value;
        } else {
            *value = carried;
        }
    }

    let mut carried = None;
    for (_, value) in days.iter_mut().rev() {
        if value.is_some() {
            carried = *value;
        } else {
            *value = carried;
        }
    }

    days.into_iter().collect()
}
