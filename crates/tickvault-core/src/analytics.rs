//! Price analytics: EMA, EMA percent-delta and cross-sectional ranking.
//!
//! The EMA uses `alpha = 2 / (period + 1)` and is seeded with the first close.
//! It is reported from the `period`-th observation onward; earlier values are
//! still computed because every later value depends on them.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::normalize;
use crate::provider::{MarketDataProvider, ProviderError};
use crate::{ComputationError, IsoDate, PricePoint, Ticker};

/// `(close - ema) / ema` on one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaPoint {
    pub date: IsoDate,
    pub delta: f64,
}

/// One ticker's delta on a ranking date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub ticker: String,
    pub delta: f64,
}

/// Largest and smallest deltas on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeMovers {
    pub date: IsoDate,
    pub top: Vec<Mover>,
    pub bottom: Vec<Mover>,
}

/// Recursive EMA over `closes`, one value per input.
pub fn ema(closes: &[f64], period: usize) -> Result<Vec<f64>, ComputationError> {
    if period == 0 {
        return Err(ComputationError::ZeroPeriod);
    }
    if closes.len() < period {
        return Err(ComputationError::InsufficientHistory {
            len: closes.len(),
            period,
        });
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(closes.len());
    let mut current = closes[0];
    values.push(current);
    for close in &closes[1..] {
        current = alpha * close + (1.0 - alpha) * current;
        values.push(current);
    }
    Ok(values)
}

/// Percent distance of each close from its EMA, ascending by date.
///
/// Input order does not matter; points are sorted by date first.
pub fn ema_delta_series(
    points: &[PricePoint],
    period: usize,
) -> Result<Vec<DeltaPoint>, ComputationError> {
    let mut ordered = points.to_vec();
    ordered.sort_by_key(|point| point.time);

    if let Some(bad) = ordered.iter().find(|point| !point.close.is_finite()) {
        return Err(ComputationError::NonFiniteClose { date: bad.time });
    }

    let closes = ordered.iter().map(|point| point.close).collect::<Vec<_>>();
    let averages = ema(&closes, period)?;

    let mut deltas = Vec::with_capacity(ordered.len() + 1 - period);
    for (point, average) in ordered.iter().zip(averages).skip(period - 1) {
        if average == 0.0 || !average.is_finite() {
            return Err(ComputationError::DegenerateEma {
                date: point.time,
                value: average,
            });
        }
        deltas.push(DeltaPoint {
            date: point.time,
            delta: (point.close - average) / average,
        });
    }
    Ok(deltas)
}

/// Fetch `ticker`'s daily closes and compute its EMA percent-delta series.
///
/// Provider failures propagate. Computation failures are logged and yield
/// `Ok(None)`.
pub async fn percent_ema_delta(
    provider: &dyn MarketDataProvider,
    ticker: &Ticker,
    start: IsoDate,
    end: IsoDate,
    period: usize,
) -> Result<Option<Vec<DeltaPoint>>, ProviderError> {
    let rows = provider.historical_prices(ticker, start, end).await?;
    let points = normalize::price_points(&rows);

    match ema_delta_series(&points, period) {
        Ok(series) => Ok(Some(series)),
        Err(error) => {
            tracing::warn!(ticker = %ticker, period, %error, "ema percent delta unavailable");
            Ok(None)
        }
    }
}

/// Rank every ticker's delta per date.
///
/// `count / 2` entries go to each side. Sorting is stable, so ties keep the
/// map's ticker order. NaN deltas are left out.
pub fn rank_extreme_movers(
    series: &BTreeMap<String, Vec<DeltaPoint>>,
    count: usize,
) -> Vec<ExtremeMovers> {
    let half = count / 2;
    let mut by_date: BTreeMap<IsoDate, Vec<Mover>> = BTreeMap::new();
    for (ticker, points) in series {
        for point in points.iter().filter(|point| !point.delta.is_nan()) {
            by_date.entry(point.date).or_default().push(Mover {
                ticker: ticker.clone(),
                delta: point.delta,
            });
        }
    }

    by_date
        .into_iter()
        .map(|(date, movers)| {
            let mut descending = movers.clone();
            descending.sort_by(|a, b| b.delta.partial_cmp(&a.delta).unwrap_or(Ordering::Equal));
            descending.truncate(half);

            let mut ascending = movers;
            ascending.sort_by(|a, b| a.delta.partial_cmp(&b.delta).unwrap_or(Ordering::Equal));
            ascending.truncate(half);

            ExtremeMovers {
                date,
                top: descending,
                bottom: ascending,
            }
        })
        .collect()
}

/// Compute each ticker's series one after another, then rank them.
///
/// Tickers whose series cannot be computed are skipped.
pub async fn ema_extreme_movers(
    provider: &dyn MarketDataProvider,
    tickers: &[Ticker],
    start: IsoDate,
    end: IsoDate,
    period: usize,
    count: usize,
) -> Result<Vec<ExtremeMovers>, ProviderError> {
    let mut series = BTreeMap::new();
    for ticker in tickers {
        if let Some(points) = percent_ema_delta(provider, ticker, start, end, period).await? {
            series.insert(ticker.as_str().to_owned(), points);
        }
    }
    tracing::debug!(
        requested = tickers.len(),
        computed = series.len(),
        "ranking ema deltas"
    );
    Ok(rank_extreme_movers(&series, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, close: f64) -> PricePoint {
        PricePoint {
            open: close,
            close,
            high: close,
            low: close,
            volume: 0,
            time: IsoDate::parse(date).expect("date"),
        }
    }

    #[test]
    fn ema_seeds_with_first_close() {
        let values = ema(&[10.0, 20.0, 30.0], 3).expect("ema");
        assert_eq!(values, vec![10.0, 15.0, 22.5]);
    }

    #[test]
    fn ema_rejects_short_history_and_zero_period() {
        assert_eq!(
            ema(&[1.0, 2.0], 3),
            Err(ComputationError::InsufficientHistory { len: 2, period: 3 })
        );
        assert_eq!(ema(&[1.0], 0), Err(ComputationError::ZeroPeriod));
    }

    #[test]
    fn delta_series_starts_at_period_and_sorts_input() {
        let points = vec![
            point("2024-01-03", 30.0),
            point("2024-01-01", 10.0),
            point("2024-01-02", 20.0),
        ];

        let series = ema_delta_series(&points, 2).expect("series");

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date.to_string(), "2024-01-02");
        // alpha = 2/3: ema = 10, 16.666.., 25.555..
        let ema2 = 10.0 + (2.0 / 3.0) * 10.0;
        assert!((series[0].delta - (20.0 - ema2) / ema2).abs() < 1e-12);
    }

    #[test]
    fn zero_ema_is_degenerate() {
        let points = vec![point("2024-01-01", 0.0), point("2024-01-02", 0.0)];
        assert!(matches!(
            ema_delta_series(&points, 1),
            Err(ComputationError::DegenerateEma { .. })
        ));
    }

    #[test]
    fn ranking_keeps_ticker_order_on_ties() {
        let date = IsoDate::parse("2024-01-02").expect("date");
        let mut series = BTreeMap::new();
        for (ticker, delta) in [("AAA", 0.1), ("BBB", 0.1), ("CCC", -0.2), ("DDD", 0.3)] {
            series.insert(ticker.to_owned(), vec![DeltaPoint { date, delta }]);
        }

        let ranked = rank_extreme_movers(&series, 4);

        assert_eq!(ranked.len(), 1);
        let top = ranked[0].top.iter().map(|m| m.ticker.as_str()).collect::<Vec<_>>();
        let bottom = ranked[0].bottom.iter().map(|m| m.ticker.as_str()).collect::<Vec<_>>();
        assert_eq!(top, vec!["DDD", "AAA"]);
        assert_eq!(bottom, vec!["CCC", "AAA"]);
    }
}
