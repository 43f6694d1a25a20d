//! Shared fixtures for the behaviour suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use tickvault_core::provider::schema::{
    RawEnterpriseValue, RawIncomeGrowth, RawIncomeStatement, RawInsiderTrade, RawMarketCap,
    RawNewsArticle, RawNumber, RawPriceBar, RawRatingSnapshot, RawRatios,
};
use tickvault_core::provider::ProviderFuture;
use tickvault_core::{IsoDate, MarketDataProvider, PeriodKind, ProviderError, Ticker};

pub fn date(value: &str) -> IsoDate {
    IsoDate::parse(value).expect("valid date")
}

pub fn ticker(value: &str) -> Ticker {
    Ticker::parse(value).expect("valid ticker")
}

pub fn price_row(day: &str, close: f64) -> RawPriceBar {
    RawPriceBar {
        symbol: None,
        date: Some(day.to_owned()),
        open: RawNumber::from(close - 1.0),
        high: RawNumber::from(close + 1.0),
        low: RawNumber::from(close - 2.0),
        close: RawNumber::from(close),
        volume: RawNumber::from(1_000.0),
    }
}

/// Ascending daily closes starting at `first_day`.
pub fn price_rows(first_day: &str, closes: &[f64]) -> Vec<RawPriceBar> {
    let start = date(first_day);
    closes
        .iter()
        .enumerate()
        .map(|(offset, close)| price_row(&start.add_days(offset as i64).to_string(), *close))
        .collect()
}

pub fn market_cap_row(day: &str, value: Option<f64>) -> RawMarketCap {
    RawMarketCap {
        symbol: None,
        date: Some(day.to_owned()),
        market_cap: RawNumber::new(value),
    }
}

/// In-process provider with canned rows and a call log.
#[derive(Default)]
pub struct FakeProvider {
    prices: HashMap<String, Vec<RawPriceBar>>,
    ratios: Vec<RawRatios>,
    growth: Vec<RawIncomeGrowth>,
    enterprise: Vec<RawEnterpriseValue>,
    income: Vec<RawIncomeStatement>,
    insider: Vec<RawInsiderTrade>,
    news: Vec<RawNewsArticle>,
    press_releases: Vec<RawNewsArticle>,
    market_caps: Vec<RawMarketCap>,
    rating: Option<RawRatingSnapshot>,
    failure: Option<ProviderError>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prices(mut self, ticker: &str, rows: Vec<RawPriceBar>) -> Self {
        self.prices.insert(ticker.to_owned(), rows);
        self
    }

    pub fn with_ratios(mut self, rows: Vec<RawRatios>) -> Self {
        self.ratios = rows;
        self
    }

    pub fn with_growth(mut self, rows: Vec<RawIncomeGrowth>) -> Self {
        self.growth = rows;
        self
    }

    pub fn with_enterprise_values(mut self, rows: Vec<RawEnterpriseValue>) -> Self {
        self.enterprise = rows;
        self
    }

    pub fn with_income_statements(mut self, rows: Vec<RawIncomeStatement>) -> Self {
        self.income = rows;
        self
    }

    pub fn with_insider_trades(mut self, rows: Vec<RawInsiderTrade>) -> Self {
        self.insider = rows;
        self
    }

    pub fn with_news(mut self, rows: Vec<RawNewsArticle>) -> Self {
        self.news = rows;
        self
    }

    pub fn with_press_releases(mut self, rows: Vec<RawNewsArticle>) -> Self {
        self.press_releases = rows;
        self
    }

    pub fn with_market_caps(mut self, rows: Vec<RawMarketCap>) -> Self {
        self.market_caps = rows;
        self
    }

    pub fn with_rating(mut self, snapshot: RawRatingSnapshot) -> Self {
        self.rating = Some(snapshot);
        self
    }

    /// Every call fails with `error`.
    pub fn failing(mut self, error: ProviderError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("call log lock").len()
    }

    fn record(&self, call: String) -> Result<(), ProviderError> {
        self.calls.lock().expect("call log lock").push(call);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl MarketDataProvider for FakeProvider {
    fn historical_prices<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: IsoDate,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawPriceBar>> {
        Box::pin(async move {
            self.record(format!("prices:{ticker}:{start}:{end}"))?;
            Ok(self.prices.get(ticker.as_str()).cloned().unwrap_or_default())
        })
    }

    fn ratios<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        _limit: usize,
    ) -> ProviderFuture<'a, Vec<RawRatios>> {
        Box::pin(async move {
            self.record(format!("ratios:{ticker}:{period}"))?;
            Ok(self.ratios.clone())
        })
    }

    fn income_statement_growth<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        _limit: usize,
    ) -> ProviderFuture<'a, Vec<RawIncomeGrowth>> {
        Box::pin(async move {
            self.record(format!("growth:{ticker}:{period}"))?;
            Ok(self.growth.clone())
        })
    }

    fn enterprise_values<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        _limit: usize,
    ) -> ProviderFuture<'a, Vec<RawEnterpriseValue>> {
        Box::pin(async move {
            self.record(format!("enterprise:{ticker}:{period}"))?;
            Ok(self.enterprise.clone())
        })
    }

    fn income_statements<'a>(
        &'a self,
        ticker: &'a Ticker,
        period: PeriodKind,
        _limit: usize,
    ) -> ProviderFuture<'a, Vec<RawIncomeStatement>> {
        Box::pin(async move {
            self.record(format!("income:{ticker}:{period}"))?;
            Ok(self.income.clone())
        })
    }

    fn insider_trades<'a>(&'a self, ticker: &'a Ticker) -> ProviderFuture<'a, Vec<RawInsiderTrade>> {
        Box::pin(async move {
            self.record(format!("insider:{ticker}"))?;
            Ok(self.insider.clone())
        })
    }

    fn company_news<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: Option<IsoDate>,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawNewsArticle>> {
        Box::pin(async move {
            let start = start.map_or_else(|| String::from("-"), |start| start.to_string());
            self.record(format!("news:{ticker}:{start}:{end}"))?;
            Ok(self.news.clone())
        })
    }

    fn press_releases<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: Option<IsoDate>,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawNewsArticle>> {
        Box::pin(async move {
            let start = start.map_or_else(|| String::from("-"), |start| start.to_string());
            self.record(format!("press:{ticker}:{start}:{end}"))?;
            Ok(self.press_releases.clone())
        })
    }

    fn market_capitalization<'a>(
        &'a self,
        ticker: &'a Ticker,
        start: IsoDate,
        end: IsoDate,
    ) -> ProviderFuture<'a, Vec<RawMarketCap>> {
        Box::pin(async move {
            self.record(format!("market_cap:{ticker}:{start}:{end}"))?;
            Ok(self.market_caps.clone())
        })
    }

    fn rating_snapshot<'a>(
        &'a self,
        ticker: &'a Ticker,
    ) -> ProviderFuture<'a, Option<RawRatingSnapshot>> {
        Box::pin(async move {
            self.record(format!("rating:{ticker}"))?;
            Ok(self.rating.clone())
        })
    }
}
