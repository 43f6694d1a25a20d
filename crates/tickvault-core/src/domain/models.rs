use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{IsoDate, ValidationError};

/// Reporting granularity requested from statement endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Quarterly,
    Annual,
    #[serde(rename = "ttm")]
    TrailingTwelveMonths,
}

impl PeriodKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
            Self::TrailingTwelveMonths => "ttm",
        }
    }

    /// Value of the provider's `period` query parameter.
    pub const fn provider_param(self) -> &'static str {
        match self {
            Self::Quarterly => "quarter",
            Self::Annual => "annual",
            Self::TrailingTwelveMonths => "ttm",
        }
    }
}

impl Display for PeriodKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quarterly" | "quarter" => Ok(Self::Quarterly),
            "annual" => Ok(Self::Annual),
            "ttm" => Ok(Self::TrailingTwelveMonths),
            other => Err(ValidationError::InvalidPeriod {
                value: other.to_owned(),
            }),
        }
    }
}

/// Daily OHLCV point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    pub time: IsoDate,
}

/// Canonical fundamentals snapshot for one report period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub ticker: String,
    pub report_period: IsoDate,
    pub period: String,
    pub currency: Option<String>,
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub price_to_earnings_ratio: Option<f64>,
    pub price_to_book_ratio: Option<f64>,
    pub price_to_sales_ratio: Option<f64>,
    pub enterprise_value_to_ebitda_ratio: Option<f64>,
    pub enterprise_value_to_revenue_ratio: Option<f64>,
    pub free_cash_flow_yield: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub return_on_invested_capital: Option<f64>,
    pub asset_turnover: Option<f64>,
    pub inventory_turnover: Option<f64>,
    pub receivables_turnover: Option<f64>,
    pub days_sales_outstanding: Option<f64>,
    pub operating_cycle: Option<f64>,
    pub working_capital_turnover: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub cash_ratio: Option<f64>,
    pub operating_cash_flow_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub debt_to_assets: Option<f64>,
    pub interest_coverage: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub book_value_growth: Option<f64>,
    pub earnings_per_share_growth: Option<f64>,
    pub free_cash_flow_growth: Option<f64>,
    pub operating_income_growth: Option<f64>,
    pub ebitda_growth: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub earnings_per_share: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub free_cash_flow_per_share: Option<f64>,
}

/// Reported insider transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderTrade {
    pub ticker: String,
    pub issuer: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub is_board_director: Option<bool>,
    pub transaction_date: Option<IsoDate>,
    pub transaction_shares: Option<f64>,
    pub transaction_price_per_share: Option<f64>,
    pub transaction_value: Option<f64>,
    pub shares_owned_before_transaction: Option<f64>,
    pub shares_owned_after_transaction: Option<f64>,
    pub security_title: Option<String>,
    pub filing_date: IsoDate,
}

impl InsiderTrade {
    /// Date used for range filters and ordering.
    pub fn effective_date(&self) -> IsoDate {
        self.transaction_date.unwrap_or(self.filing_date)
    }
}

/// News article mentioning a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyNews {
    pub ticker: String,
    pub title: String,
    pub author: String,
    pub source: String,
    /// Publish stamp exactly as the provider sent it.
    pub date: String,
    pub url: String,
    pub sentiment: Option<String>,
}

impl CompanyNews {
    pub fn publish_day(&self) -> Option<IsoDate> {
        IsoDate::parse_prefix(&self.date)
    }
}

/// One period of requested statement line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub ticker: String,
    pub report_period: String,
    pub period: String,
    pub currency: String,
    /// Requested line items, keyed by their snake_case name.
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl LineItem {
    pub fn value_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }
}

/// Provider analyst rating on a five-step scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    StrongSell = 1,
    Sell = 2,
    Hold = 3,
    Buy = 4,
    StrongBuy = 5,
}

impl Rating {
    pub fn from_score(score: i64) -> Result<Self, ValidationError> {
        match score {
            1 => Ok(Self::StrongSell),
            2 => Ok(Self::Sell),
            3 => Ok(Self::Hold),
            4 => Ok(Self::Buy),
            5 => Ok(Self::StrongBuy),
            other => Err(ValidationError::InvalidRating { score: other }),
        }
    }

    pub const fn score(self) -> i64 {
        self as i64
    }
}

/// Bar width accepted by the intraday chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "1min")]
    OneMinute,
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "1hour")]
    OneHour,
    #[serde(rename = "1day")]
    OneDay,
    #[serde(rename = "1week")]
    OneWeek,
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "1year")]
    OneYear,
}

impl TimeFrame {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1min",
            Self::FiveMinutes => "5min",
            Self::FifteenMinutes => "15min",
            Self::ThirtyMinutes => "30min",
            Self::OneHour => "1hour",
            Self::OneDay => "1day",
            Self::OneWeek => "1week",
            Self::OneMonth => "1month",
            Self::OneYear => "1year",
        }
    }

    /// Map a bar width in minutes onto a supported timeframe.
    ///
    /// Four-hour bars are not offered; the provider silently answers them with
    /// daily bars.
    pub const fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            1 => Some(Self::OneMinute),
            5 => Some(Self::FiveMinutes),
            15 => Some(Self::FifteenMinutes),
            30 => Some(Self::ThirtyMinutes),
            60 => Some(Self::OneHour),
            1_440 => Some(Self::OneDay),
            10_080 => Some(Self::OneWeek),
            43_200 => Some(Self::OneMonth),
            525_600 => Some(Self::OneYear),
            _ => None,
        }
    }
}

impl Display for TimeFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFrame {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let all = [
            Self::OneMinute,
            Self::FiveMinutes,
            Self::FifteenMinutes,
            Self::ThirtyMinutes,
            Self::OneHour,
            Self::OneDay,
            Self::OneWeek,
            Self::OneMonth,
            Self::OneYear,
        ];
        let wanted = value.trim();
        all.into_iter()
            .find(|frame| frame.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::InvalidTimeFrame {
                value: value.to_owned(),
            })
    }
}
