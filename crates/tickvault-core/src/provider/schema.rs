//! Raw row shapes for every provider endpoint consumed by the pipeline.
//!
//! Each struct declares the provider keys it reads. Unknown keys are ignored.
//! Missing, `null` and unparseable values all land as `None` for that field, so
//! one bad cell never rejects a whole payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Numeric cell that tolerates strings, nulls and junk.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawNumber(Option<f64>);

impl RawNumber {
    pub const fn new(value: Option<f64>) -> Self {
        Self(value)
    }

    pub const fn get(self) -> Option<f64> {
        self.0
    }
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        Self(Some(value))
    }
}

impl<'de> Deserialize<'de> for RawNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let parsed = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(Self(parsed.filter(|v| v.is_finite())))
    }
}

impl Serialize for RawNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// `historical-price-eod/full` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriceBar {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub open: RawNumber,
    #[serde(default)]
    pub high: RawNumber,
    #[serde(default)]
    pub low: RawNumber,
    #[serde(default)]
    pub close: RawNumber,
    #[serde(default)]
    pub volume: RawNumber,
}

/// `historical-chart/{timeframe}` row. `date` carries a time of day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIntradayBar {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub open: RawNumber,
    #[serde(default)]
    pub high: RawNumber,
    #[serde(default)]
    pub low: RawNumber,
    #[serde(default)]
    pub close: RawNumber,
    #[serde(default)]
    pub volume: RawNumber,
}

/// `historical-market-capitalization` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarketCap {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub market_cap: RawNumber,
}

/// `insider-trading/search` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInsiderTrade {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub filing_date: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub reporting_name: Option<String>,
    #[serde(default)]
    pub type_of_owner: Option<String>,
    #[serde(default)]
    pub acquisition_or_disposition: Option<String>,
    #[serde(default)]
    pub securities_transacted: RawNumber,
    #[serde(default)]
    pub securities_owned: RawNumber,
    #[serde(default)]
    pub price: RawNumber,
    #[serde(default)]
    pub security_name: Option<String>,
}

/// `news/stock` and `news/press-releases` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNewsArticle {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// `ratios` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRatios {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub reported_currency: Option<String>,
    #[serde(default)]
    pub price_to_earnings_ratio: RawNumber,
    #[serde(default)]
    pub price_to_book_ratio: RawNumber,
    #[serde(default)]
    pub price_to_sales_ratio: RawNumber,
    #[serde(default)]
    pub price_to_earnings_growth_ratio: RawNumber,
    #[serde(default)]
    pub gross_profit_margin: RawNumber,
    #[serde(default)]
    pub operating_profit_margin: RawNumber,
    #[serde(default)]
    pub net_profit_margin: RawNumber,
    #[serde(default)]
    pub asset_turnover: RawNumber,
    #[serde(default)]
    pub inventory_turnover: RawNumber,
    #[serde(default)]
    pub receivables_turnover: RawNumber,
    #[serde(default)]
    pub working_capital_turnover_ratio: RawNumber,
    #[serde(default)]
    pub current_ratio: RawNumber,
    #[serde(default)]
    pub quick_ratio: RawNumber,
    #[serde(default)]
    pub cash_ratio: RawNumber,
    #[serde(default)]
    pub operating_cash_flow_ratio: RawNumber,
    #[serde(default)]
    pub debt_to_equity_ratio: RawNumber,
    #[serde(default)]
    pub debt_to_assets_ratio: RawNumber,
    #[serde(default)]
    pub interest_coverage_ratio: RawNumber,
    #[serde(default)]
    pub dividend_payout_ratio: RawNumber,
    #[serde(default)]
    pub net_income_per_share: RawNumber,
    #[serde(default)]
    pub book_value_per_share: RawNumber,
    #[serde(default)]
    pub free_cash_flow_per_share: RawNumber,
}

/// `income-statement-growth` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIncomeGrowth {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub reported_currency: Option<String>,
    #[serde(default)]
    pub growth_revenue: RawNumber,
    #[serde(default)]
    pub growth_net_income: RawNumber,
    #[serde(default, rename = "growthEPSDiluted")]
    pub growth_eps_diluted: RawNumber,
    #[serde(default)]
    pub growth_operating_income: RawNumber,
    #[serde(default, rename = "growthEBITDA")]
    pub growth_ebitda: RawNumber,
}

/// `enterprise-values` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnterpriseValue {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub market_capitalization: RawNumber,
    #[serde(default)]
    pub enterprise_value: RawNumber,
}

/// `income-statement` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIncomeStatement {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub reported_currency: Option<String>,
    #[serde(default)]
    pub revenue: RawNumber,
    #[serde(default)]
    pub ebitda: RawNumber,
    #[serde(default)]
    pub net_income: RawNumber,
    #[serde(default)]
    pub eps: RawNumber,
    #[serde(default)]
    pub eps_diluted: RawNumber,
}

/// `ratings-snapshot` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRatingSnapshot {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub overall_score: RawNumber,
}

/// `company-screener` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScreenerEntry {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub market_cap: RawNumber,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub price: RawNumber,
    #[serde(default)]
    pub volume: RawNumber,
    #[serde(default)]
    pub exchange_short_name: Option<String>,
}

/// Line-item search response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLineItemSearch {
    #[serde(default)]
    pub search_results: Vec<Value>,
}
