//! Raw provider rows to canonical records.
//!
//! Derived fields (EV/EBITDA, insider transaction value, post-transaction share
//! count) are computed here, once, while the record is built.

use std::collections::BTreeMap;

use crate::provider::schema::{
    RawEnterpriseValue, RawIncomeGrowth, RawIncomeStatement, RawInsiderTrade, RawNewsArticle,
    RawPriceBar, RawRatios,
};
use crate::{CompanyNews, FinancialMetrics, InsiderTrade, IsoDate, PricePoint};

/// Build a price point; rows missing their date or any OHLC value are dropped.
pub fn price_point(row: &RawPriceBar) -> Option<PricePoint> {
    let time = row.date.as_deref().and_then(IsoDate::parse_prefix)?;
    Some(PricePoint {
        open: row.open.get()?,
        close: row.close.get()?,
        high: row.high.get()?,
        low: row.low.get()?,
        volume: row
            .volume
            .get()
            .filter(|volume| *volume >= 0.0)
            .map_or(0, |volume| volume.round() as u64),
        time,
    })
}

pub fn price_points(rows: &[RawPriceBar]) -> Vec<PricePoint> {
    rows.iter().filter_map(price_point).collect()
}

/// Build an insider trade; rows without a filing date are dropped.
pub fn insider_trade(ticker: &str, row: &RawInsiderTrade) -> Option<InsiderTrade> {
    let filing_date = row.filing_date.as_deref().and_then(IsoDate::parse_prefix)?;
    let shares = row.securities_transacted.get();
    let price = row.price.get();
    let before = row.securities_owned.get();
    let disposed = row
        .acquisition_or_disposition
        .as_deref()
        .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("D"));

    let after = match (before, shares) {
        (Some(before), Some(shares)) if disposed => Some(before - shares),
        (Some(before), Some(shares)) => Some(before + shares),
        _ => None,
    };

    Some(InsiderTrade {
        ticker: row.symbol.clone().unwrap_or_else(|| ticker.to_owned()),
        issuer: None,
        name: row.reporting_name.clone(),
        title: row.type_of_owner.clone(),
        is_board_director: row
            .type_of_owner
            .as_deref()
            .map(|owner| owner.trim().eq_ignore_ascii_case("director")),
        transaction_date: row.transaction_date.as_deref().and_then(IsoDate::parse_prefix),
        transaction_shares: shares,
        transaction_price_per_share: price,
        transaction_value: shares.zip(price).map(|(shares, price)| shares * price),
        shares_owned_before_transaction: before,
        shares_owned_after_transaction: after,
        security_title: row.security_name.clone(),
        filing_date,
    })
}

/// Build a news record; absent text fields become empty strings.
pub fn company_news(ticker: &str, row: &RawNewsArticle) -> CompanyNews {
    CompanyNews {
        ticker: ticker.to_owned(),
        title: row.title.clone().unwrap_or_default(),
        author: row.publisher.clone().unwrap_or_default(),
        source: row.site.clone().unwrap_or_default(),
        date: row.published_date.clone().unwrap_or_default(),
        url: row.url.clone().unwrap_or_default(),
        sentiment: None,
    }
}

/// Statement fields accumulated across the four quarterly sources for one date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementSnapshot {
    pub symbol: Option<String>,
    pub date: String,
    pub period: Option<String>,
    pub reported_currency: Option<String>,
    pub price_to_earnings_ratio: Option<f64>,
    pub price_to_book_ratio: Option<f64>,
    pub price_to_sales_ratio: Option<f64>,
    pub price_to_earnings_growth_ratio: Option<f64>,
    pub gross_profit_margin: Option<f64>,
    pub operating_profit_margin: Option<f64>,
    pub net_profit_margin: Option<f64>,
    pub asset_turnover: Option<f64>,
    pub inventory_turnover: Option<f64>,
    pub receivables_turnover: Option<f64>,
    pub working_capital_turnover_ratio: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub cash_ratio: Option<f64>,
    pub operating_cash_flow_ratio: Option<f64>,
    pub debt_to_equity_ratio: Option<f64>,
    pub debt_to_assets_ratio: Option<f64>,
    pub interest_coverage_ratio: Option<f64>,
    pub dividend_payout_ratio: Option<f64>,
    pub net_income_per_share: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub free_cash_flow_per_share: Option<f64>,
    pub growth_revenue: Option<f64>,
    pub growth_net_income: Option<f64>,
    pub growth_eps_diluted: Option<f64>,
    pub growth_operating_income: Option<f64>,
    pub growth_ebitda: Option<f64>,
    pub market_capitalization: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub ebitda: Option<f64>,
    pub eps: Option<f64>,
    pub eps_diluted: Option<f64>,
}

/// A source row that can be folded into a [`StatementSnapshot`].
pub trait StatementRow {
    fn date(&self) -> Option<&str>;

    /// Copy every present field over the snapshot.
    fn merge_into(&self, snapshot: &mut StatementSnapshot);
}

fn put<T: Clone>(slot: &mut Option<T>, value: Option<&T>) {
    if let Some(value) = value {
        *slot = Some(value.clone());
    }
}

fn put_num(slot: &mut Option<f64>, value: Option<f64>) {
    if value.is_some() {
        *slot = value;
    }
}

impl StatementRow for RawRatios {
    fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    fn merge_into(&self, s: &mut StatementSnapshot) {
        put(&mut s.symbol, self.symbol.as_ref());
        put(&mut s.period, self.period.as_ref());
        put(&mut s.reported_currency, self.reported_currency.as_ref());
        put_num(&mut s.price_to_earnings_ratio, self.price_to_earnings_ratio.get());
        put_num(&mut s.price_to_book_ratio, self.price_to_book_ratio.get());
        put_num(&mut s.price_to_sales_ratio, self.price_to_sales_ratio.get());
        put_num(
            &mut s.price_to_earnings_growth_ratio,
            self.price_to_earnings_growth_ratio.get(),
        );
        put_num(&mut s.gross_profit_margin, self.gross_profit_margin.get());
        put_num(&mut s.operating_profit_margin, self.operating_profit_margin.get());
        put_num(&mut s.net_profit_margin, self.net_profit_margin.get());
        put_num(&mut s.asset_turnover, self.asset_turnover.get());
        put_num(&mut s.inventory_turnover, self.inventory_turnover.get());
        put_num(&mut s.receivables_turnover, self.receivables_turnover.get());
        put_num(
            &mut s.working_capital_turnover_ratio,
            self.working_capital_turnover_ratio.get(),
        );
        put_num(&mut s.current_ratio, self.current_ratio.get());
        put_num(&mut s.quick_ratio, self.quick_ratio.get());
        put_num(&mut s.cash_ratio, self.cash_ratio.get());
        put_num(&mut s.operating_cash_flow_ratio, self.operating_cash_flow_ratio.get());
        put_num(&mut s.debt_to_equity_ratio, self.debt_to_equity_ratio.get());
        put_num(&mut s.debt_to_assets_ratio, self.debt_to_assets_ratio.get());
        put_num(&mut s.interest_coverage_ratio, self.interest_coverage_ratio.get());
        put_num(&mut s.dividend_payout_ratio, self.dividend_payout_ratio.get());
        put_num(&mut s.net_income_per_share, self.net_income_per_share.get());
        put_num(&mut s.book_value_per_share, self.book_value_per_share.get());
        put_num(&mut s.free_cash_flow_per_share, self.free_cash_flow_per_share.get());
    }
}

impl StatementRow for RawIncomeGrowth {
    fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    fn merge_into(&self, s: &mut StatementSnapshot) {
        put(&mut s.symbol, self.symbol.as_ref());
        put(&mut s.period, self.period.as_ref());
        put(&mut s.reported_currency, self.reported_currency.as_ref());
        put_num(&mut s.growth_revenue, self.growth_revenue.get());
        put_num(&mut s.growth_net_income, self.growth_net_income.get());
        put_num(&mut s.growth_eps_diluted, self.growth_eps_diluted.get());
        put_num(&mut s.growth_operating_income, self.growth_operating_income.get());
        put_num(&mut s.growth_ebitda, self.growth_ebitda.get());
    }
}

impl StatementRow for RawEnterpriseValue {
    fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    fn merge_into(&self, s: &mut StatementSnapshot) {
        put(&mut s.symbol, self.symbol.as_ref());
        put_num(&mut s.market_capitalization, self.market_capitalization.get());
        put_num(&mut s.enterprise_value, self.enterprise_value.get());
    }
}

impl StatementRow for RawIncomeStatement {
    fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    fn merge_into(&self, s: &mut StatementSnapshot) {
        put(&mut s.symbol, self.symbol.as_ref());
        put(&mut s.period, self.period.as_ref());
        put(&mut s.reported_currency, self.reported_currency.as_ref());
        put_num(&mut s.ebitda, self.ebitda.get());
        put_num(&mut s.eps, self.eps.get());
        put_num(&mut s.eps_diluted, self.eps_diluted.get());
    }
}

/// Fold one source into the per-date map. Rows without a date are ignored.
pub fn merge_statement_rows<R: StatementRow>(
    merged: &mut BTreeMap<String, StatementSnapshot>,
    rows: &[R],
) {
    for row in rows {
        let Some(date) = row.date() else {
            continue;
        };
        let snapshot = merged
            .entry(date.to_owned())
            .or_insert_with(|| StatementSnapshot {
                date: date.to_owned(),
                ..StatementSnapshot::default()
            });
        row.merge_into(snapshot);
    }
}

/// EV/EBITDA when both operands are present, finite and EBITDA is non-zero.
pub fn ev_to_ebitda(enterprise_value: Option<f64>, ebitda: Option<f64>) -> Option<f64> {
    let (ev, ebitda) = enterprise_value.zip(ebitda)?;
    if !ev.is_finite() || !ebitda.is_finite() || ebitda == 0.0 {
        return None;
    }
    Some(ev / ebitda)
}

/// Build the canonical record; snapshots whose date does not parse are dropped.
pub fn financial_metrics(ticker: &str, s: &StatementSnapshot) -> Option<FinancialMetrics> {
    let report_period = IsoDate::parse_prefix(&s.date)?;
    Some(FinancialMetrics {
        ticker: s.symbol.clone().unwrap_or_else(|| ticker.to_owned()),
        report_period,
        period: s.period.clone().unwrap_or_default(),
        currency: s.reported_currency.clone(),
        market_cap: s.market_capitalization,
        enterprise_value: s.enterprise_value,
        price_to_earnings_ratio: s.price_to_earnings_ratio,
        price_to_book_ratio: s.price_to_book_ratio,
        price_to_sales_ratio: s.price_to_sales_ratio,
        enterprise_value_to_ebitda_ratio: ev_to_ebitda(s.enterprise_value, s.ebitda),
        enterprise_value_to_revenue_ratio: None,
        free_cash_flow_yield: None,
        peg_ratio: s.price_to_earnings_growth_ratio,
        gross_margin: s.gross_profit_margin,
        operating_margin: s.operating_profit_margin,
        net_margin: s.net_profit_margin,
        return_on_equity: None,
        return_on_assets: None,
        return_on_invested_capital: None,
        asset_turnover: s.asset_turnover,
        inventory_turnover: s.inventory_turnover,
        receivables_turnover: s.receivables_turnover,
        days_sales_outstanding: None,
        operating_cycle: None,
        working_capital_turnover: s.working_capital_turnover_ratio,
        current_ratio: s.current_ratio,
        quick_ratio: s.quick_ratio,
        cash_ratio: s.cash_ratio,
        operating_cash_flow_ratio: s.operating_cash_flow_ratio,
        debt_to_equity: s.debt_to_equity_ratio,
        debt_to_assets: s.debt_to_assets_ratio,
        interest_coverage: s.interest_coverage_ratio,
        revenue_growth: s.growth_revenue,
        earnings_growth: s.growth_net_income,
        book_value_growth: None,
        earnings_per_share_growth: s.growth_eps_diluted,
        free_cash_flow_growth: None,
        operating_income_growth: s.growth_operating_income,
        ebitda_growth: s.growth_ebitda,
        payout_ratio: s.dividend_payout_ratio,
        earnings_per_share: s.eps_diluted.or(s.eps).or(s.net_income_per_share),
        book_value_per_share: s.book_value_per_share,
        free_cash_flow_per_share: s.free_cash_flow_per_share,
    })
}
