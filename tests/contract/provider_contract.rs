//! Wire contract of the FMP client: paths, query parameters, pagination and
//! payload decoding, checked against a scripted transport.

use std::sync::Arc;

use serde_json::{json, Value};
use tickvault_core::{
    batch_historical_prices, FmpClient, FmpConfig, HttpClient, HttpResponse, IsoDate,
    MarketDataProvider, PeriodKind, ScreenerQuery, ScriptedHttpClient, Ticker, TimeFrame,
};

const BASE: &str = "https://fmp.test/stable";

fn client(http: &Arc<ScriptedHttpClient>) -> FmpClient {
    FmpClient::new(
        FmpConfig::new("contract-key").with_base_url(BASE),
        Arc::clone(http) as Arc<dyn HttpClient>,
    )
}

fn date(value: &str) -> IsoDate {
    IsoDate::parse(value).expect("valid date")
}

fn ticker(value: &str) -> Ticker {
    Ticker::parse(value).expect("valid ticker")
}

fn rows(count: usize, make: impl Fn(usize) -> Value) -> String {
    Value::Array((0..count).map(make).collect()).to_string()
}

#[tokio::test]
async fn every_request_carries_the_api_key() {
    let http = Arc::new(ScriptedHttpClient::new());
    let fmp = client(&http);
    let aapl = ticker("AAPL");

    fmp.historical_prices(&aapl, date("2024-01-01"), date("2024-01-31"))
        .await
        .expect("prices");
    fmp.market_capitalization(&aapl, date("2024-01-01"), date("2024-01-31"))
        .await
        .expect("market cap");
    fmp.ratios(&aapl, PeriodKind::Quarterly, 1_000)
        .await
        .expect("ratios");

    for request in http.requests() {
        assert_eq!(
            request.query_param("apikey").as_deref(),
            Some("contract-key"),
            "{}",
            request.redacted_url()
        );
        assert!(request.url.starts_with(BASE));
    }
}

#[tokio::test]
async fn statement_endpoints_use_period_and_limit() {
    let http = Arc::new(ScriptedHttpClient::new());
    let fmp = client(&http);
    let aapl = ticker("AAPL");

    fmp.ratios(&aapl, PeriodKind::Quarterly, 1_000).await.expect("ratios");
    fmp.income_statement_growth(&aapl, PeriodKind::Annual, 1_000)
        .await
        .expect("growth");
    fmp.enterprise_values(&aapl, PeriodKind::Quarterly, 1_000)
        .await
        .expect("enterprise");
    fmp.income_statements(&aapl, PeriodKind::Quarterly, 1_000)
        .await
        .expect("income");

    let requests = http.requests();
    let paths = requests
        .iter()
        .map(|r| {
            r.url
                .trim_start_matches(BASE)
                .split('?')
                .next()
                .unwrap_or_default()
                .to_owned()
        })
        .collect::<Vec<_>>();
    assert_eq!(
        paths,
        vec![
            "/ratios",
            "/income-statement-growth",
            "/enterprise-values",
            "/income-statement"
        ]
    );
    assert_eq!(requests[0].query_param("period").as_deref(), Some("quarter"));
    assert_eq!(requests[1].query_param("period").as_deref(), Some("annual"));
    assert!(requests
        .iter()
        .all(|r| r.query_param("limit").as_deref() == Some("1000")));
}

#[tokio::test]
async fn insider_trades_walk_pages_until_a_short_page() {
    let full_page = rows(1_000, |i| {
        json!({"symbol": "AAPL", "filingDate": "2024-01-02", "securitiesTransacted": i})
    });
    let short_page = rows(3, |_| json!({"symbol": "AAPL", "filingDate": "2024-01-03"}));
    let http = Arc::new(
        ScriptedHttpClient::new()
            .route_json("insider-trading/search?symbol=AAPL&page=0", full_page)
            .route_json("insider-trading/search?symbol=AAPL&page=1", short_page),
    );
    let fmp = client(&http);

    let trades = fmp.insider_trades(&ticker("AAPL")).await.expect("trades");

    assert_eq!(trades.len(), 1_003);
    assert_eq!(http.request_count(), 2);
    assert_eq!(http.requests()[1].query_param("limit").as_deref(), Some("1000"));
}

#[tokio::test]
async fn insider_trades_keep_walking_when_provider_caps_page_size() {
    let page = |count: usize| {
        rows(count, |i| {
            json!({"symbol": "AAPL", "filingDate": "2024-01-02", "securitiesTransacted": i})
        })
    };
    let http = Arc::new(
        ScriptedHttpClient::new()
            .route_json("insider-trading/search?symbol=AAPL&page=0", page(100))
            .route_json("insider-trading/search?symbol=AAPL&page=1", page(100))
            .route_json("insider-trading/search?symbol=AAPL&page=2", page(40)),
    );
    let fmp = client(&http);

    let trades = fmp.insider_trades(&ticker("AAPL")).await.expect("trades");

    // Pages come back at 100 rows although 1000 were asked for.
    assert_eq!(trades.len(), 240);
    assert_eq!(http.request_count(), 3);
    assert!(http
        .requests()
        .iter()
        .all(|r| r.query_param("limit").as_deref() == Some("1000")));
}

#[tokio::test]
async fn news_pages_use_configured_page_size() {
    let page = |title: &str| {
        rows(2, |i| {
            json!({"symbol": "AAPL", "publishedDate": "2024-01-05 10:00:00", "title": format!("{title}-{i}")})
        })
    };
    let http = Arc::new(
        ScriptedHttpClient::new()
            .route_json("news/stock?symbols=AAPL&from=2024-01-01&to=2024-01-31&page=0", page("a"))
            .route_json("news/stock?symbols=AAPL&from=2024-01-01&to=2024-01-31&page=1", page("b")),
    );
    let fmp = FmpClient::new(
        FmpConfig::new("contract-key")
            .with_base_url(BASE)
            .with_news_page_limit(2),
        Arc::clone(&http) as Arc<dyn HttpClient>,
    );

    let news = fmp
        .company_news(&ticker("AAPL"), Some(date("2024-01-01")), date("2024-01-31"))
        .await
        .expect("news");

    // Two full pages, then an empty third page ends the walk.
    assert_eq!(news.len(), 4);
    assert_eq!(http.request_count(), 3);
}

#[tokio::test]
async fn press_releases_use_their_own_path() {
    let http = Arc::new(ScriptedHttpClient::new().route_json(
        "news/press-releases",
        r#"[{"symbol":"AAPL","publishedDate":"2024-01-05 10:00:00","title":"Q1 results"}]"#,
    ));
    let fmp = client(&http);

    let releases = fmp
        .press_releases(&ticker("AAPL"), None, date("2024-01-31"))
        .await
        .expect("releases");

    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].title.as_deref(), Some("Q1 results"));
}

#[tokio::test]
async fn batch_prices_send_five_symbols_per_request() {
    let bars = |symbols: &[&str]| {
        Value::Array(
            symbols
                .iter()
                .map(|s| json!({"symbol": s, "date": "2024-01-02", "open": 1, "high": 1, "low": 1, "close": 1, "volume": 1}))
                .collect(),
        )
        .to_string()
    };
    let http = Arc::new(
        ScriptedHttpClient::new()
            .route_json("symbol=A%2CB%2CC%2CD%2CE&", bars(&["A", "B", "C", "D", "E"]))
            .route_json("symbol=F%2CG&", bars(&["F", "G"])),
    );
    let fmp = client(&http);
    let tickers = ["A", "B", "C", "D", "E", "F", "G"]
        .iter()
        .map(|s| ticker(s))
        .collect::<Vec<_>>();

    let grouped = batch_historical_prices(&fmp, &tickers, date("2024-01-01"), date("2024-01-31"))
        .await
        .expect("batch")
        .expect("all groups answered");

    assert_eq!(http.request_count(), 2);
    assert_eq!(
        http.requests()[0].query_param("symbol").as_deref(),
        Some("A,B,C,D,E")
    );
    assert_eq!(grouped.keys().cloned().collect::<Vec<_>>(), vec!["A", "B", "C", "D", "E", "F", "G"]);
}

#[tokio::test]
async fn batch_prices_stop_at_first_empty_group() {
    let http = Arc::new(ScriptedHttpClient::new());
    let fmp = client(&http);
    let tickers = ["A", "B", "C", "D", "E", "F"]
        .iter()
        .map(|s| ticker(s))
        .collect::<Vec<_>>();

    let grouped = batch_historical_prices(&fmp, &tickers, date("2024-01-01"), date("2024-01-31"))
        .await
        .expect("batch");

    assert!(grouped.is_none());
    assert_eq!(http.request_count(), 1);
}

#[tokio::test]
async fn rating_screener_and_intraday_endpoints() {
    let http = Arc::new(
        ScriptedHttpClient::new()
            .route_json("ratings-snapshot", r#"[{"symbol":"AAPL","rating":"A-","overallScore":4}]"#)
            .route_json(
                "company-screener",
                r#"[{"symbol":"AAPL","companyName":"Apple Inc.","marketCap":3.0e12,"sector":"Technology"}]"#,
            )
            .route_json(
                "historical-chart/5min",
                r#"[{"date":"2024-01-02 09:35:00","open":1,"high":2,"low":0.5,"close":1.5,"volume":10}]"#,
            ),
    );
    let fmp = client(&http);
    let aapl = ticker("AAPL");

    let rating = fmp.rating_snapshot(&aapl).await.expect("rating").expect("snapshot");
    assert_eq!(rating.overall_score.get(), Some(4.0));

    let query = ScreenerQuery {
        sector: Some(String::from("Technology")),
        market_cap_more_than: Some(1.0e12),
        limit: Some(5),
        ..ScreenerQuery::default()
    };
    let screened = fmp.screener(&query).await.expect("screener");
    assert_eq!(screened[0].company_name.as_deref(), Some("Apple Inc."));

    let frame = TimeFrame::from_minutes(5).expect("five minute bars");
    let bars = fmp
        .intraday_chart(&aapl, frame, date("2024-01-02"), date("2024-01-02"))
        .await
        .expect("intraday");
    assert_eq!(bars.len(), 1);

    let requests = http.requests();
    assert_eq!(requests[1].query_param("sector").as_deref(), Some("Technology"));
    assert_eq!(requests[1].query_param("marketCapMoreThan").as_deref(), Some("1000000000000"));
    assert_eq!(requests[1].query_param("limit").as_deref(), Some("5"));
    assert!(requests[2].url.contains("/historical-chart/5min?"));
}

#[tokio::test]
async fn unauthorized_response_is_a_status_error() {
    let http = Arc::new(ScriptedHttpClient::new().route(
        "historical-price-eod",
        HttpResponse::with_status(401, r#"{"Error Message":"Invalid API KEY."}"#),
    ));
    let fmp = client(&http);

    let error = fmp
        .historical_prices(&ticker("AAPL"), date("2024-01-01"), date("2024-01-31"))
        .await
        .expect_err("must fail");

    assert_eq!(error.code(), "provider.status");
    assert_eq!(error.http_status(), Some(401));
}
