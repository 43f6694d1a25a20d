//! Behaviour tests for failure paths: provider errors, bad input, bad cache
//! rows and secret handling.

mod common;

use std::sync::Arc;

use serde_json::json;
use tickvault_core::{
    CacheStore, DataPipeline, Dataset, FmpClient, FmpConfig, HttpClient, HttpResponse,
    MarketDataProvider, MemoryCacheStore, PeriodKind, PipelineError, ProviderError,
    ProviderErrorKind, ScriptedHttpClient, Ticker, ValidationError,
};

use common::{date, ticker, FakeProvider};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn pipeline_over(provider: Arc<dyn MarketDataProvider>) -> (DataPipeline, Arc<MemoryCacheStore>) {
    let cache = Arc::new(MemoryCacheStore::new());
    let pipeline = DataPipeline::new(provider, Arc::clone(&cache) as Arc<dyn CacheStore>);
    (pipeline, cache)
}

// =============================================================================
// Provider failures
// =============================================================================

#[tokio::test]
async fn when_provider_fails_error_reaches_caller_and_cache_stays_empty() {
    init_tracing();
    let provider = Arc::new(FakeProvider::new().failing(ProviderError::transport("connection reset")));
    let (pipeline, cache) = pipeline_over(provider);

    let error = pipeline
        .get_prices(&ticker("AAPL"), date("2024-01-01"), date("2024-01-31"))
        .await
        .expect_err("must fail");

    match error {
        PipelineError::Provider(inner) => {
            assert_eq!(inner.kind(), ProviderErrorKind::Transport);
            assert_eq!(inner.code(), "provider.transport");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn when_one_statement_source_fails_metrics_fail() {
    init_tracing();
    let http = Arc::new(
        ScriptedHttpClient::new()
            .route_json("ratios", r#"[{"date":"2024-06-29","priceToEarningsRatio":30}]"#)
            .route("income-statement-growth", HttpResponse::with_status(500, "upstream down")),
    );
    let client = FmpClient::new(
        FmpConfig::new("secret-key").with_base_url("https://fmp.test/stable"),
        Arc::clone(&http) as Arc<dyn HttpClient>,
    );
    let (pipeline, cache) = pipeline_over(Arc::new(client));

    let error = pipeline
        .get_financial_metrics(&ticker("AAPL"), date("2024-12-31"), PeriodKind::Quarterly, 4)
        .await
        .expect_err("must fail");

    assert!(matches!(
        &error,
        PipelineError::Provider(inner) if inner.http_status() == Some(500)
    ));
    assert!(error.to_string().contains("upstream down"));
    assert!(!error.to_string().contains("secret-key"));
    // Sources are fetched in order; the failure stops the walk.
    assert_eq!(http.request_count(), 2);
    assert!(cache.is_empty().await);
}

// =============================================================================
// Input validation
// =============================================================================

#[tokio::test]
async fn inverted_range_is_rejected_before_any_io() {
    let provider = Arc::new(FakeProvider::new());
    let (pipeline, _cache) = pipeline_over(Arc::clone(&provider) as Arc<dyn MarketDataProvider>);

    let error = pipeline
        .get_prices(&ticker("AAPL"), date("2024-02-01"), date("2024-01-01"))
        .await
        .expect_err("must fail");

    assert!(matches!(
        error,
        PipelineError::Validation(ValidationError::InvertedRange { .. })
    ));
    assert_eq!(provider.call_count(), 0);
}

#[test]
fn malformed_tickers_and_dates_are_rejected() {
    assert!(matches!(Ticker::parse("   "), Err(ValidationError::EmptyTicker)));
    assert!(matches!(
        Ticker::parse("AAPL MSFT"),
        Err(ValidationError::TickerInvalidChar { ch: ' ', .. })
    ));
    assert!(matches!(
        "2024-13-01".parse::<tickvault_core::IsoDate>(),
        Err(ValidationError::InvalidDate { .. })
    ));
}

// =============================================================================
// Cache contents
// =============================================================================

#[tokio::test]
async fn undecodable_cached_rows_are_skipped() {
    init_tracing();
    let provider = Arc::new(FakeProvider::new());
    let (pipeline, cache) = pipeline_over(Arc::clone(&provider) as Arc<dyn MarketDataProvider>);
    cache
        .set(
            Dataset::Prices,
            "AAPL",
            vec![
                json!({"time": "2024-01-02"}),
                json!({"open": 1.0, "close": 2.0, "high": 3.0, "low": 0.5, "volume": 7, "time": "2024-01-03"}),
            ],
        )
        .await
        .expect("seed");

    let prices = pipeline
        .get_prices(&ticker("AAPL"), date("2024-01-01"), date("2024-01-31"))
        .await
        .expect("prices");

    assert_eq!(prices.len(), 1);
    assert_eq!(prices[0].volume, 7);
    assert_eq!(provider.call_count(), 0);
}

// =============================================================================
// Secrets
// =============================================================================

#[test]
fn provider_debug_output_hides_api_key() {
    let client = FmpClient::new(
        FmpConfig::new("very-secret"),
        Arc::new(ScriptedHttpClient::new()),
    );
    assert!(!format!("{client:?}").contains("very-secret"));
}

#[tokio::test]
async fn line_item_search_without_client_is_invalid_request() {
    let (pipeline, _cache) = pipeline_over(Arc::new(FakeProvider::new()));

    let error = pipeline
        .search_line_items(
            &ticker("AAPL"),
            &[String::from("revenue")],
            date("2024-06-30"),
            PeriodKind::TrailingTwelveMonths,
            5,
        )
        .await
        .expect_err("must fail");

    assert!(matches!(
        error,
        PipelineError::Provider(inner) if inner.kind() == ProviderErrorKind::InvalidRequest
    ));
}
