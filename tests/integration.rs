//! End-to-end tests for the arbitrage scanner.
//!
//! These drive the full pipeline with canned quotes: mock feed -> engine ->
//! in-memory store -> HTTP API. The live-feed tests require network access
//! and a real ODDS_API_KEY and are ignored by default.
//! Run them with: cargo test --test integration -- --ignored

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tower::ServiceExt;

use surebet::api::{create_router, AppState};
use surebet::config::Config;
use surebet::error::{FeedError, ScannerError};
use surebet::feed::{MockFeedConfig, MockOddsSource, OddsApiClient, QuoteBuilder};
use surebet::scanner::Scanner;
use surebet::store::OddsStore;

fn test_config() -> Config {
    Config {
        odds_api_key: "test-key".to_string(),
        odds_api_url: "https://odds.invalid/v4".to_string(),
        sport_key: "basketball_nba".to_string(),
        regions: "us".to_string(),
        min_profit_percent: dec!(0.5),
        total_stake: dec!(1000),
        scan_interval_seconds: 300,
        database_path: ":memory:".to_string(),
        port: 8080,
        rust_log: "info".to_string(),
        verbose: false,
    }
}

/// Full pipeline: canned feed -> detection -> persistence -> HTTP API.
#[tokio::test]
async fn scan_pipeline_end_to_end() {
    let source = MockOddsSource::new();
    source.set_quotes(vec![
        // Arbitrageable event across two books.
        QuoteBuilder::new("evt-1").bookmaker("DraftKings").home(dec!(2.10)),
        QuoteBuilder::new("evt-1").bookmaker("FanDuel").away(dec!(2.05)),
        // Efficient market, no opportunity.
        QuoteBuilder::new("evt-2").bookmaker("BetMGM").home(dec!(1.91)),
        QuoteBuilder::new("evt-2").bookmaker("Caesars").away(dec!(1.91)),
    ]);

    let store = OddsStore::open_in_memory().unwrap();
    let scanner = Scanner::new(test_config(), store.clone());

    let quotes = source.fetch_quotes("basketball_nba").await.unwrap();
    let summary = scanner.process_quotes(quotes).unwrap();

    assert_eq!(summary.events_seen, 2);
    assert_eq!(summary.quotes_ingested, 4);
    assert_eq!(summary.opportunities.len(), 1);
    assert_eq!(summary.best_profit_percent, Some(dec!(3.60)));

    let opp = &summary.opportunities[0];
    assert_eq!(opp.stake_home, dec!(493.98));
    assert_eq!(opp.stake_away, dec!(506.02));
    assert_eq!(opp.guaranteed_profit, dec!(37.35));

    // Snapshot and opportunity were persisted.
    assert_eq!(store.quote_count().unwrap(), 4);
    assert_eq!(store.opportunity_count().unwrap(), 1);

    // The API serves the persisted history and the scan summary.
    let state = AppState::new(store);
    state.record_scan(summary).await;
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/opportunities")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let history: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["event_id"], "evt-1");
    assert_eq!(history[0]["bookmaker_home"], "DraftKings");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let status: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status["status"], "running");
    assert_eq!(status["totals"]["quotes"], 4);
    assert_eq!(status["last_scan"]["events_seen"], 2);
}

/// Repeated scans only append; history accumulates across cycles.
#[tokio::test]
async fn repeated_scans_accumulate_history() {
    let store = OddsStore::open_in_memory().unwrap();
    let scanner = Scanner::new(test_config(), store.clone());

    let quotes = vec![
        QuoteBuilder::new("evt-1").bookmaker("DraftKings").home(dec!(2.10)),
        QuoteBuilder::new("evt-1").bookmaker("FanDuel").away(dec!(2.05)),
    ];

    scanner.process_quotes(quotes.clone()).unwrap();
    scanner.process_quotes(quotes).unwrap();

    assert_eq!(store.quote_count().unwrap(), 4);
    assert_eq!(store.opportunity_count().unwrap(), 2);
    assert_eq!(store.opportunity_history(7).unwrap().len(), 2);
}

/// A failing feed surfaces the status code and nothing is persisted.
#[tokio::test]
async fn feed_failure_carries_status_code() {
    let source = MockOddsSource::with_config(MockFeedConfig {
        fail_fetch: true,
        fail_status: 503,
        ..Default::default()
    });

    let err = source.fetch_quotes("basketball_nba").await.unwrap_err();

    match err {
        FeedError::Unavailable { status } => assert_eq!(status, 503),
        other => panic!("unexpected error: {other}"),
    }
}

/// A malformed quote in the snapshot fails the scan with the offending
/// record instead of producing partial results.
#[tokio::test]
async fn malformed_quote_fails_scan() {
    let store = OddsStore::open_in_memory().unwrap();
    let scanner = Scanner::new(test_config(), store.clone());

    let quotes = vec![
        QuoteBuilder::new("evt-1").bookmaker("DraftKings").home(dec!(2.10)),
        QuoteBuilder::new("evt-1").bookmaker("FanDuel").away(dec!(0.5)),
    ];

    let err = scanner.process_quotes(quotes).unwrap_err();

    assert!(matches!(err, ScannerError::Quote(_)));
    assert_eq!(store.opportunity_count().unwrap(), 0);
}

/// Fetch a real snapshot from the provider.
#[tokio::test]
#[ignore = "requires network access and ODDS_API_KEY"]
async fn live_fetch_returns_quotes() {
    let config = match Config::load() {
        Ok(c) if c.validate().is_ok() => c,
        _ => {
            println!("Skipping: ODDS_API_KEY not set");
            return;
        }
    };

    let client = OddsApiClient::new(&config);

    let quotes = client.fetch_quotes(&config.sport_key).await.unwrap();
    println!("Fetched {} quotes for {}", quotes.len(), config.sport_key);

    for quote in quotes.iter().take(5) {
        println!(
            "  {} | {} on {} @ {}",
            quote.event_id, quote.bookmaker, quote.outcome, quote.decimal_odds
        );
    }

    // Every quote from the provider should pass validation.
    for quote in &quotes {
        quote.validate().unwrap();
    }
}

/// List the provider's sport catalog.
#[tokio::test]
#[ignore = "requires network access and ODDS_API_KEY"]
async fn live_sports_catalog() {
    let config = match Config::load() {
        Ok(c) if c.validate().is_ok() => c,
        _ => {
            println!("Skipping: ODDS_API_KEY not set");
            return;
        }
    };

    let client = OddsApiClient::new(&config);

    let sports = client.list_sports().await.unwrap();
    println!("Provider lists {} sports", sports.len());
    assert!(!sports.is_empty());
}
