//! Mock odds source and quote fixtures for unit testing.
//!
//! This module provides a canned-quote source that can stand in for the
//! provider client in tests without making network requests.

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use time::macros::datetime;
use time::OffsetDateTime;

use crate::error::FeedError;

use super::types::Quote;

/// Configuration for mock source behavior.
#[derive(Debug, Clone)]
pub struct MockFeedConfig {
    /// Whether fetches should fail.
    pub fail_fetch: bool,
    /// HTTP status to fail with.
    pub fail_status: u16,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

impl Default for MockFeedConfig {
    fn default() -> Self {
        Self {
            fail_fetch: false,
            fail_status: 503,
            latency_ms: 0,
        }
    }
}

/// Mock odds source serving canned quotes.
#[derive(Debug, Clone)]
pub struct MockOddsSource {
    /// Mock configuration.
    config: MockFeedConfig,
    /// Canned quotes returned by every fetch.
    quotes: Arc<Mutex<Vec<Quote>>>,
}

impl MockOddsSource {
    /// Create a mock source with default configuration and no quotes.
    pub fn new() -> Self {
        Self {
            config: MockFeedConfig::default(),
            quotes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock source with custom configuration.
    pub fn with_config(config: MockFeedConfig) -> Self {
        Self {
            config,
            quotes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the canned quotes.
    pub fn set_quotes(&self, quotes: Vec<Quote>) {
        *self.quotes.lock().unwrap() = quotes;
    }

    /// Append one canned quote.
    pub fn push_quote(&self, quote: Quote) {
        self.quotes.lock().unwrap().push(quote);
    }

    /// Return the canned quotes, honoring the configured failure mode.
    pub async fn fetch_quotes(&self, _sport_key: &str) -> Result<Vec<Quote>, FeedError> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        if self.config.fail_fetch {
            return Err(FeedError::Unavailable {
                status: self.config.fail_status,
            });
        }

        Ok(self.quotes.lock().unwrap().clone())
    }
}

impl Default for MockOddsSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for quote fixtures with sensible defaults.
#[derive(Debug, Clone)]
pub struct QuoteBuilder {
    event_id: String,
    home_team: String,
    away_team: String,
    start_time: OffsetDateTime,
    bookmaker: String,
    observed_at: OffsetDateTime,
}

impl QuoteBuilder {
    /// Start a builder for the given event.
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            home_team: "Celtics".to_string(),
            away_team: "Lakers".to_string(),
            start_time: datetime!(2026-03-01 19:00 UTC),
            bookmaker: "DraftKings".to_string(),
            observed_at: datetime!(2026-03-01 12:00 UTC),
        }
    }

    /// Set the team names.
    pub fn teams(mut self, home: impl Into<String>, away: impl Into<String>) -> Self {
        self.home_team = home.into();
        self.away_team = away.into();
        self
    }

    /// Set the bookmaker.
    pub fn bookmaker(mut self, bookmaker: impl Into<String>) -> Self {
        self.bookmaker = bookmaker.into();
        self
    }

    /// Set the event start time.
    pub fn start_time(mut self, start_time: OffsetDateTime) -> Self {
        self.start_time = start_time;
        self
    }

    /// Set the observation time.
    pub fn observed_at(mut self, observed_at: OffsetDateTime) -> Self {
        self.observed_at = observed_at;
        self
    }

    /// Build a quote on the home side.
    pub fn home(self, odds: Decimal) -> Quote {
        let outcome = self.home_team.clone();
        self.outcome(outcome, odds)
    }

    /// Build a quote on the away side.
    pub fn away(self, odds: Decimal) -> Quote {
        let outcome = self.away_team.clone();
        self.outcome(outcome, odds)
    }

    /// Build a quote for an arbitrary outcome name.
    pub fn outcome(self, outcome: impl Into<String>, odds: Decimal) -> Quote {
        Quote {
            event_id: self.event_id,
            home_team: self.home_team,
            away_team: self.away_team,
            start_time: self.start_time,
            bookmaker: self.bookmaker,
            outcome: outcome.into(),
            decimal_odds: odds,
            observed_at: self.observed_at,
        }
    }
}
