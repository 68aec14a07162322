//! Odds provider API client.

use time::OffsetDateTime;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::FeedError;

use super::types::{FeedEvent, Quote, SportInfo};

/// Market key for head-to-head (moneyline) quotes.
pub const H2H_MARKET: &str = "h2h";

/// Odds format requested from the provider.
const ODDS_FORMAT: &str = "decimal";

/// Quota header the provider attaches to every response.
const QUOTA_HEADER: &str = "x-requests-remaining";

/// HTTP client for the odds provider.
#[derive(Debug, Clone)]
pub struct OddsApiClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL for the odds API.
    base_url: String,
    /// Provider API key.
    api_key: String,
    /// Bookmaker regions to request.
    regions: String,
}

impl OddsApiClient {
    /// Create a new client from config.
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(5))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to create HTTP client");

        Self {
            http,
            base_url: config.odds_api_url.trim_end_matches('/').to_string(),
            api_key: config.odds_api_key.clone(),
            regions: config.regions.clone(),
        }
    }

    /// Fetch current head-to-head quotes for a sport.
    ///
    /// A non-success status surfaces as [`FeedError::Unavailable`] tagged
    /// with the status code; there is no retry at this layer.
    #[instrument(skip(self), fields(sport = %sport_key))]
    pub async fn fetch_quotes(&self, sport_key: &str) -> Result<Vec<Quote>, FeedError> {
        let url = format!("{}/sports/{}/odds", self.base_url, sport_key);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", self.regions.as_str()),
                ("markets", H2H_MARKET),
                ("oddsFormat", ODDS_FORMAT),
            ])
            .send()
            .await?;

        self.log_quota(&response);

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Unavailable {
                status: status.as_u16(),
            });
        }

        let events: Vec<FeedEvent> = response
            .json()
            .await
            .map_err(|e| FeedError::ParseError(format!("failed to parse odds response: {e}")))?;

        let observed_at = OffsetDateTime::now_utc();
        let quotes = flatten_events(events, observed_at);

        debug!(quotes = quotes.len(), "Fetched quote snapshot");

        Ok(quotes)
    }

    /// List the provider's sport catalog.
    #[instrument(skip(self))]
    pub async fn list_sports(&self) -> Result<Vec<SportInfo>, FeedError> {
        let url = format!("{}/sports", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Unavailable {
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| FeedError::ParseError(format!("failed to parse sports list: {e}")))
    }

    /// Log how many requests the provider quota has left.
    fn log_quota(&self, response: &reqwest::Response) {
        match response
            .headers()
            .get(QUOTA_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            Some(remaining) => debug!(remaining = %remaining, "Provider request quota"),
            None => warn!("Provider response missing quota header"),
        }
    }
}

/// Flatten the provider's nested events into quote records, keeping only the
/// head-to-head market.
pub fn flatten_events(events: Vec<FeedEvent>, observed_at: OffsetDateTime) -> Vec<Quote> {
    let mut quotes = Vec::new();

    for event in events {
        for bookmaker in &event.bookmakers {
            for market in &bookmaker.markets {
                if market.key != H2H_MARKET {
                    continue;
                }

                for outcome in &market.outcomes {
                    quotes.push(Quote {
                        event_id: event.id.clone(),
                        home_team: event.home_team.clone(),
                        away_team: event.away_team.clone(),
                        start_time: event.commence_time,
                        bookmaker: bookmaker.title.clone(),
                        outcome: outcome.name.clone(),
                        decimal_odds: outcome.price,
                        observed_at,
                    });
                }
            }
        }
    }

    quotes
}
