//! Quote record and raw provider response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::QuoteError;

/// A single bookmaker price for one outcome of one event.
///
/// Quotes are immutable once recorded; each scan appends a fresh snapshot
/// rather than updating prior rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Provider event identifier.
    pub event_id: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// When the event starts.
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// Bookmaker that posted the price.
    pub bookmaker: String,
    /// Outcome the price is for (team name in head-to-head markets).
    pub outcome: String,
    /// Decimal odds. Invariant: greater than 1.0.
    pub decimal_odds: Decimal,
    /// When the price was fetched.
    #[serde(with = "time::serde::rfc3339")]
    pub observed_at: OffsetDateTime,
}

impl Quote {
    /// Check the record invariants, naming the offending field on failure.
    pub fn validate(&self) -> Result<(), QuoteError> {
        if self.event_id.trim().is_empty() {
            return Err(QuoteError::MissingField {
                event_id: self.event_id.clone(),
                field: "event_id",
            });
        }

        if self.bookmaker.trim().is_empty() {
            return Err(QuoteError::MissingField {
                event_id: self.event_id.clone(),
                field: "bookmaker",
            });
        }

        if self.outcome.trim().is_empty() {
            return Err(QuoteError::MissingField {
                event_id: self.event_id.clone(),
                field: "outcome",
            });
        }

        if self.decimal_odds <= Decimal::ONE {
            return Err(QuoteError::OddsNotAboveOne {
                event_id: self.event_id.clone(),
                bookmaker: self.bookmaker.clone(),
                outcome: self.outcome.clone(),
                odds: self.decimal_odds,
            });
        }

        Ok(())
    }
}

/// Raw event from the provider odds endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEvent {
    /// Event identifier.
    pub id: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Scheduled start time.
    #[serde(with = "time::serde::rfc3339")]
    pub commence_time: OffsetDateTime,
    /// Bookmakers quoting the event.
    #[serde(default)]
    pub bookmakers: Vec<FeedBookmaker>,
}

/// Raw bookmaker entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedBookmaker {
    /// Provider bookmaker key.
    pub key: String,
    /// Human-readable bookmaker name.
    pub title: String,
    /// Markets the bookmaker quotes for this event.
    #[serde(default)]
    pub markets: Vec<FeedMarket>,
}

/// Raw market entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedMarket {
    /// Market key ("h2h" for moneyline).
    pub key: String,
    /// Priced outcomes.
    #[serde(default)]
    pub outcomes: Vec<FeedOutcome>,
}

/// Raw outcome entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedOutcome {
    /// Outcome name (team name for head-to-head).
    pub name: String,
    /// Price in the requested odds format.
    pub price: Decimal,
}

/// Sport catalog entry from the provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SportInfo {
    /// Provider sport key, used in odds requests.
    pub key: String,
    /// Sport group (e.g. "Basketball").
    #[serde(default)]
    pub group: String,
    /// Human-readable title.
    pub title: String,
    /// Whether the sport is in season.
    #[serde(default)]
    pub active: bool,
}
