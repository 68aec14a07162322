//! Unified error types for the arbitrage scanner.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::arbitrage::MarketKind;

/// Unified error type for the arbitrage scanner.
#[derive(Error, Debug)]
pub enum ScannerError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Malformed quote rejected by the engine.
    #[error("invalid quote: {0}")]
    Quote(#[from] QuoteError),

    /// Odds feed error.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// Persistence error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Arbitrage detection error.
    #[error("arbitrage error: {0}")]
    Arbitrage(#[from] ArbitrageError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A quote that cannot contribute to detection.
///
/// Detection fails fast with the offending record rather than coercing or
/// dropping it, so a scan never returns results computed from bad input.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Decimal odds must exceed 1.0 (a winning bet always returns the stake).
    #[error(
        "quote for event {event_id} ({bookmaker}, {outcome}) has decimal odds {odds}, \
         expected greater than 1"
    )]
    OddsNotAboveOne {
        /// Event the quote belongs to.
        event_id: String,
        /// Bookmaker that posted the quote.
        bookmaker: String,
        /// Outcome the quote prices.
        outcome: String,
        /// The rejected odds value.
        odds: Decimal,
    },

    /// A required field is empty.
    #[error("quote for event {event_id:?} is missing {field}")]
    MissingField {
        /// Event the quote belongs to (may itself be the missing field).
        event_id: String,
        /// Name of the empty field.
        field: &'static str,
    },
}

/// Odds feed fetch and parse errors.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The provider answered with a non-success status.
    #[error("odds feed unavailable: HTTP {status}")]
    Unavailable {
        /// HTTP status code returned by the provider.
        status: u16,
    },

    /// Failed to parse the provider response.
    #[error("failed to parse feed response: {0}")]
    ParseError(String),

    /// HTTP transport failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Persistence errors.
///
/// Writes are append-only; a failed write is logged by the caller and never
/// invalidates detection results already computed in memory.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A persisted row could not be mapped back to its record type.
    #[error("corrupt {table} row: {reason}")]
    CorruptRecord {
        /// Table the row came from.
        table: &'static str,
        /// What failed to parse.
        reason: String,
    },

    /// Timestamp could not be formatted for storage.
    #[error("timestamp format error: {0}")]
    Format(#[from] time::error::Format),

    /// Filesystem error opening the database.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Arbitrage detection errors.
#[derive(Error, Debug)]
pub enum ArbitrageError {
    /// The engine declares this market shape unsupported.
    #[error("{kind} arbitrage detection is not implemented")]
    UnsupportedMarket {
        /// The unsupported market kind.
        kind: MarketKind,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ScannerError>;
