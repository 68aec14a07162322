//! Append-only SQLite persistence for quotes and opportunities.
//!
//! Both tables are insert-only: a scan appends a fresh snapshot and history
//! queries filter by timestamp. Decimals are stored as TEXT so values
//! round-trip exactly; timestamps are RFC 3339 UTC TEXT, which compares
//! lexically in timestamp order.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use crate::arbitrage::ArbitrageOpportunity;
use crate::error::StoreError;
use crate::feed::Quote;

/// Unfiltered quote queries are capped at this many rows.
const LATEST_QUOTES_LIMIT: u32 = 1000;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id TEXT NOT NULL,
    home_team TEXT NOT NULL,
    away_team TEXT NOT NULL,
    start_time TEXT NOT NULL,
    bookmaker TEXT NOT NULL,
    outcome TEXT NOT NULL,
    decimal_odds TEXT NOT NULL,
    observed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_quotes_event
    ON quotes(event_id, observed_at DESC);

CREATE INDEX IF NOT EXISTS idx_quotes_observed
    ON quotes(observed_at DESC);

CREATE TABLE IF NOT EXISTS opportunities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id TEXT NOT NULL,
    home_team TEXT NOT NULL,
    away_team TEXT NOT NULL,
    bookmaker_home TEXT NOT NULL,
    bookmaker_away TEXT NOT NULL,
    odds_home TEXT NOT NULL,
    odds_away TEXT NOT NULL,
    profit_percent TEXT NOT NULL,
    stake_home TEXT NOT NULL,
    stake_away TEXT NOT NULL,
    guaranteed_profit TEXT NOT NULL,
    start_time TEXT NOT NULL,
    detected_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_opportunities_detected
    ON opportunities(detected_at DESC);
"#;

/// Append-only store for quote snapshots and detected opportunities.
#[derive(Clone)]
pub struct OddsStore {
    conn: Arc<Mutex<Connection>>,
}

impl OddsStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), "Odds store opened");
        Ok(store)
    }

    /// Open an in-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;

        let quotes: i64 = conn.query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?;
        debug!(quotes, "Store schema ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Append a quote snapshot in a single transaction.
    pub fn append_quotes(&self, quotes: &[Quote]) -> Result<usize, StoreError> {
        if quotes.is_empty() {
            return Ok(0);
        }

        // Format timestamps before taking the lock.
        let mut rows = Vec::with_capacity(quotes.len());
        for quote in quotes {
            rows.push((
                quote,
                quote.start_time.format(&Rfc3339)?,
                quote.observed_at.format(&Rfc3339)?,
            ));
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO quotes
                 (event_id, home_team, away_team, start_time, bookmaker, outcome,
                  decimal_odds, observed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for (quote, start_time, observed_at) in &rows {
                stmt.execute(params![
                    quote.event_id,
                    quote.home_team,
                    quote.away_team,
                    start_time,
                    quote.bookmaker,
                    quote.outcome,
                    quote.decimal_odds.to_string(),
                    observed_at,
                ])?;
            }
        }
        tx.commit()?;

        debug!(rows = rows.len(), "Appended quote snapshot");
        Ok(rows.len())
    }

    /// Append one detected opportunity.
    pub fn append_opportunity(&self, opp: &ArbitrageOpportunity) -> Result<(), StoreError> {
        let start_time = opp.start_time.format(&Rfc3339)?;
        let detected_at = opp.detected_at.format(&Rfc3339)?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO opportunities
             (event_id, home_team, away_team, bookmaker_home, bookmaker_away,
              odds_home, odds_away, profit_percent, stake_home, stake_away,
              guaranteed_profit, start_time, detected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                opp.event_id,
                opp.home_team,
                opp.away_team,
                opp.bookmaker_home,
                opp.bookmaker_away,
                opp.odds_home.to_string(),
                opp.odds_away.to_string(),
                opp.profit_percent.to_string(),
                opp.stake_home.to_string(),
                opp.stake_away.to_string(),
                opp.guaranteed_profit.to_string(),
                start_time,
                detected_at,
            ],
        )?;

        Ok(())
    }

    /// Most recent quotes, newest first.
    ///
    /// With an event filter all of that event's rows come back; without one
    /// the result is capped at 1000 rows.
    pub fn latest_quotes(&self, event_id: Option<&str>) -> Result<Vec<Quote>, StoreError> {
        const COLUMNS: &str = "event_id, home_team, away_team, start_time, bookmaker, \
                               outcome, decimal_odds, observed_at";

        let conn = self.conn.lock().unwrap();

        let mut raw: Vec<RawQuote> = Vec::new();
        match event_id {
            Some(id) => {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {COLUMNS} FROM quotes WHERE event_id = ?1 \
                     ORDER BY observed_at DESC"
                ))?;
                let rows = stmt.query_map(params![id], RawQuote::from_row)?;
                for row in rows {
                    raw.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {COLUMNS} FROM quotes ORDER BY observed_at DESC LIMIT ?1"
                ))?;
                let rows = stmt.query_map(params![LATEST_QUOTES_LIMIT], RawQuote::from_row)?;
                for row in rows {
                    raw.push(row?);
                }
            }
        }

        raw.into_iter().map(RawQuote::into_quote).collect()
    }

    /// Opportunities detected within the last `since_days` days, most
    /// profitable first.
    pub fn opportunity_history(
        &self,
        since_days: u32,
    ) -> Result<Vec<ArbitrageOpportunity>, StoreError> {
        let cutoff =
            (OffsetDateTime::now_utc() - Duration::days(i64::from(since_days))).format(&Rfc3339)?;

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT event_id, home_team, away_team, bookmaker_home, bookmaker_away,
                    odds_home, odds_away, profit_percent, stake_home, stake_away,
                    guaranteed_profit, start_time, detected_at
             FROM opportunities
             WHERE detected_at >= ?1
             ORDER BY CAST(profit_percent AS REAL) DESC",
        )?;

        let rows = stmt.query_map(params![cutoff], RawOpportunity::from_row)?;
        let mut raw = Vec::new();
        for row in rows {
            raw.push(row?);
        }

        raw.into_iter().map(RawOpportunity::into_opportunity).collect()
    }

    /// Total quote rows stored.
    pub fn quote_count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?)
    }

    /// Total opportunity rows stored.
    pub fn opportunity_count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row("SELECT COUNT(*) FROM opportunities", [], |row| row.get(0))?)
    }

    /// Run arbitrary SQL against the store, for fault injection in tests.
    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(sql)?;
        Ok(())
    }
}

/// Quote row as stored, before TEXT columns are parsed back.
struct RawQuote {
    event_id: String,
    home_team: String,
    away_team: String,
    start_time: String,
    bookmaker: String,
    outcome: String,
    decimal_odds: String,
    observed_at: String,
}

impl RawQuote {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            event_id: row.get(0)?,
            home_team: row.get(1)?,
            away_team: row.get(2)?,
            start_time: row.get(3)?,
            bookmaker: row.get(4)?,
            outcome: row.get(5)?,
            decimal_odds: row.get(6)?,
            observed_at: row.get(7)?,
        })
    }

    fn into_quote(self) -> Result<Quote, StoreError> {
        Ok(Quote {
            event_id: self.event_id,
            home_team: self.home_team,
            away_team: self.away_team,
            start_time: parse_timestamp(&self.start_time, "quotes")?,
            bookmaker: self.bookmaker,
            outcome: self.outcome,
            decimal_odds: parse_decimal(&self.decimal_odds, "quotes")?,
            observed_at: parse_timestamp(&self.observed_at, "quotes")?,
        })
    }
}

/// Opportunity row as stored.
struct RawOpportunity {
    event_id: String,
    home_team: String,
    away_team: String,
    bookmaker_home: String,
    bookmaker_away: String,
    odds_home: String,
    odds_away: String,
    profit_percent: String,
    stake_home: String,
    stake_away: String,
    guaranteed_profit: String,
    start_time: String,
    detected_at: String,
}

impl RawOpportunity {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            event_id: row.get(0)?,
            home_team: row.get(1)?,
            away_team: row.get(2)?,
            bookmaker_home: row.get(3)?,
            bookmaker_away: row.get(4)?,
            odds_home: row.get(5)?,
            odds_away: row.get(6)?,
            profit_percent: row.get(7)?,
            stake_home: row.get(8)?,
            stake_away: row.get(9)?,
            guaranteed_profit: row.get(10)?,
            start_time: row.get(11)?,
            detected_at: row.get(12)?,
        })
    }

    fn into_opportunity(self) -> Result<ArbitrageOpportunity, StoreError> {
        Ok(ArbitrageOpportunity {
            event_id: self.event_id,
            home_team: self.home_team,
            away_team: self.away_team,
            bookmaker_home: self.bookmaker_home,
            bookmaker_away: self.bookmaker_away,
            odds_home: parse_decimal(&self.odds_home, "opportunities")?,
            odds_away: parse_decimal(&self.odds_away, "opportunities")?,
            profit_percent: parse_decimal(&self.profit_percent, "opportunities")?,
            stake_home: parse_decimal(&self.stake_home, "opportunities")?,
            stake_away: parse_decimal(&self.stake_away, "opportunities")?,
            guaranteed_profit: parse_decimal(&self.guaranteed_profit, "opportunities")?,
            start_time: parse_timestamp(&self.start_time, "opportunities")?,
            detected_at: parse_timestamp(&self.detected_at, "opportunities")?,
        })
    }
}

fn parse_decimal(value: &str, table: &'static str) -> Result<Decimal, StoreError> {
    value.parse().map_err(|e| StoreError::CorruptRecord {
        table,
        reason: format!("bad decimal {value:?}: {e}"),
    })
}

fn parse_timestamp(value: &str, table: &'static str) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| StoreError::CorruptRecord {
        table,
        reason: format!("bad timestamp {value:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::QuoteBuilder;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    fn opportunity(event_id: &str, profit: Decimal, detected_at: OffsetDateTime) -> ArbitrageOpportunity {
        ArbitrageOpportunity {
            event_id: event_id.to_string(),
            home_team: "Celtics".to_string(),
            away_team: "Lakers".to_string(),
            bookmaker_home: "DraftKings".to_string(),
            bookmaker_away: "FanDuel".to_string(),
            odds_home: dec!(2.10),
            odds_away: dec!(2.05),
            profit_percent: profit,
            stake_home: dec!(493.98),
            stake_away: dec!(506.02),
            guaranteed_profit: dec!(37.35),
            start_time: datetime!(2026-03-01 19:00 UTC),
            detected_at,
        }
    }

    #[test]
    fn quotes_round_trip() {
        let store = OddsStore::open_in_memory().unwrap();
        let quotes = vec![
            QuoteBuilder::new("evt-1").bookmaker("DraftKings").home(dec!(2.10)),
            QuoteBuilder::new("evt-1").bookmaker("FanDuel").away(dec!(2.05)),
        ];

        assert_eq!(store.append_quotes(&quotes).unwrap(), 2);

        let stored = store.latest_quotes(None).unwrap();
        assert_eq!(stored.len(), 2);
        // Same observed_at, so both orderings of the pair are acceptable;
        // values must round-trip exactly.
        assert!(stored.iter().any(|q| q.decimal_odds == dec!(2.10)));
        assert!(stored.iter().any(|q| q.decimal_odds == dec!(2.05)));
        assert!(stored.iter().all(|q| q.start_time == datetime!(2026-03-01 19:00 UTC)));
    }

    #[test]
    fn latest_quotes_newest_first() {
        let store = OddsStore::open_in_memory().unwrap();
        let early = QuoteBuilder::new("evt-1")
            .observed_at(datetime!(2026-03-01 12:00 UTC))
            .home(dec!(2.00));
        let late = QuoteBuilder::new("evt-1")
            .observed_at(datetime!(2026-03-01 12:05 UTC))
            .home(dec!(2.10));

        store.append_quotes(&[early, late]).unwrap();

        let stored = store.latest_quotes(None).unwrap();
        assert_eq!(stored[0].decimal_odds, dec!(2.10));
        assert_eq!(stored[1].decimal_odds, dec!(2.00));
    }

    #[test]
    fn latest_quotes_filters_by_event() {
        let store = OddsStore::open_in_memory().unwrap();
        store
            .append_quotes(&[
                QuoteBuilder::new("evt-1").home(dec!(2.10)),
                QuoteBuilder::new("evt-2").home(dec!(1.80)),
            ])
            .unwrap();

        let stored = store.latest_quotes(Some("evt-2")).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].event_id, "evt-2");
    }

    #[test]
    fn unfiltered_quotes_capped_at_limit() {
        let store = OddsStore::open_in_memory().unwrap();
        let quotes: Vec<_> = (0..1100)
            .map(|i| QuoteBuilder::new(format!("evt-{i}")).home(dec!(2.10)))
            .collect();

        store.append_quotes(&quotes).unwrap();

        assert_eq!(store.quote_count().unwrap(), 1100);
        assert_eq!(store.latest_quotes(None).unwrap().len(), 1000);
    }

    #[test]
    fn history_ranks_by_profit_numerically() {
        let store = OddsStore::open_in_memory().unwrap();
        let now = OffsetDateTime::now_utc();

        // Lexically "10.50" < "3.60"; numerically it must rank first.
        store.append_opportunity(&opportunity("evt-1", dec!(3.60), now)).unwrap();
        store.append_opportunity(&opportunity("evt-2", dec!(10.50), now)).unwrap();

        let history = store.opportunity_history(7).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].profit_percent, dec!(10.50));
        assert_eq!(history[1].profit_percent, dec!(3.60));
    }

    #[test]
    fn history_respects_recency_window() {
        let store = OddsStore::open_in_memory().unwrap();
        let now = OffsetDateTime::now_utc();

        store.append_opportunity(&opportunity("evt-old", dec!(2.00), now - Duration::days(10))).unwrap();
        store.append_opportunity(&opportunity("evt-new", dec!(1.00), now)).unwrap();

        let recent = store.opportunity_history(7).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].event_id, "evt-new");

        let all = store.opportunity_history(30).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn opportunity_round_trips() {
        let store = OddsStore::open_in_memory().unwrap();
        let opp = opportunity("evt-1", dec!(3.60), datetime!(2026-03-01 12:00 UTC));

        store.append_opportunity(&opp).unwrap();

        let history = store.opportunity_history(36500).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], opp);
    }

    #[test]
    fn counts_track_inserts() {
        let store = OddsStore::open_in_memory().unwrap();
        assert_eq!(store.quote_count().unwrap(), 0);
        assert_eq!(store.opportunity_count().unwrap(), 0);

        store.append_quotes(&[QuoteBuilder::new("evt-1").home(dec!(2.10))]).unwrap();
        store.append_opportunity(&opportunity("evt-1", dec!(3.60), OffsetDateTime::now_utc())).unwrap();

        assert_eq!(store.quote_count().unwrap(), 1);
        assert_eq!(store.opportunity_count().unwrap(), 1);
    }
}
