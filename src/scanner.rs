//! Scan pipeline: fetch quotes, persist, detect, report.

use std::collections::HashSet;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::arbitrage::{ArbitrageEngine, ArbitrageOpportunity};
use crate::config::Config;
use crate::error::ScannerError;
use crate::feed::{OddsApiClient, Quote};
use crate::metrics;
use crate::store::OddsStore;

/// Outcome of one scan cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    /// Sport that was scanned.
    pub sport_key: String,
    /// Distinct events in the snapshot.
    pub events_seen: usize,
    /// Quotes ingested this cycle.
    pub quotes_ingested: usize,
    /// Best profit percent found, if any.
    pub best_profit_percent: Option<Decimal>,
    /// Opportunities meeting the threshold, ranked by profit.
    pub opportunities: Vec<ArbitrageOpportunity>,
    /// When the scan finished.
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
}

/// Periodic scan driver: one fetch-detect-persist pass per call.
///
/// A persistence failure is logged and never discards the in-memory
/// detection result; a feed failure aborts only the current cycle.
pub struct Scanner {
    config: Config,
    client: OddsApiClient,
    engine: ArbitrageEngine,
    store: OddsStore,
}

impl Scanner {
    /// Create a scanner from config and an opened store.
    pub fn new(config: Config, store: OddsStore) -> Self {
        let client = OddsApiClient::new(&config);
        let engine = ArbitrageEngine::from_config(&config);
        Self {
            config,
            client,
            engine,
            store,
        }
    }

    /// Detection parameters in use.
    pub fn engine(&self) -> &ArbitrageEngine {
        &self.engine
    }

    /// Run one full scan cycle against the live feed.
    #[instrument(skip(self), fields(sport = %self.config.sport_key))]
    pub async fn run_once(&self) -> Result<ScanSummary, ScannerError> {
        let fetch_start = Instant::now();
        let quotes = self.client.fetch_quotes(&self.config.sport_key).await?;
        metrics::record_fetch_latency(fetch_start);

        self.process_quotes(quotes)
    }

    /// Persist a quote snapshot, detect opportunities, and report them.
    ///
    /// Split from [`run_once`](Self::run_once) so the pipeline can run
    /// against any quote source.
    pub fn process_quotes(&self, quotes: Vec<Quote>) -> Result<ScanSummary, ScannerError> {
        metrics::inc_quotes_ingested(quotes.len() as u64);

        if let Err(e) = self.store.append_quotes(&quotes) {
            metrics::inc_persistence_failures();
            warn!(error = %e, "Failed to persist quote snapshot, continuing scan");
        }

        let detect_start = Instant::now();
        let opportunities = self.engine.detect_two_way(&quotes)?;
        metrics::record_detection_latency(detect_start);

        for opp in &opportunities {
            metrics::inc_opportunities_detected();

            if let Err(e) = self.store.append_opportunity(opp) {
                metrics::inc_persistence_failures();
                warn!(
                    event_id = %opp.event_id,
                    error = %e,
                    "Failed to persist opportunity, still reporting it"
                );
            }

            info!(
                "Found: {} vs {} - {}% (bet {} at {}, {} at {})",
                opp.home_team,
                opp.away_team,
                opp.profit_percent,
                opp.stake_home,
                opp.bookmaker_home,
                opp.stake_away,
                opp.bookmaker_away,
            );
        }

        let events_seen = quotes
            .iter()
            .map(|q| q.event_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let summary = ScanSummary {
            sport_key: self.config.sport_key.clone(),
            events_seen,
            quotes_ingested: quotes.len(),
            best_profit_percent: opportunities.first().map(|o| o.profit_percent),
            opportunities,
            finished_at: OffsetDateTime::now_utc(),
        };

        metrics::inc_scans();
        info!(
            events = summary.events_seen,
            quotes = summary.quotes_ingested,
            opportunities = summary.opportunities.len(),
            "Scan complete"
        );

        Ok(summary)
    }
}
