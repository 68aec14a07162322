//! Arbitrage opportunity detection across bookmaker quotes.

use std::collections::HashMap;

use rust_decimal::Decimal;
use strum::{Display, EnumString};
use tracing::{debug, info, instrument};

use super::calculator::{calculate_opportunity, ArbitrageOpportunity};
use crate::config::Config;
use crate::error::{ArbitrageError, QuoteError};
use crate::feed::Quote;

/// Market shapes the engine can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum MarketKind {
    /// Binary moneyline market (home/away).
    #[strum(serialize = "two-way")]
    TwoWay,
    /// Markets with a draw outcome (soccer, hockey regulation time).
    #[strum(serialize = "three-way")]
    ThreeWay,
}

/// Pure arbitrage detection over a snapshot of quotes.
///
/// Holds only its configuration; every call computes from scratch with no
/// shared state, so it is safe to call from multiple tasks.
#[derive(Debug, Clone)]
pub struct ArbitrageEngine {
    /// Opportunities below this profit percent are discarded.
    min_profit_percent: Decimal,
    /// Base amount split across both legs of each opportunity.
    total_stake: Decimal,
}

/// One event's quotes split into sides.
struct EventSides<'a> {
    home_team: &'a str,
    away_team: &'a str,
    home: Vec<&'a Quote>,
    away: Vec<&'a Quote>,
}

impl<'a> EventSides<'a> {
    /// Start a partition from the first quote seen for the event.
    ///
    /// Event attributes are taken from that quote; later quotes with
    /// diverging team names classify against the first-seen names.
    fn new(first: &'a Quote) -> Self {
        Self {
            home_team: &first.home_team,
            away_team: &first.away_team,
            home: Vec::new(),
            away: Vec::new(),
        }
    }

    fn push(&mut self, quote: &'a Quote) {
        if quote.outcome == self.home_team {
            self.home.push(quote);
        } else if quote.outcome == self.away_team {
            self.away.push(quote);
        } else {
            // Known limitation of the two-way model: an outcome name that
            // matches neither team cannot be classified and is left out of
            // pairing.
            debug!(
                event_id = %quote.event_id,
                outcome = %quote.outcome,
                "Quote outcome matches neither side, excluded from pairing"
            );
        }
    }
}

impl ArbitrageEngine {
    /// Create an engine with explicit detection parameters.
    pub fn new(min_profit_percent: Decimal, total_stake: Decimal) -> Self {
        Self {
            min_profit_percent,
            total_stake,
        }
    }

    /// Create an engine from application configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.min_profit_percent, config.total_stake)
    }

    /// Whether the engine implements detection for a market kind.
    pub fn supports(&self, kind: MarketKind) -> bool {
        matches!(kind, MarketKind::TwoWay)
    }

    /// Scan a quote snapshot for two-way arbitrage.
    ///
    /// Every cross-bookmaker (home, away) pair within an event is evaluated;
    /// pairs meeting the profit threshold come back sorted by profit percent
    /// descending, ties in input encounter order. A malformed quote fails the
    /// whole call with the offending record; no partial results are returned.
    #[instrument(skip(self, quotes), fields(quotes = quotes.len()))]
    pub fn detect_two_way(
        &self,
        quotes: &[Quote],
    ) -> Result<Vec<ArbitrageOpportunity>, QuoteError> {
        for quote in quotes {
            quote.validate()?;
        }

        let mut events: Vec<EventSides<'_>> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for quote in quotes {
            let slot = *index.entry(quote.event_id.as_str()).or_insert_with(|| {
                events.push(EventSides::new(quote));
                events.len() - 1
            });
            events[slot].push(quote);
        }

        let mut opportunities = Vec::new();

        for event in &events {
            for home in &event.home {
                for away in &event.away {
                    // A single book prices in its own margin; both sides at
                    // one bookmaker can never sum below 100%.
                    if home.bookmaker == away.bookmaker {
                        continue;
                    }

                    if let Some(opp) = calculate_opportunity(
                        home,
                        away,
                        self.total_stake,
                        self.min_profit_percent,
                    ) {
                        info!(
                            event_id = %opp.event_id,
                            home_team = %opp.home_team,
                            away_team = %opp.away_team,
                            bookmaker_home = %opp.bookmaker_home,
                            bookmaker_away = %opp.bookmaker_away,
                            profit_percent = %opp.profit_percent,
                            "Arbitrage opportunity detected"
                        );
                        opportunities.push(opp);
                    }
                }
            }
        }

        // Stable sort keeps encounter order for equal profits.
        opportunities.sort_by(|a, b| b.profit_percent.cmp(&a.profit_percent));

        Ok(opportunities)
    }

    /// Three-way detection is declared unsupported rather than silently
    /// returning nothing, so callers expecting draw handling fail loudly.
    pub fn detect_three_way(
        &self,
        _quotes: &[Quote],
    ) -> Result<Vec<ArbitrageOpportunity>, ArbitrageError> {
        Err(ArbitrageError::UnsupportedMarket {
            kind: MarketKind::ThreeWay,
        })
    }
}
