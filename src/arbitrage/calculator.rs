//! Profit and stake calculations for two-way arbitrage.

use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

use crate::feed::odds::implied_probability;
use crate::feed::Quote;

/// Decimal places used for reported percent and monetary fields.
const REPORT_DP: u32 = 2;

/// A detected arbitrage opportunity: one bet per outcome at two bookmakers.
///
/// Percent and monetary fields are rounded to two decimal places for
/// reporting; the underlying computation runs at full precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageOpportunity {
    /// Event identifier shared by both quotes.
    pub event_id: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Bookmaker for the home-side bet.
    pub bookmaker_home: String,
    /// Bookmaker for the away-side bet.
    pub bookmaker_away: String,
    /// Decimal odds on the home side.
    pub odds_home: Decimal,
    /// Decimal odds on the away side.
    pub odds_away: Decimal,
    /// Guaranteed profit as a percent of total stake.
    pub profit_percent: Decimal,
    /// Stake on the home side.
    pub stake_home: Decimal,
    /// Stake on the away side.
    pub stake_away: Decimal,
    /// Profit locked in regardless of outcome.
    pub guaranteed_profit: Decimal,
    /// When the event starts.
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// When the opportunity was detected.
    #[serde(with = "time::serde::rfc3339")]
    pub detected_at: OffsetDateTime,
}

/// Full-precision stake allocation across both outcomes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StakeSplit {
    /// Stake on the home side.
    pub stake_home: Decimal,
    /// Stake on the away side.
    pub stake_away: Decimal,
    /// Profit locked in regardless of outcome.
    pub guaranteed_profit: Decimal,
}

/// Combined implied probability of both sides (the market tightness measure).
///
/// Below 1.0 the pair is arbitrageable.
pub fn combined_implied_probability(odds_home: Decimal, odds_away: Decimal) -> Decimal {
    implied_probability(odds_home) + implied_probability(odds_away)
}

/// Guaranteed profit percent for a cross-book pair, at full precision.
pub fn profit_percent(odds_home: Decimal, odds_away: Decimal) -> Decimal {
    (Decimal::ONE - combined_implied_probability(odds_home, odds_away)) * Decimal::ONE_HUNDRED
}

/// Split `total_stake` across both sides proportionally to implied
/// probability, equalizing the return whichever side wins.
pub fn allocate_stakes(
    odds_home: Decimal,
    odds_away: Decimal,
    total_stake: Decimal,
) -> StakeSplit {
    let arb_sum = combined_implied_probability(odds_home, odds_away);

    let stake_home = total_stake * implied_probability(odds_home) / arb_sum;
    let stake_away = total_stake - stake_home;

    let return_home = stake_home * odds_home;
    let return_away = stake_away * odds_away;
    let guaranteed_profit = return_home.min(return_away) - total_stake;

    StakeSplit {
        stake_home,
        stake_away,
        guaranteed_profit,
    }
}

/// Evaluate a cross-book quote pair, returning the opportunity if its profit
/// meets the threshold (inclusive).
pub fn calculate_opportunity(
    home: &Quote,
    away: &Quote,
    total_stake: Decimal,
    min_profit_percent: Decimal,
) -> Option<ArbitrageOpportunity> {
    let profit = profit_percent(home.decimal_odds, away.decimal_odds);

    if profit < min_profit_percent {
        return None;
    }

    let split = allocate_stakes(home.decimal_odds, away.decimal_odds, total_stake);

    Some(ArbitrageOpportunity {
        event_id: home.event_id.clone(),
        home_team: home.home_team.clone(),
        away_team: home.away_team.clone(),
        bookmaker_home: home.bookmaker.clone(),
        bookmaker_away: away.bookmaker.clone(),
        odds_home: home.decimal_odds,
        odds_away: away.decimal_odds,
        profit_percent: profit.round_dp(REPORT_DP),
        stake_home: split.stake_home.round_dp(REPORT_DP),
        stake_away: split.stake_away.round_dp(REPORT_DP),
        guaranteed_profit: split.guaranteed_profit.round_dp(REPORT_DP),
        start_time: home.start_time,
        detected_at: OffsetDateTime::now_utc(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    fn quote(bookmaker: &str, outcome: &str, odds: Decimal) -> Quote {
        Quote {
            event_id: "evt-1".to_string(),
            home_team: "Celtics".to_string(),
            away_team: "Lakers".to_string(),
            start_time: datetime!(2026-03-01 19:00 UTC),
            bookmaker: bookmaker.to_string(),
            outcome: outcome.to_string(),
            decimal_odds: odds,
            observed_at: datetime!(2026-03-01 12:00 UTC),
        }
    }

    #[test]
    fn profit_percent_matches_formula() {
        // (1 - 1/2.10 - 1/2.05) * 100
        let profit = profit_percent(dec!(2.10), dec!(2.05));
        let expected = (Decimal::ONE - Decimal::ONE / dec!(2.10) - Decimal::ONE / dec!(2.05))
            * Decimal::ONE_HUNDRED;
        assert_eq!(profit, expected);
        assert_eq!(profit.round_dp(2), dec!(3.60));
    }

    #[test]
    fn stakes_sum_to_total_exactly() {
        let split = allocate_stakes(dec!(2.10), dec!(2.05), dec!(1000));
        assert_eq!(split.stake_home + split.stake_away, dec!(1000));

        let split = allocate_stakes(dec!(1.91), dec!(2.35), dec!(250));
        assert_eq!(split.stake_home + split.stake_away, dec!(250));
    }

    #[test]
    fn guaranteed_profit_matches_closed_form() {
        // min(stake_home*odds_home, stake_away*odds_away) - total equals
        // total * (1/arb_sum - 1): both legs return total/arb_sum when the
        // split is proportional to implied probability.
        let total = dec!(1000);
        let (h, a) = (dec!(2.10), dec!(2.05));

        let split = allocate_stakes(h, a, total);
        let arb_sum = combined_implied_probability(h, a);
        let closed_form = total * (Decimal::ONE / arb_sum - Decimal::ONE);

        let diff = (split.guaranteed_profit - closed_form).abs();
        assert!(diff < dec!(0.000001), "diff was {diff}");
    }

    #[test]
    fn both_returns_equal_within_tolerance() {
        let split = allocate_stakes(dec!(2.10), dec!(2.05), dec!(1000));
        let return_home = split.stake_home * dec!(2.10);
        let return_away = split.stake_away * dec!(2.05);
        let diff = (return_home - return_away).abs();
        assert!(diff < dec!(0.000001), "diff was {diff}");
    }

    #[test]
    fn worked_example_two_ten_vs_two_oh_five() {
        let home = quote("DraftKings", "Celtics", dec!(2.10));
        let away = quote("FanDuel", "Lakers", dec!(2.05));

        let opp = calculate_opportunity(&home, &away, dec!(1000), dec!(0.5)).unwrap();

        assert_eq!(opp.profit_percent, dec!(3.60));
        assert_eq!(opp.stake_home, dec!(493.98));
        assert_eq!(opp.stake_away, dec!(506.02));
        assert_eq!(opp.stake_home + opp.stake_away, dec!(1000));
        assert_eq!(opp.guaranteed_profit, dec!(37.35));
        assert_eq!(opp.bookmaker_home, "DraftKings");
        assert_eq!(opp.bookmaker_away, "FanDuel");
    }

    #[test]
    fn threshold_is_inclusive() {
        // 1/1.5625 = 0.64 and 1/3.2 = 0.3125 are exact, so the profit is
        // exactly 4.75% and must survive a 4.75 threshold.
        let home = quote("DraftKings", "Celtics", dec!(1.5625));
        let away = quote("FanDuel", "Lakers", dec!(3.2));

        assert_eq!(profit_percent(dec!(1.5625), dec!(3.2)), dec!(4.75));

        let opp = calculate_opportunity(&home, &away, dec!(1000), dec!(4.75));
        assert!(opp.is_some());

        let opp = calculate_opportunity(&home, &away, dec!(1000), dec!(4.76));
        assert!(opp.is_none());
    }

    #[test]
    fn no_opportunity_when_market_has_vig() {
        // Typical two-sided quote from a single book: implied sum > 1.
        let home = quote("DraftKings", "Celtics", dec!(1.91));
        let away = quote("FanDuel", "Lakers", dec!(1.91));

        assert!(calculate_opportunity(&home, &away, dec!(1000), dec!(0.5)).is_none());
    }
}
