//! Odds format conversions.
//!
//! Pure functions used when constructing quotes from feeds that supply
//! American odds. The scanner requests decimal odds from the provider, so
//! these only run for American-format payloads.

use rust_decimal::Decimal;

/// Convert American odds to decimal odds.
///
/// Positive odds `a` pay `a` per 100 staked: decimal = a/100 + 1.
/// Negative odds `a` require `|a|` staked to win 100: decimal = 100/|a| + 1.
/// Zero is not a valid American odds value and yields `None`.
pub fn american_to_decimal(american: i32) -> Option<Decimal> {
    use std::cmp::Ordering;

    match american.cmp(&0) {
        Ordering::Greater => {
            Some(Decimal::from(american) / Decimal::ONE_HUNDRED + Decimal::ONE)
        }
        Ordering::Less => {
            Some(Decimal::ONE_HUNDRED / Decimal::from(american.unsigned_abs()) + Decimal::ONE)
        }
        Ordering::Equal => None,
    }
}

/// Implied probability encoded in decimal odds (inclusive of bookmaker margin).
///
/// Callers must ensure `decimal_odds` is nonzero; validated quotes always are.
pub fn implied_probability(decimal_odds: Decimal) -> Decimal {
    Decimal::ONE / decimal_odds
}
