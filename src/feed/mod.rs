//! Odds feed module.
//!
//! This module handles:
//! - The quote record and provider response types
//! - Odds format conversion utilities
//! - The odds provider HTTP client
//! - Mock source and fixtures for testing

pub mod client;
pub mod mock;
pub mod odds;
pub mod types;

pub use client::OddsApiClient;
pub use mock::{MockFeedConfig, MockOddsSource, QuoteBuilder};
pub use odds::{american_to_decimal, implied_probability};
pub use types::{Quote, SportInfo};
