//! Application configuration loaded from environment variables.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Odds Provider ===
    /// API key for the odds provider.
    #[serde(default)]
    pub odds_api_key: String,

    /// Base URL for the odds API.
    #[serde(default = "default_api_url")]
    pub odds_api_url: String,

    /// Sport to scan (provider sport key, e.g. "basketball_nba").
    #[serde(default = "default_sport_key")]
    pub sport_key: String,

    /// Bookmaker regions to request.
    #[serde(default = "default_regions")]
    pub regions: String,

    // === Detection Parameters ===
    /// Minimum profit percent for an opportunity to be reported.
    #[serde(default = "default_min_profit_percent")]
    pub min_profit_percent: Decimal,

    /// Total stake split across both legs of each opportunity.
    #[serde(default = "default_total_stake")]
    pub total_stake: Decimal,

    // === Scheduling ===
    /// Seconds between scans.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_seconds: u64,

    // === Persistence ===
    /// SQLite database path.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    // === Server Configuration ===
    /// HTTP server port for health/status/metrics endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_api_url() -> String {
    "https://api.the-odds-api.com/v4".to_string()
}

fn default_sport_key() -> String {
    "basketball_nba".to_string()
}

fn default_regions() -> String {
    "us".to_string()
}

fn default_min_profit_percent() -> Decimal {
    Decimal::new(5, 1) // 0.5%
}

fn default_total_stake() -> Decimal {
    Decimal::new(1000, 0) // $1000
}

fn default_scan_interval() -> u64 {
    300
}

fn default_database_path() -> String {
    "data/odds_history.db".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.odds_api_key.is_empty() {
            return Err("ODDS_API_KEY is required".to_string());
        }

        if self.min_profit_percent < Decimal::ZERO {
            return Err("MIN_PROFIT_PERCENT must not be negative".to_string());
        }

        if self.total_stake <= Decimal::ZERO {
            return Err("TOTAL_STAKE must be positive".to_string());
        }

        if self.scan_interval_seconds == 0 {
            return Err("SCAN_INTERVAL_SECONDS must be at least 1".to_string());
        }

        Ok(())
    }
}
