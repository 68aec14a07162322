//! HTTP API handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::error;

use crate::arbitrage::ArbitrageOpportunity;
use crate::scanner::ScanSummary;
use crate::store::OddsStore;

/// Default history window for the opportunities endpoint, in days.
const DEFAULT_HISTORY_DAYS: u32 = 7;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether at least one scan has completed.
    pub ready: Arc<AtomicBool>,
    /// Summary of the most recent scan.
    pub last_scan: Arc<tokio::sync::RwLock<Option<ScanSummary>>>,
    /// Persistence handle for history queries.
    pub store: OddsStore,
    /// Prometheus render handle, present when the exporter is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state around an opened store.
    pub fn new(store: OddsStore) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            last_scan: Arc::new(tokio::sync::RwLock::new(None)),
            store,
            prometheus: None,
        }
    }

    /// Attach a Prometheus render handle.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Record a completed scan and mark the service ready.
    pub async fn record_scan(&self, summary: ScanSummary) {
        *self.last_scan.write().await = Some(summary);
        self.set_ready(true);
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether at least one scan has completed.
    pub ready: bool,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// Most recent scan, if any.
    pub last_scan: Option<ScanSummary>,
    /// Stored row totals.
    pub totals: TotalsResponse,
}

/// Stored row totals in status response.
#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    /// Quote rows stored.
    pub quotes: i64,
    /// Opportunity rows stored.
    pub opportunities: i64,
}

/// Query parameters for the opportunities endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// History window in days (default 7).
    pub days: Option<u32>,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 once a scan has completed.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let response = ReadyResponse { ready: is_ready };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - last scan summary and stored totals.
pub async fn status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let last_scan = state.last_scan.read().await.clone();

    let quotes = state.store.quote_count().map_err(|e| {
        error!(error = %e, "Failed to count quotes");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let opportunities = state.store.opportunity_count().map_err(|e| {
        error!(error = %e, "Failed to count opportunities");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let status = if state.is_ready() { "running" } else { "starting" };

    Ok(Json(StatusResponse {
        status,
        last_scan,
        totals: TotalsResponse {
            quotes,
            opportunities,
        },
    }))
}

/// Opportunity history handler, most profitable first.
pub async fn opportunities(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<ArbitrageOpportunity>>, StatusCode> {
    let days = params.days.unwrap_or(DEFAULT_HISTORY_DAYS);

    let history = state.store.opportunity_history(days).map_err(|e| {
        error!(error = %e, "Failed to load opportunity history");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(history))
}

/// Prometheus metrics handler.
pub async fn metrics(State(state): State<AppState>) -> Result<String, StatusCode> {
    match &state.prometheus {
        Some(handle) => Ok(handle.render()),
        None => Err(StatusCode::NOT_FOUND),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_state_ready_toggle() {
        let state = AppState::new(OddsStore::open_in_memory().unwrap());
        assert!(!state.is_ready());

        state.set_ready(true);
        assert!(state.is_ready());

        state.set_ready(false);
        assert!(!state.is_ready());
    }

    #[tokio::test]
    async fn record_scan_marks_ready() {
        use time::OffsetDateTime;

        let state = AppState::new(OddsStore::open_in_memory().unwrap());

        state
            .record_scan(ScanSummary {
                sport_key: "basketball_nba".to_string(),
                events_seen: 3,
                quotes_ingested: 12,
                opportunities: Vec::new(),
                best_profit_percent: None,
                finished_at: OffsetDateTime::now_utc(),
            })
            .await;

        assert!(state.is_ready());
        assert_eq!(
            state.last_scan.read().await.as_ref().unwrap().events_seen,
            3
        );
    }
}
