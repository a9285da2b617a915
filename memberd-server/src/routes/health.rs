//! Health document and good-to-go routes
//!
//! A failing connectivity check is reported as a severity-tagged entry in
//! the health document, never as a process failure; the good-to-go probe
//! is the endpoint that actually flips to 503.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use memberd_core::RwService;

use crate::state::AppState;

/// One check entry in the health document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub name: String,
    pub ok: bool,
    pub severity: u8,
    pub business_impact: String,
    pub technical_summary: String,
    pub panic_guide: String,
    pub check_output: String,
    pub last_updated: String,
}

/// The health document served on /__health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub schema_version: u8,
    pub system_code: String,
    pub name: String,
    pub description: String,
    pub ok: bool,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: Vec<CheckResult>,
}

/// GET /__health
pub async fn health<S: RwService>(State(state): State<AppState<S>>) -> Json<HealthReport> {
    let check = connectivity_check(state.service()).await;
    let system = state.system();

    Json(HealthReport {
        schema_version: 1,
        system_code: system.system_code.clone(),
        name: system.system_code.clone(),
        description: system.description.clone(),
        ok: check.ok,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime().as_secs(),
        checks: vec![check],
    })
}

/// GET /__gtg - good-to-go probe for load balancers
pub async fn good_to_go<S: RwService>(State(state): State<AppState<S>>) -> Response {
    match state.service().check().await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(err) => {
            warn!("good-to-go check failed: {err}");
            (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response()
        }
    }
}

async fn connectivity_check<S: RwService>(service: &S) -> CheckResult {
    let outcome = service.check().await;
    CheckResult {
        name: "Check connectivity to the graph database".to_string(),
        ok: outcome.is_ok(),
        severity: 1,
        business_impact: "Cannot read or write records via this service".to_string(),
        technical_summary: "The configured graph database endpoint did not answer a trivial query"
            .to_string(),
        panic_guide: "Check the graph database endpoint configured via NEO_URL and its credentials"
            .to_string(),
        check_output: match outcome {
            Ok(()) => "OK".to_string(),
            Err(err) => err.to_string(),
        },
        last_updated: Utc::now().to_rfc3339(),
    }
}
