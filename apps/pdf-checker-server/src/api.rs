//! API handlers for the PDF checker server
//!
//! Provides REST endpoints for:
//! - Liveness (`/ping`, `/health`)
//! - Rule analysis of an uploaded PDF (`/api/pdf/analyze`)

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use shared_types::{AnalysisResult, UploadedFile};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::ServerError;
use crate::AppState;

/// Number of `ruleN` form fields accepted (`rule1`..`rule3`)
pub const RULE_SLOTS: usize = 3;

/// Ping response
#[derive(Serialize)]
pub struct PingResponse {
    pub ok: bool,
}

/// Handler: GET /ping
pub async fn handle_ping() -> Json<PingResponse> {
    Json(PingResponse { ok: true })
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdf-checker-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Analysis response
#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: AnalysisResult,
}

/// Handler: POST /api/pdf/analyze
///
/// Multipart fields: `file` (application/pdf), `rule1`, `rule2`, `rule3`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ServerError> {
    let request_id = Uuid::new_v4();

    async move {
        let (file, rules) = read_upload(multipart, state.max_upload_bytes).await?;
        info!("Analyze request: file={}", file.file_name);

        let data = state.pipeline.analyze(file, &rules[..]).await?;

        Ok(Json(AnalyzeResponse {
            success: true,
            message: "PDF parsed and rules captured successfully",
            data,
        }))
    }
    .instrument(info_span!("analyze", %request_id))
    .await
}

/// Pull the PDF and the rule slots out of the multipart body
async fn read_upload(
    mut multipart: Multipart,
    limit: usize,
) -> Result<(UploadedFile, Vec<String>), ServerError> {
    let mut file = None;
    let mut rules = vec![String::new(); RULE_SLOTS];

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::from_multipart(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            if field.content_type() != Some("application/pdf") {
                return Err(ServerError::InvalidRequest(
                    "Only PDF files are allowed".to_string(),
                ));
            }
            let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::from_multipart(e, limit))?;
            file = Some(UploadedFile::new(file_name, bytes.to_vec()));
        } else if let Some(slot) = rule_slot(&name) {
            rules[slot] = field
                .text()
                .await
                .map_err(|e| ServerError::from_multipart(e, limit))?;
        } else {
            debug!("Ignoring form field '{}'", name);
        }
    }

    let file = file.ok_or_else(|| ServerError::InvalidRequest("PDF file is required".to_string()))?;
    Ok((file, rules))
}

/// Zero-based slot index for `rule1`..`ruleN`
fn rule_slot(name: &str) -> Option<usize> {
    name.strip_prefix("rule")
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| (1..=RULE_SLOTS).contains(n))
        .map(|n| n - 1)
}
