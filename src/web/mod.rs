//! HTTP front end: the comparison form and a JSON API over the same pipeline.
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/`            | GET  | the form |
//! | `/compare`     | POST | the form plus result or inline error (HTML) |
//! | `/api/compare` | POST | [`ComparisonReport`] or `{"error", "kind"}` (JSON) |
//! | `/health`      | GET  | status, version, uptime |
//!
//! Both POST routes take `multipart/form-data` with the fields `pdf`,
//! `spreadsheet_name` and `worksheet_name`. Requests share nothing mutable:
//! the state holds the comparator and server config behind `Arc`s.

pub mod page;

use crate::compare::{Comparator, ComparisonRequest};
use crate::config::ServerConfig;
use crate::error::{CompareError, PdfError};
use crate::output::ComparisonReport;
use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use page::{FormValues, Outcome};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// ============================================================================
// AppState
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    comparator: Arc<Comparator>,
    server: Arc<ServerConfig>,
    start_time: Instant,
}

impl AppState {
    pub fn new(comparator: Comparator, server: ServerConfig) -> Self {
        Self {
            comparator: Arc::new(comparator),
            server: Arc::new(server),
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// Error type
// ============================================================================

/// JSON error body of the API routes.
pub struct AppError(StatusCode, String, &'static str);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.0,
            Json(serde_json::json!({"error": self.1, "kind": self.2})),
        )
            .into_response()
    }
}

impl From<CompareError> for AppError {
    fn from(e: CompareError) -> Self {
        AppError(status_for(&e), e.user_message(), e.kind())
    }
}

/// HTTP status for a failed comparison.
pub fn status_for(err: &CompareError) -> StatusCode {
    match err {
        CompareError::MissingInput { .. } => StatusCode::BAD_REQUEST,
        CompareError::Pdf(PdfError::PdfiumBindingFailed(_) | PdfError::Internal(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        CompareError::Pdf(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CompareError::SheetFetch(_) | CompareError::Orchestration(_) => StatusCode::BAD_GATEWAY,
        CompareError::Credentials(_) | CompareError::InvalidConfig(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let limit = state.server.max_upload_bytes;
    Router::new()
        .route("/", get(index_handler))
        .route("/compare", post(compare_form_handler))
        .route("/api/compare", post(compare_api_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let bind = state.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

// ============================================================================
// Multipart
// ============================================================================

/// Collect the three form fields. Unknown fields are ignored; an empty file
/// input counts as no PDF.
async fn read_request(mut multipart: Multipart) -> Result<ComparisonRequest, String> {
    let mut request = ComparisonRequest::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed form data: {}", e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Could not read upload: {}", e.body_text()))?;
                if !bytes.is_empty() {
                    request.pdf = Some(Arc::from(bytes.to_vec()));
                }
            }
            "spreadsheet_name" | "worksheet_name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| format!("Could not read field '{name}': {}", e.body_text()))?;
                if name == "spreadsheet_name" {
                    request.spreadsheet_name = text;
                } else {
                    request.worksheet_name = text;
                }
            }
            other => warn!("Ignoring unexpected form field '{}'", other),
        }
    }
    Ok(request)
}

// ============================================================================
// Handlers
// ============================================================================

// GET /
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(page::render(
        &state.server,
        &FormValues::defaults(&state.server),
        None,
    ))
}

// POST /compare
async fn compare_form_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let request = match read_request(multipart).await {
        Ok(r) => r,
        Err(message) => {
            let form = FormValues::defaults(&state.server);
            return (
                StatusCode::BAD_REQUEST,
                Html(page::render(&state.server, &form, Some(Outcome::Error(message)))),
            );
        }
    };

    // Echo what the user typed, even when blank.
    let form = FormValues {
        spreadsheet_name: request.spreadsheet_name.clone(),
        worksheet_name: request.worksheet_name.clone(),
    };

    match state.comparator.run(&request).await {
        Ok(report) => (
            StatusCode::OK,
            Html(page::render(&state.server, &form, Some(Outcome::Report(&report)))),
        ),
        Err(e) => {
            warn!("Comparison failed ({}): {}", e.kind(), e);
            (
                status_for(&e),
                Html(page::render(
                    &state.server,
                    &form,
                    Some(Outcome::Error(e.user_message())),
                )),
            )
        }
    }
}

// POST /api/compare
async fn compare_api_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ComparisonReport>, AppError> {
    let request = read_request(multipart)
        .await
        .map_err(|m| AppError(StatusCode::BAD_REQUEST, m, "bad_request"))?;
    let report = state.comparator.run(&request).await.map_err(|e| {
        warn!("Comparison failed ({}): {}", e.kind(), e);
        AppError::from(e)
    })?;
    Ok(Json(report))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_secs: u64,
}

// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
