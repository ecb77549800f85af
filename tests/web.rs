//! Router tests: requests go through `tower::ServiceExt::oneshot` against the
//! real router backed by stubbed collaborators.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use common::*;
use curriculum_compare::web::{router, AppState};
use curriculum_compare::ServerConfig;
use tower::ServiceExt;

const BOUNDARY: &str = "X-CURRICULUM-BOUNDARY";

/// Encode `multipart/form-data` with optional text fields and PDF file.
fn multipart(pdf: Option<&[u8]>, spreadsheet: &str, worksheet: &str) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(bytes) = pdf {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pdf\"; filename=\"brochure.pdf\"\r\n\
                 Content-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in [("spreadsheet_name", spreadsheet), ("worksheet_name", worksheet)] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn post(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn app(h: &Harness) -> axum::Router {
    router(AppState::new(h.comparator(), ServerConfig::default()))
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_index_renders_form_with_defaults() {
    let h = Harness::new(ScriptedModel::default());
    let resp = app(&h)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Curriculum Comparison App"));
    assert!(html.contains("value=\"Master_Curriculums\""));
    assert!(html.contains("value=\"CyberSecurity\""));
    assert!(html.contains("Setup Instructions"));
}

#[tokio::test]
async fn test_form_without_pdf_is_bad_request() {
    let h = Harness::new(ScriptedModel::default());
    let resp = app(&h)
        .oneshot(post("/compare", multipart(None, "Master_Curriculums", "CyberSecurity")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let html = body_string(resp).await;
    assert!(html.contains(
        "Please provide all required inputs: PDF, spreadsheet name, and worksheet name."
    ));
    // The form is still there for the next attempt.
    assert!(html.contains("Run Comparison"));
    assert_eq!(h.counts(), (0, 0, 0, 0));
}

#[tokio::test]
async fn test_form_success_renders_markdown_result() {
    let h = Harness::new(ScriptedModel {
        final_answer: Some("**Matching:** <b>Network Security</b>".into()),
        ..Default::default()
    });
    let pdf = pdf_bytes();
    let resp = app(&h)
        .oneshot(post(
            "/compare",
            multipart(Some(&pdf), "Master_Curriculums", "CyberSecurity"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Comparison Results"));
    assert!(html.contains("<strong>Matching:</strong>"));
    assert!(html.contains("&lt;b&gt;Network Security&lt;/b&gt;"));
    assert!(!html.contains("<b>Network Security</b>"));
    assert!(!html.contains("**Matching:**"));
    assert_eq!(h.model.calls(), 3);
}

#[tokio::test]
async fn test_form_sheet_error_is_bad_gateway() {
    let h = Harness::new(ScriptedModel::default());
    let pdf = pdf_bytes();
    let resp = app(&h)
        .oneshot(post("/compare", multipart(Some(&pdf), "Unknown", "CyberSecurity")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let html = body_string(resp).await;
    assert!(html.contains("Error fetching data from Google Sheets"));
    // What the user typed is echoed back.
    assert!(html.contains("value=\"Unknown\""));
    assert_eq!(h.model.calls(), 0);
}

#[tokio::test]
async fn test_api_returns_json_report() {
    let h = Harness::new(ScriptedModel::default());
    let pdf = pdf_bytes();
    let resp = app(&h)
        .oneshot(post(
            "/api/compare",
            multipart(Some(&pdf), "Master_Curriculums", "CyberSecurity"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(json["result"], "answer 3");
    assert_eq!(json["tasks"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["pdf_items"][1], "Network Security");
}

#[tokio::test]
async fn test_api_error_has_kind() {
    let h = Harness::new(ScriptedModel::default());
    let resp = app(&h)
        .oneshot(post("/api/compare", multipart(None, "", "")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(json["kind"], "missing_input");
    assert!(json["error"].as_str().unwrap().starts_with("Please provide all required inputs"));
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new(ScriptedModel::default());
    let resp = app(&h)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
