//! # curriculum-compare
//!
//! Compare the curriculum printed in a PDF program brochure against the
//! master curriculum kept in a Google Sheets worksheet, using a small crew of
//! LLM agents.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request (PDF bytes, spreadsheet name, worksheet name)
//!  │
//!  ├─ 1. Validate   all three inputs present
//!  ├─ 2. Secrets    service-account key from the secrets store
//!  ├─ 3. Sheet      Drive lookup by name → worksheet values → grid
//!  ├─ 4. PDF        pdfium page text → lines between "Curriculum:" and
//!  │                "End of Curriculum"
//!  ├─ 5. Crew       PDF extractor → sheet formatter → comparator
//!  └─ 6. Report     comparator's answer + per-task outputs + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use curriculum_compare::pipeline::{llm, pdf::PdfiumTextSource, sheets::GoogleSheetsClient};
//! use curriculum_compare::{Comparator, ComparisonConfig, ComparisonRequest, SecretsFile};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ComparisonConfig::default();
//!     let model_name = llm::resolve_model_name(&config, None);
//!     let model = llm::resolve_provider(&config, &model_name)?;
//!     let comparator = Comparator::new(
//!         config.clone(),
//!         Arc::new(SecretsFile::new("secrets.json")),
//!         Arc::new(GoogleSheetsClient::new(&config)),
//!         Arc::new(PdfiumTextSource),
//!         Arc::new(model),
//!     )
//!     .with_model_name(model_name);
//!
//!     let pdf = std::fs::read("brochure.pdf")?;
//!     let request = ComparisonRequest::new(pdf, "Master_Curriculums", "CyberSecurity");
//!     let report = comparator.run(&request).await?;
//!     println!("{}", report.result);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `curriculum-compare` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! The web router in [`web`] is part of the library and does not need `cli`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compare;
pub mod config;
pub mod crew;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod secrets;
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compare::{Comparator, ComparisonRequest};
pub use config::{ComparisonConfig, ComparisonConfigBuilder, ServerConfig};
pub use error::{CompareError, CrewError, ModelError, PdfError, SecretsError, SheetError};
pub use output::{ComparisonReport, ComparisonStats, CrewOutput, TaskOutput};
pub use progress::{CrewProgressCallback, NoopProgressCallback, ProgressCallback};
pub use secrets::{CredentialStore, Secrets, SecretsFile, ServiceAccountKey, StaticCredentials};
