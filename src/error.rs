//! Error types for the curriculum-compare library.
//!
//! Every stage of a comparison request has its own error type so callers can
//! tell *where* a run stopped:
//!
//! * [`PdfError`]: the uploaded brochure could not be read.
//! * [`SheetError`]: the master curriculum could not be fetched.
//! * [`ModelError`]: a single completion call failed.
//! * [`CrewError`]: the agent crew was mis-configured or a task failed.
//!
//! [`CompareError`] wraps them into the request-level taxonomy shown to the
//! user. Every variant is terminal for the current request and none of them
//! is process-fatal: the web form stays usable for the next attempt.

use std::path::PathBuf;
use thiserror::Error;

/// All request-level errors returned by [`crate::compare::Comparator::run`].
#[derive(Debug, Error)]
pub enum CompareError {
    // ── Validation ────────────────────────────────────────────────────────
    /// One or more of the three required inputs is missing.
    #[error("Missing required input(s): {}", .missing.join(", "))]
    MissingInput { missing: Vec<&'static str> },

    // ── Credentials ───────────────────────────────────────────────────────
    /// The secrets store could not be read or is incomplete.
    #[error("Error loading credentials: {0}")]
    Credentials(#[from] SecretsError),

    // ── Upstream stages ───────────────────────────────────────────────────
    /// The worksheet could not be fetched.
    #[error("Error fetching data from Google Sheets: {0}")]
    SheetFetch(#[from] SheetError),

    /// The brochure could not be opened or read.
    #[error("Error reading PDF brochure: {0}")]
    Pdf(#[from] PdfError),

    /// The crew failed to produce a result.
    #[error("Error during processing: {0}")]
    Orchestration(#[from] CrewError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CompareError {
    /// Stable, machine-readable label used by the JSON API.
    pub fn kind(&self) -> &'static str {
        match self {
            CompareError::MissingInput { .. } => "missing_input",
            CompareError::Credentials(_) => "credentials",
            CompareError::SheetFetch(_) => "sheet_fetch",
            CompareError::Pdf(_) => "pdf",
            CompareError::Orchestration(_) => "orchestration",
            CompareError::InvalidConfig(_) => "invalid_config",
        }
    }

    /// The inline message rendered in the web form.
    pub fn user_message(&self) -> String {
        match self {
            CompareError::MissingInput { .. } => {
                "Please provide all required inputs: PDF, spreadsheet name, and worksheet name."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Failures reading the secrets store.
#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("secrets file not found: '{path}'")]
    NotFound { path: PathBuf },

    #[error("failed to read secrets file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("secrets file '{path}' is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required section or key is absent.
    #[error("missing secret '{0}'")]
    Missing(&'static str),
}

/// Failures extracting text from the uploaded brochure.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("uploaded file is empty")]
    Empty,

    /// The upload does not start with the `%PDF` signature.
    #[error("uploaded file is not a PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// pdfium rejected the document.
    #[error("PDF is corrupt or encrypted: {detail}")]
    Corrupt { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures talking to the spreadsheet service.
#[derive(Debug, Error)]
pub enum SheetError {
    /// The service-account key could not be turned into an access token.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("spreadsheet '{name}' not found (is it shared with the service account?)")]
    SpreadsheetNotFound { name: String },

    #[error("worksheet '{worksheet}' not found in spreadsheet '{spreadsheet}'")]
    WorksheetNotFound {
        spreadsheet: String,
        worksheet: String,
    },

    /// The API answered with a non-success status.
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SheetError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SheetError::Decode(e.to_string())
        } else {
            SheetError::Transport(e.to_string())
        }
    }
}

/// A failed completion call.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ModelError {
    /// The configured provider could not be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The provider returned an error.
    #[error("LLM API error: {message}")]
    Api { message: String },

    /// The provider answered with no text.
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

/// A failure while validating or running the crew.
#[derive(Debug, Error)]
pub enum CrewError {
    #[error("crew has no tasks")]
    NoTasks,

    #[error("task {task} is assigned to unknown agent '{role}'")]
    UnknownAgent { task: usize, role: String },

    #[error("agent role '{0}' is declared twice")]
    DuplicateAgent(String),

    /// A context reference that sequential execution cannot satisfy.
    #[error("task {task} uses task {context} as context, but it does not run earlier")]
    InvalidContext { task: usize, context: usize },

    #[error("tool '{tool}' failed: {detail}")]
    Tool { tool: String, detail: String },

    /// The model call for a task failed after all retries.
    #[error("task {task} ({role}) failed after {retries} retries: {source}")]
    TaskFailed {
        task: usize,
        role: String,
        retries: u32,
        #[source]
        source: ModelError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_lists_fields() {
        let e = CompareError::MissingInput {
            missing: vec!["pdf", "worksheet_name"],
        };
        let msg = e.to_string();
        assert!(msg.contains("pdf, worksheet_name"), "got: {msg}");
        assert_eq!(e.kind(), "missing_input");
    }

    #[test]
    fn missing_input_user_message_is_friendly() {
        let e = CompareError::MissingInput {
            missing: vec!["pdf"],
        };
        assert_eq!(
            e.user_message(),
            "Please provide all required inputs: PDF, spreadsheet name, and worksheet name."
        );
    }

    #[test]
    fn sheet_error_wraps_with_prefix() {
        let e: CompareError = SheetError::SpreadsheetNotFound {
            name: "Master_Curriculums".into(),
        }
        .into();
        assert_eq!(e.kind(), "sheet_fetch");
        let msg = e.user_message();
        assert!(msg.starts_with("Error fetching data from Google Sheets"), "got: {msg}");
        assert!(msg.contains("Master_Curriculums"));
    }

    #[test]
    fn task_failed_display() {
        let e = CrewError::TaskFailed {
            task: 3,
            role: "Curriculum Comparator Expert".into(),
            retries: 0,
            source: ModelError::Api {
                message: "rate limited".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("task 3"));
        assert!(msg.contains("rate limited"));
    }

    #[test]
    fn orchestration_kind() {
        let e: CompareError = CrewError::NoTasks.into();
        assert_eq!(e.kind(), "orchestration");
        assert!(e.to_string().starts_with("Error during processing"));
    }
}
