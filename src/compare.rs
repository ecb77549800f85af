//! The comparison pipeline: one request, start to finish.
//!
//! ```text
//! validate ──▶ credentials ──▶ sheet fetch ──▶ PDF extract ──▶ crew kickoff
//!  (local)     (secrets)       (Sheets API)    (pdfium)        (3 model calls)
//! ```
//!
//! Each stage's failure maps to one [`CompareError`] variant and stops the
//! request. Everything before the crew is local or upstream I/O; the crew is
//! built only after both data sets are in hand, so a failed fetch or a broken
//! upload never reaches the model.

use crate::config::ComparisonConfig;
use crate::crew::{Agent, Crew, Inputs, KickoffOptions, PdfExtractorTool, Process, Task};
use crate::error::CompareError;
use crate::output::{ComparisonReport, ComparisonStats};
use crate::pipeline::llm::CompletionModel;
use crate::pipeline::pdf::PageTextSource;
use crate::pipeline::sheets::{render_grid, SheetGrid, SheetSource};
use crate::progress::ProgressCallback;
use crate::prompts::*;
use crate::secrets::CredentialStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// The three user inputs of the form.
#[derive(Debug, Clone, Default)]
pub struct ComparisonRequest {
    pub pdf: Option<Arc<[u8]>>,
    pub spreadsheet_name: String,
    pub worksheet_name: String,
}

impl ComparisonRequest {
    pub fn new(
        pdf: impl Into<Arc<[u8]>>,
        spreadsheet_name: impl Into<String>,
        worksheet_name: impl Into<String>,
    ) -> Self {
        Self {
            pdf: Some(pdf.into()),
            spreadsheet_name: spreadsheet_name.into(),
            worksheet_name: worksheet_name.into(),
        }
    }

    /// Check all three inputs are present, returning the PDF bytes.
    pub fn validate(&self) -> Result<Arc<[u8]>, CompareError> {
        let mut missing = Vec::new();
        let pdf = self.pdf.as_ref().filter(|b| !b.is_empty());
        if pdf.is_none() {
            missing.push("pdf");
        }
        if self.spreadsheet_name.trim().is_empty() {
            missing.push("spreadsheet_name");
        }
        if self.worksheet_name.trim().is_empty() {
            missing.push("worksheet_name");
        }
        match pdf {
            Some(bytes) if missing.is_empty() => Ok(Arc::clone(bytes)),
            _ => Err(CompareError::MissingInput { missing }),
        }
    }
}

/// Runs comparison requests against injected collaborators.
#[derive(Clone)]
pub struct Comparator {
    config: ComparisonConfig,
    model_name: String,
    credentials: Arc<dyn CredentialStore>,
    sheets: Arc<dyn SheetSource>,
    pdf: Arc<dyn PageTextSource>,
    model: Arc<dyn CompletionModel>,
    progress: Option<ProgressCallback>,
}

impl Comparator {
    pub fn new(
        config: ComparisonConfig,
        credentials: Arc<dyn CredentialStore>,
        sheets: Arc<dyn SheetSource>,
        pdf: Arc<dyn PageTextSource>,
        model: Arc<dyn CompletionModel>,
    ) -> Self {
        let model_name = config.model.clone().unwrap_or_default();
        Self {
            config,
            model_name,
            credentials,
            sheets,
            pdf,
            model,
            progress: None,
        }
    }

    /// Name reported in [`ComparisonStats::model`].
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Run one comparison request.
    pub async fn run(&self, request: &ComparisonRequest) -> Result<ComparisonReport, CompareError> {
        let total_start = Instant::now();

        // ── Step 1: Validate inputs ──────────────────────────────────────────
        let pdf_bytes = request.validate()?;
        let spreadsheet = request.spreadsheet_name.trim();
        let worksheet = request.worksheet_name.trim();
        info!(
            "Comparison requested: {} byte PDF vs '{}' / '{}'",
            pdf_bytes.len(),
            spreadsheet,
            worksheet
        );

        // ── Step 2: Load credentials ─────────────────────────────────────────
        let credentials = self.credentials.load()?;

        // ── Step 3: Fetch the master curriculum ──────────────────────────────
        let fetch_start = Instant::now();
        let grid = self.sheets.fetch(&credentials, spreadsheet, worksheet).await?;
        let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;

        // ── Step 4: Extract the brochure curriculum ──────────────────────────
        let extract_start = Instant::now();
        let pdf_tool = PdfExtractorTool::extract(Arc::clone(&self.pdf), pdf_bytes).await?;
        let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
        let pdf_items = pdf_tool.items().to_vec();

        // ── Step 5: Assemble and run the crew ────────────────────────────────
        let crew = build_crew(pdf_tool, self.config.verbose_agents)?;
        let inputs = kickoff_inputs(&grid);
        let options =
            KickoffOptions::from_config(&self.config).with_progress(self.progress.clone());
        let output = crew.kickoff(self.model.as_ref(), &inputs, &options).await?;

        let stats = ComparisonStats {
            model: self.model_name.clone(),
            fetch_duration_ms,
            extract_duration_ms,
            crew_duration_ms: output.duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            total_input_tokens: output.total_prompt_tokens(),
            total_output_tokens: output.total_completion_tokens(),
        };
        info!(
            "Comparison complete in {}ms ({} tokens in / {} out)",
            stats.total_duration_ms, stats.total_input_tokens, stats.total_output_tokens
        );

        Ok(ComparisonReport {
            result: output.raw,
            tasks: output.tasks_output,
            pdf_items,
            sheet_rows: grid.len(),
            sheet_columns: grid.first().map(Vec::len).unwrap_or(0),
            stats,
        })
    }
}

/// The three-agent, three-task crew. Task 3 takes tasks 1 and 2 as context.
pub fn build_crew(pdf_tool: PdfExtractorTool, verbose: bool) -> Result<Crew, CompareError> {
    let pdf_extractor = Agent::new(
        PDF_EXTRACTOR_ROLE,
        PDF_EXTRACTOR_GOAL,
        PDF_EXTRACTOR_BACKSTORY,
    )
    .with_tool(Arc::new(pdf_tool))
    .verbose(verbose);

    let sheet_extractor = Agent::new(
        SHEET_EXTRACTOR_ROLE,
        SHEET_EXTRACTOR_GOAL,
        SHEET_EXTRACTOR_BACKSTORY,
    )
    .verbose(verbose);

    let comparator = Agent::new(COMPARATOR_ROLE, COMPARATOR_GOAL, COMPARATOR_BACKSTORY)
        .verbose(verbose);

    let tasks = vec![
        Task::new(PDF_TASK_DESCRIPTION, PDF_TASK_EXPECTED, PDF_EXTRACTOR_ROLE),
        Task::new(SHEET_TASK_DESCRIPTION, SHEET_TASK_EXPECTED, SHEET_EXTRACTOR_ROLE),
        Task::new(COMPARE_TASK_DESCRIPTION, COMPARE_TASK_EXPECTED, COMPARATOR_ROLE)
            .with_context([0, 1]),
    ];

    Ok(Crew::new(
        vec![pdf_extractor, sheet_extractor, comparator],
        tasks,
        Process::Sequential,
    )?)
}

/// Kickoff inputs: the rendered worksheet under `sheet_data`.
pub fn kickoff_inputs(grid: &SheetGrid) -> Inputs {
    let mut inputs = Inputs::new();
    inputs.insert("sheet_data".to_string(), render_grid(grid));
    inputs
}
