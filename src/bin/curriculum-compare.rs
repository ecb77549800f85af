//! CLI binary for curriculum-compare.
//!
//! A thin shim over the library crate: `serve` runs the web form, `compare`
//! runs one comparison from local files, `extract` prints a brochure's
//! curriculum lines.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use curriculum_compare::pipeline::llm::{resolve_model_name, resolve_provider};
use curriculum_compare::pipeline::pdf::{extract_curriculum, PdfiumTextSource};
use curriculum_compare::pipeline::sheets::GoogleSheetsClient;
use curriculum_compare::web::{self, AppState};
use curriculum_compare::{
    Comparator, ComparisonConfig, ComparisonRequest, CrewProgressCallback, ProgressCallback,
    Secrets, SecretsFile, ServerConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while the crew works, with one log line per finished task.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Processing");
        bar.set_message("fetching sheet and reading brochure…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl CrewProgressCallback for CliProgressCallback {
    fn on_kickoff_start(&self, total_tasks: usize) {
        self.bar.set_prefix(format!("Crew 0/{total_tasks}"));
    }

    fn on_task_start(&self, task: usize, total_tasks: usize, role: &str) {
        self.bar.set_prefix(format!("Crew {task}/{total_tasks}"));
        self.bar.set_message(role.to_string());
    }

    fn on_task_complete(&self, task: usize, total_tasks: usize, output_len: usize) {
        self.bar.println(format!(
            "  {} Task {}/{}  {}",
            green("✓"),
            task,
            total_tasks,
            dim(&format!("{output_len:>5} chars")),
        ));
    }

    fn on_task_error(&self, task: usize, total_tasks: usize, error: &str) {
        self.bar.println(format!(
            "  {} Task {}/{}  {}",
            red("✗"),
            task,
            total_tasks,
            red(error)
        ));
        self.bar.finish_and_clear();
    }

    fn on_kickoff_complete(&self, _total_tasks: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the comparison form on http://127.0.0.1:8501
  curriculum-compare serve

  # One-shot comparison from the terminal
  curriculum-compare compare brochure.pdf --spreadsheet Master_Curriculums --worksheet CyberSecurity

  # Print the curriculum lines of a brochure (no credentials needed)
  curriculum-compare extract brochure.pdf

SECRETS FILE (JSON, default ./secrets.json):
  {
    "general":       { "OPENAI_API_KEY": "sk-...", "OPENAI_MODEL_NAME": "gpt-4o-mini" },
    "google_sheets": { ...service-account key file... }
  }
  Share the master spreadsheet with the service account's client_email.

ENVIRONMENT VARIABLES:
  CURRICULUM_SECRETS      Path to the secrets file
  CURRICULUM_BIND         Address for `serve`
  CURRICULUM_MODEL        Override the model ID
  CURRICULUM_PROVIDER     LLM provider (default openai)
  OPENAI_API_KEY          Takes precedence over the secrets file
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips auto-download
  RUST_LOG                Log filter (e.g. curriculum_compare=debug)
"#;

/// Compare a PDF brochure's curriculum against a master Google Sheet.
#[derive(Parser, Debug)]
#[command(
    name = "curriculum-compare",
    version,
    about = "Compare a PDF brochure's curriculum against a master Google Sheet using LLM agents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CURRICULUM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CURRICULUM_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the comparison web form.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "CURRICULUM_BIND", default_value = "127.0.0.1:8501")]
        bind: String,

        /// Link to the master curriculum spreadsheet shown in the sidebar.
        #[arg(long, env = "CURRICULUM_MASTER_SHEET_URL")]
        master_sheet_url: Option<String>,

        /// Largest accepted upload in MiB.
        #[arg(long, env = "CURRICULUM_MAX_UPLOAD_MB", default_value_t = 20)]
        max_upload_mb: usize,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Run one comparison and print the report.
    Compare {
        /// The program brochure.
        pdf: PathBuf,

        /// Spreadsheet holding the master curriculum.
        #[arg(long, default_value = "Master_Curriculums")]
        spreadsheet: String,

        /// Worksheet (tab) within the spreadsheet.
        #[arg(long, default_value = "CyberSecurity")]
        worksheet: String,

        /// Output the full report as JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the curriculum lines found in a brochure.
    Extract {
        pdf: PathBuf,

        /// Output a JSON array instead of one line per item.
        #[arg(long)]
        json: bool,
    },
}

/// Options shared by the subcommands that talk to the model and the sheet.
#[derive(Args, Debug)]
struct RunArgs {
    /// Secrets file with model key and service account.
    #[arg(long, env = "CURRICULUM_SECRETS", default_value = "secrets.json")]
    secrets: PathBuf,

    /// LLM model ID. Falls back to OPENAI_MODEL_NAME in the secrets file.
    #[arg(long, env = "CURRICULUM_MODEL")]
    model: Option<String>,

    /// LLM provider.
    #[arg(long, env = "CURRICULUM_PROVIDER", default_value = "openai")]
    provider: String,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "CURRICULUM_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max output tokens per agent answer.
    #[arg(long, env = "CURRICULUM_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Retries per agent task on model failure.
    #[arg(long, env = "CURRICULUM_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let spinner_active = matches!(cli.command, Command::Compare { json: false, .. }) && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner_active {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Model credentials ────────────────────────────────────────────────
    // Exported before the runtime starts any worker threads.
    let secrets_model = match &cli.command {
        Command::Serve { run, .. } | Command::Compare { run, .. } => {
            export_model_credentials(&run.secrets)
        }
        Command::Extract { .. } => None,
    };

    // ── Ensure PDFium engine is available ────────────────────────────────
    ensure_pdfium(cli.quiet)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(run(cli, secrets_model))
}

async fn run(cli: Cli, secrets_model: Option<String>) -> Result<()> {
    match cli.command {
        Command::Serve {
            bind,
            master_sheet_url,
            max_upload_mb,
            run,
        } => {
            let comparator = build_comparator(&run, secrets_model.as_deref())?;
            let defaults = ServerConfig::default();
            let server = ServerConfig {
                bind,
                master_sheet_url: master_sheet_url.or(defaults.master_sheet_url.clone()),
                max_upload_bytes: max_upload_mb * 1024 * 1024,
                ..defaults
            };
            web::serve(AppState::new(comparator, server))
                .await
                .context("Server error")?;
        }

        Command::Compare {
            pdf,
            spreadsheet,
            worksheet,
            json,
            run,
        } => {
            let mut comparator = build_comparator(&run, secrets_model.as_deref())?;
            let show_progress = !cli.quiet && !json;
            if show_progress {
                let cb: ProgressCallback = CliProgressCallback::new();
                comparator = comparator.with_progress(cb);
            }

            let bytes = tokio::fs::read(&pdf)
                .await
                .with_context(|| format!("Failed to read {}", pdf.display()))?;
            let request = ComparisonRequest::new(bytes, spreadsheet, worksheet);
            let report = comparator.run(&request).await.context("Comparison failed")?;

            if json {
                let out =
                    serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
                println!("{out}");
            } else {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                writeln!(handle, "{}\n", bold("Comparison Results"))
                    .and_then(|_| writeln!(handle, "{}", report.result.trim_end()))
                    .context("Failed to write to stdout")?;
                if !cli.quiet {
                    eprintln!(
                        "{} {} brochure items vs {} sheet rows  {}ms",
                        green("✔"),
                        report.pdf_items.len(),
                        report.sheet_rows,
                        report.stats.total_duration_ms,
                    );
                    eprintln!(
                        "   {} tokens in  /  {} tokens out",
                        dim(&report.stats.total_input_tokens.to_string()),
                        dim(&report.stats.total_output_tokens.to_string()),
                    );
                }
            }
        }

        Command::Extract { pdf, json } => {
            let bytes = tokio::fs::read(&pdf)
                .await
                .with_context(|| format!("Failed to read {}", pdf.display()))?;
            let items = extract_curriculum(Arc::new(PdfiumTextSource), Arc::from(bytes))
                .await
                .context("Failed to extract curriculum")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&items).context("Failed to serialise items")?
                );
            } else {
                if items.is_empty() && !cli.quiet {
                    eprintln!("No \"Curriculum:\" section found in {}", pdf.display());
                }
                for item in items {
                    println!("{item}");
                }
            }
        }
    }
    Ok(())
}

/// Read the secrets file once and export the model key for the provider.
///
/// An `OPENAI_API_KEY` already in the environment wins. A missing or broken
/// file is only a warning here: sheet credentials are re-read per request
/// and reported there.
fn export_model_credentials(path: &Path) -> Option<String> {
    let secrets = match Secrets::from_file(path) {
        Ok(s) => s,
        Err(e) => {
            warn!("{}", e);
            return None;
        }
    };
    if let Some(key) = secrets.general.openai_api_key.as_deref() {
        if std::env::var_os("OPENAI_API_KEY").is_none() {
            std::env::set_var("OPENAI_API_KEY", key);
        }
    }
    secrets.general.openai_model_name
}

/// Map CLI args to a ready [`Comparator`] with the production collaborators.
fn build_comparator(run: &RunArgs, secrets_model: Option<&str>) -> Result<Comparator> {
    let mut builder = ComparisonConfig::builder()
        .provider_name(run.provider.clone())
        .temperature(run.temperature)
        .max_tokens(run.max_tokens)
        .max_retries(run.max_retries);
    if let Some(ref model) = run.model {
        builder = builder.model(model.clone());
    }
    let config = builder.build().context("Invalid configuration")?;

    let model_name = resolve_model_name(&config, secrets_model);
    let model = resolve_provider(&config, &model_name).context("Failed to create LLM provider")?;
    info!("Using {} model '{}'", config.provider_name, model_name);

    Ok(Comparator::new(
        config.clone(),
        Arc::new(SecretsFile::new(&run.secrets)),
        Arc::new(GoogleSheetsClient::new(&config)),
        Arc::new(PdfiumTextSource),
        Arc::new(model),
    )
    .with_model_name(model_name))
}

/// Download pdfium on first run, with a progress bar unless quiet.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }
    if quiet {
        pdfium_auto::ensure_pdfium_library(None).context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
        if let Some(t) = total {
            if bar.length().unwrap_or(0) != t {
                bar.set_length(t);
            }
        }
        bar.set_position(downloaded);
    }))
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}
