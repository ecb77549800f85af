//! Configuration types for a curriculum comparison run.
//!
//! All behaviour is controlled through [`ComparisonConfig`], built via its
//! [`ComparisonConfigBuilder`]. The config is immutable once built and is
//! handed to each component at construction; nothing reads process-wide
//! state at request time.

use crate::error::CompareError;
use std::fmt;

/// Default Google OAuth2 token endpoint, used when the service-account key
/// does not carry its own `token_uri`.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Drive v3 base URL (spreadsheet lookup by title).
pub const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
/// Sheets v4 base URL (worksheet metadata and values).
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";
/// The shared master curriculum spreadsheet linked from the sidebar.
pub const DEFAULT_MASTER_SHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/1hf3UCRKxpSOSblxWVbW0dQhRoM5ZSFP3AG0Vz7iNkUE/edit?usp=sharing";

/// Configuration for a comparison run.
///
/// # Example
/// ```rust
/// use curriculum_compare::ComparisonConfig;
///
/// let config = ComparisonConfig::builder()
///     .model("gpt-4o-mini")
///     .temperature(0.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
/// ```
#[derive(Clone)]
pub struct ComparisonConfig {
    /// LLM model identifier, e.g. "gpt-4o-mini". If None, the secrets store's
    /// `OPENAI_MODEL_NAME` is used, then the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama"). Default: "openai".
    pub provider_name: String,

    /// Sampling temperature for each agent call, clamped to 0.0–2.0. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the model may generate per task. Default: 4096.
    pub max_tokens: usize,

    /// Retry attempts on a failed completion call. Default: 0.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Log each agent's prompt and answer at `debug` level. Default: true.
    pub verbose_agents: bool,

    /// Drive v3 base URL. Default: [`DEFAULT_DRIVE_BASE_URL`].
    pub drive_base_url: String,

    /// Sheets v4 base URL. Default: [`DEFAULT_SHEETS_BASE_URL`].
    pub sheets_base_url: String,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: "openai".to_string(),
            temperature: 0.1,
            max_tokens: 4096,
            max_retries: 0,
            retry_backoff_ms: 500,
            verbose_agents: true,
            drive_base_url: DEFAULT_DRIVE_BASE_URL.to_string(),
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
        }
    }
}

impl fmt::Debug for ComparisonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("verbose_agents", &self.verbose_agents)
            .finish()
    }
}

impl ComparisonConfig {
    /// Create a new builder for `ComparisonConfig`.
    pub fn builder() -> ComparisonConfigBuilder {
        ComparisonConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ComparisonConfig`].
#[derive(Debug)]
pub struct ComparisonConfigBuilder {
    config: ComparisonConfig,
}

impl ComparisonConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn verbose_agents(mut self, v: bool) -> Self {
        self.config.verbose_agents = v;
        self
    }

    pub fn drive_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.drive_base_url = url.into();
        self
    }

    pub fn sheets_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.sheets_base_url = url.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ComparisonConfig, CompareError> {
        let c = &self.config;
        if c.provider_name.trim().is_empty() {
            return Err(CompareError::InvalidConfig(
                "provider name must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(CompareError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(CompareError::InvalidConfig(
                "model must not be blank when set".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Configuration for the web front end.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: "127.0.0.1:8501".
    pub bind: String,
    /// Link shown in the sidebar to the master curriculum spreadsheet.
    /// Default: [`DEFAULT_MASTER_SHEET_URL`]; `None` hides the link.
    pub master_sheet_url: Option<String>,
    /// Largest accepted multipart body in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,
    /// Pre-filled spreadsheet name field.
    pub default_spreadsheet: String,
    /// Pre-filled worksheet name field.
    pub default_worksheet: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
            master_sheet_url: Some(DEFAULT_MASTER_SHEET_URL.to_string()),
            max_upload_bytes: 20 * 1024 * 1024,
            default_spreadsheet: "Master_Curriculums".to_string(),
            default_worksheet: "CyberSecurity".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ComparisonConfig::default();
        assert_eq!(c.provider_name, "openai");
        assert_eq!(c.max_retries, 0);
        assert_eq!(c.max_tokens, 4096);
        assert!(c.model.is_none());
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = ComparisonConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_empty_provider() {
        let err = ComparisonConfig::builder()
            .provider_name("  ")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }

    #[test]
    fn builder_rejects_zero_max_tokens() {
        assert!(ComparisonConfig::builder().max_tokens(0).build().is_err());
    }

    #[test]
    fn server_defaults_match_form() {
        let s = ServerConfig::default();
        assert_eq!(s.default_spreadsheet, "Master_Curriculums");
        assert_eq!(s.default_worksheet, "CyberSecurity");
    }

    #[test]
    fn server_links_master_sheet_by_default() {
        let s = ServerConfig::default();
        assert_eq!(s.master_sheet_url.as_deref(), Some(DEFAULT_MASTER_SHEET_URL));
        assert!(DEFAULT_MASTER_SHEET_URL.starts_with("https://docs.google.com/spreadsheets/d/"));
    }
}
