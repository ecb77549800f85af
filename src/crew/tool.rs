//! Tools: callables an agent runs before its model call.
//!
//! A tool's output is added to the task prompt under its name. Tools run
//! once per task, in the order they were bound to the agent.

use crate::error::PdfError;
use crate::pipeline::pdf::{extract_curriculum, PageTextSource};
use crate::prompts::NO_PDF_ITEMS;
use std::sync::Arc;
use thiserror::Error;

/// A tool failure, reported as [`crate::error::CrewError::Tool`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ToolError(pub String);

pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn run(&self) -> Result<String, ToolError>;
}

/// Tool giving the PDF extractor agent the brochure's curriculum lines.
///
/// Extraction happens once, when the tool is built, so a broken upload is
/// rejected before any agent or task exists.
#[derive(Debug, Clone)]
pub struct PdfExtractorTool {
    items: Vec<String>,
}

impl PdfExtractorTool {
    pub const NAME: &'static str = "PDF Extractor";
    pub const DESCRIPTION: &'static str = "Extracts curriculum items from a PDF file.";

    /// Extract the curriculum from `bytes` and hold the result.
    pub async fn extract(
        source: Arc<dyn PageTextSource>,
        bytes: Arc<[u8]>,
    ) -> Result<Self, PdfError> {
        let items = extract_curriculum(source, bytes).await?;
        Ok(Self { items })
    }

    pub fn from_items(items: Vec<String>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }
}

impl Tool for PdfExtractorTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        Self::DESCRIPTION
    }

    fn run(&self) -> Result<String, ToolError> {
        if self.items.is_empty() {
            return Ok(NO_PDF_ITEMS.to_string());
        }
        Ok(self
            .items
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_items_as_bullets() {
        let tool = PdfExtractorTool::from_items(vec!["Term 1".into(), "Module A".into()]);
        assert_eq!(tool.run().unwrap(), "- Term 1\n- Module A");
        assert_eq!(tool.name(), "PDF Extractor");
    }

    #[test]
    fn empty_items_explain_themselves() {
        let tool = PdfExtractorTool::from_items(Vec::new());
        assert_eq!(tool.run().unwrap(), NO_PDF_ITEMS);
    }
}
