//! Brochure text extraction: PDF bytes → per-page text → curriculum items.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which is not safe
//! to drive from async contexts. [`extract_curriculum`] runs the page-text
//! pass on the blocking thread pool so Tokio workers keep serving other
//! requests while a large brochure is parsed.
//!
//! ## Why a trait?
//!
//! Marker slicing ([`super::curriculum`]) is pure and does not care where the
//! text came from. [`PageTextSource`] is the seam between the two: production
//! uses [`PdfiumTextSource`], tests hand in fixed page strings.

use crate::error::PdfError;
use crate::pipeline::curriculum::curriculum_items;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Anything that can turn PDF bytes into one string per page.
pub trait PageTextSource: Send + Sync {
    /// Return the text of every page in order. A page without extractable
    /// text yields `""`; only a document that cannot be opened is an error.
    fn page_texts(&self, pdf: &[u8]) -> Result<Vec<String>, PdfError>;
}

/// Production text source backed by pdfium.
///
/// The library is located (and downloaded on first use) by `pdfium-auto`;
/// set `PDFIUM_LIB_PATH` to point at an existing copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumTextSource;

impl PageTextSource for PdfiumTextSource {
    fn page_texts(&self, pdf: &[u8]) -> Result<Vec<String>, PdfError> {
        let pdfium = pdfium_auto::bind_pdfium_silent()
            .map_err(|e| PdfError::PdfiumBindingFailed(e.to_string()))?;

        // The document borrows `pdf` and is dropped when this scope ends,
        // on every return path.
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| PdfError::Corrupt {
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let texts = pages
            .iter()
            .enumerate()
            .map(|(idx, page)| match page.text() {
                Ok(text) => text.all(),
                Err(e) => {
                    warn!("Page {}: no extractable text ({:?})", idx + 1, e);
                    String::new()
                }
            })
            .collect();

        Ok(texts)
    }
}

/// Check the upload looks like a PDF before handing it to pdfium.
pub fn validate_upload(bytes: &[u8]) -> Result<(), PdfError> {
    if bytes.is_empty() {
        return Err(PdfError::Empty);
    }
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(PdfError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Concatenate page texts and slice out the curriculum lines.
pub fn curriculum_from_pages(pages: &[String]) -> Vec<String> {
    let text = pages.concat();
    curriculum_items(&text)
}

/// Extract the brochure's curriculum items.
///
/// Runs the text source on the blocking pool. An empty result (no
/// `Curriculum:` marker, or an empty section) is not an error; it is
/// logged and returned as-is.
pub async fn extract_curriculum(
    source: Arc<dyn PageTextSource>,
    bytes: Arc<[u8]>,
) -> Result<Vec<String>, PdfError> {
    validate_upload(&bytes)?;

    let pages = tokio::task::spawn_blocking(move || source.page_texts(&bytes))
        .await
        .map_err(|e| PdfError::Internal(format!("PDF extraction task panicked: {}", e)))??;

    debug!(
        "Extracted {} chars from {} pages",
        pages.iter().map(String::len).sum::<usize>(),
        pages.len()
    );

    let items = curriculum_from_pages(&pages);
    if items.is_empty() {
        warn!("No curriculum section found in the brochure");
    }
    info!("Extracted from PDF: {:?}", items);
    Ok(items)
}
