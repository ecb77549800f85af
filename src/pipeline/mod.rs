//! Pipeline stages feeding the comparison crew.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! sheets ──────────────────────────────┐
//! (Sheets API → grid)                  ▼
//! pdf ──▶ curriculum ──▶ PDF tool ──▶ llm (three completions)
//! (pdfium) (marker slice)
//! ```
//!
//! 1. [`sheets`]: service-account auth and worksheet fetch; the only
//!    stage besides [`llm`] with network I/O
//! 2. [`pdf`]: page text via pdfium in `spawn_blocking`, because
//!    pdfium is not async-safe
//! 3. [`curriculum`]: pure text slicing between the curriculum markers
//! 4. [`llm`]: completion calls with retry/backoff

pub mod curriculum;
pub mod llm;
pub mod pdf;
pub mod sheets;
