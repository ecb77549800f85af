//! Marker-based slicing of the curriculum section out of brochure text.
//!
//! Brochures mark the syllabus with two literal markers:
//!
//! ```text
//! … marketing copy …
//! Curriculum:
//! Term 1
//! Module 1: Network Security
//! End of Curriculum
//! … more copy …
//! ```
//!
//! Boundary policy:
//!
//! | Text contains                         | Span                                     |
//! |---------------------------------------|------------------------------------------|
//! | both markers, end after start         | strictly between the markers             |
//! | start marker only                     | from just after the start marker to EOF  |
//! | no start marker                       | none (no items)                          |
//!
//! Matching is literal and case-sensitive. Only the first start marker counts;
//! the end marker is searched for from the start offset onwards.

/// Literal marker opening the curriculum section.
pub const START_MARKER: &str = "Curriculum:";
/// Literal marker closing the curriculum section.
pub const END_MARKER: &str = "End of Curriculum";

/// Return the raw text between the markers, or `None` when the start marker
/// is absent.
pub fn slice_curriculum(text: &str) -> Option<&str> {
    let start = text.find(START_MARKER)? + START_MARKER.len();
    let rest = &text[start..];
    let end = rest.find(END_MARKER).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Split the curriculum section into trimmed, non-empty lines in document
/// order. Returns an empty list when the text has no start marker.
pub fn curriculum_items(text: &str) -> Vec<String> {
    let Some(span) = slice_curriculum(text) else {
        return Vec::new();
    };
    span.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_markers() {
        let text = "Intro text\nCurriculum:\n  Term 1\nModule A\n\n  Topic 1  \nEnd of Curriculum\nFooter";
        assert_eq!(
            curriculum_items(text),
            vec!["Term 1", "Module A", "Topic 1"]
        );
    }

    #[test]
    fn start_marker_only_runs_to_end() {
        let text = "Curriculum:\nModule A\nModule B\n";
        assert_eq!(curriculum_items(text), vec!["Module A", "Module B"]);
    }

    #[test]
    fn no_start_marker_yields_nothing() {
        let text = "Module A\nEnd of Curriculum\nModule B";
        assert!(slice_curriculum(text).is_none());
        assert!(curriculum_items(text).is_empty());
    }

    #[test]
    fn end_marker_before_start_is_ignored() {
        let text = "End of Curriculum\nCurriculum:\nModule A\nModule B";
        assert_eq!(curriculum_items(text), vec!["Module A", "Module B"]);
    }

    #[test]
    fn same_line_content_after_marker_is_kept() {
        let text = "Curriculum: Term 1\nModule A End of Curriculum trailing";
        assert_eq!(curriculum_items(text), vec!["Term 1", "Module A"]);
    }

    #[test]
    fn crlf_line_breaks() {
        let text = "Curriculum:\r\nModule A\r\n\r\nModule B\r\nEnd of Curriculum";
        assert_eq!(curriculum_items(text), vec!["Module A", "Module B"]);
    }

    #[test]
    fn markers_are_case_sensitive() {
        assert!(curriculum_items("curriculum:\nModule A").is_empty());
    }

    #[test]
    fn first_start_marker_wins() {
        let text = "Curriculum:\nA\nCurriculum:\nB\nEnd of Curriculum";
        assert_eq!(curriculum_items(text), vec!["A", "Curriculum:", "B"]);
    }

    #[test]
    fn empty_section() {
        assert!(curriculum_items("Curriculum:End of Curriculum").is_empty());
    }
}
