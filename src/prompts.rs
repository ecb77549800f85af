//! Agent framing and task prompts for the curriculum comparison crew.
//!
//! Every piece of natural-language text sent to the model lives here so it can
//! be reviewed and tested without running the pipeline.

// ── Agents ───────────────────────────────────────────────────────────────

pub const PDF_EXTRACTOR_ROLE: &str = "PDF Curriculum Extractor";
pub const PDF_EXTRACTOR_GOAL: &str = "Extract curriculum items from the PDF brochure";
pub const PDF_EXTRACTOR_BACKSTORY: &str =
    "Expert in document parsing and retrieval-augmented generation";

pub const SHEET_EXTRACTOR_ROLE: &str = "Curriculum Extractor and Formatter";
pub const SHEET_EXTRACTOR_GOAL: &str = "Extract curriculum (terms, topics, modules) and structure it properly from the provided Google Sheet data.";
pub const SHEET_EXTRACTOR_BACKSTORY: &str = "Specialist in accessing, processing, and structuring data";

pub const COMPARATOR_ROLE: &str = "Curriculum Comparator Expert";
pub const COMPARATOR_GOAL: &str = "Compare the brochure curriculum against the Google Sheet curriculum, using the latter as the primary reference. \
Identify discrepancies including capitalization, grammar, spelling, missing or extra items, and topic counts within modules.";
pub const COMPARATOR_BACKSTORY: &str = "Proficient in data analysis and comparison";

// ── Tasks ────────────────────────────────────────────────────────────────

pub const PDF_TASK_DESCRIPTION: &str = "Extract program syllabus items (terms, modules, and topics) from the PDF brochure, ignoring unrelated content.";
pub const PDF_TASK_EXPECTED: &str = "List of program syllabus items from the PDF";

/// The `{sheet_data}` placeholder is filled from the kickoff inputs.
pub const SHEET_TASK_DESCRIPTION: &str = "Extract curriculum items (terms, modules, and topics) from the provided Google Sheet data.\n\n\
Google Sheet data (one row per line, cells separated by ' | '):\n{sheet_data}";
pub const SHEET_TASK_EXPECTED: &str = "Curriculum formatted as Terms, Modules, and Topics";

pub const COMPARE_TASK_DESCRIPTION: &str = "Compare the brochure curriculum against the curriculum extracted by the Curriculum Extractor and Formatter, using the latter as the primary reference. \
Conduct a thorough review to identify even the smallest discrepancies, including:
- Capitalization inconsistencies (e.g., title case vs. sentence case differences).
- Grammar and spelling errors across module names, topic descriptions, and overall content.
- Missing topics or modules that are present in the Google Sheet but absent in the brochure.
- Mismatched module or topic names, even if they appear similar but have slight variations.
- Extra or unnecessary words added to module or topic names in the brochure that deviate from the original curriculum.
- Also match the number of topics within the modules.";
pub const COMPARE_TASK_EXPECTED: &str = "Matching values, PDF-only items, Google Sheet-only items, and discrepancy in details and the changes that needs to be done";

// ── Prompt assembly ──────────────────────────────────────────────────────

/// System message framing a model call as the given agent.
pub fn agent_system_prompt(role: &str, goal: &str, backstory: &str) -> String {
    format!(
        "You are {role}. {backstory}\nYour personal goal is: {goal}\n\
Answer only with the requested content, in Markdown."
    )
}

/// Instruction appended after every task description.
pub fn expected_output_clause(expected: &str) -> String {
    format!(
        "This is the expected criteria for your final answer: {expected}\n\
You MUST return the actual complete content as the final answer, not a summary."
    )
}

/// Shown in place of tool output when the brochure has no curriculum section.
pub const NO_PDF_ITEMS: &str = "No curriculum items were found in the brochure (no \"Curriculum:\" section).";
