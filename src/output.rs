//! Result types produced by the crew and the comparison pipeline.

use serde::{Deserialize, Serialize};

/// The output of one crew task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// 1-indexed position in the crew's task list (= execution order).
    pub task: usize,
    pub description: String,
    /// Role of the agent that ran the task.
    pub agent: String,
    /// The model's free-text answer.
    pub raw: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub duration_ms: u64,
    pub retries: u32,
}

/// The result of a crew kickoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewOutput {
    /// The last task's answer.
    pub raw: String,
    /// Every task's output, in execution order.
    pub tasks_output: Vec<TaskOutput>,
    pub duration_ms: u64,
}

impl CrewOutput {
    pub fn total_prompt_tokens(&self) -> u64 {
        self.tasks_output.iter().map(|t| t.prompt_tokens as u64).sum()
    }

    pub fn total_completion_tokens(&self) -> u64 {
        self.tasks_output.iter().map(|t| t.completion_tokens as u64).sum()
    }
}

/// Timing and token statistics for a comparison run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonStats {
    pub model: String,
    pub fetch_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub crew_duration_ms: u64,
    pub total_duration_ms: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

/// Everything a comparison run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// The comparator's free-text report, rendered as-is.
    pub result: String,
    /// Outputs of all three tasks.
    pub tasks: Vec<TaskOutput>,
    /// Curriculum lines extracted from the brochure.
    pub pdf_items: Vec<String>,
    pub sheet_rows: usize,
    pub sheet_columns: usize,
    pub stats: ComparisonStats,
}
