//! Agent crew: role-framed agents, tasks with context dependencies, and a
//! sequential process executed by a single [`Crew::kickoff`] call.
//!
//! ## Execution
//!
//! ```text
//! task 1 ──▶ task 2 ──▶ task 3 (context: 1, 2)
//!   │          │          │
//!   tools      tools      tools        run the agent's tools
//!   model      model      model        one completion per task
//! ```
//!
//! Tasks run strictly in list order. Context references must point to
//! earlier tasks, which [`Crew::new`] checks, so every task starts only after
//! all of its context tasks have completed and their outputs are in its
//! prompt. The first failure stops the run; no partial result is returned.

pub mod agent;
pub mod task;
pub mod tool;

pub use agent::Agent;
pub use task::{interpolate, Inputs, Task, TaskId};
pub use tool::{PdfExtractorTool, Tool, ToolError};

use crate::config::ComparisonConfig;
use crate::error::CrewError;
use crate::output::{CrewOutput, TaskOutput};
use crate::pipeline::llm::{complete_with_retry, CompletionModel, ModelRequest};
use crate::progress::ProgressCallback;
use crate::prompts::expected_output_clause;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

/// Execution order policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Process {
    /// One task at a time, in list order.
    #[default]
    Sequential,
}

/// Per-kickoff model settings.
#[derive(Clone, Default)]
pub struct KickoffOptions {
    pub temperature: f32,
    pub max_tokens: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub progress: Option<ProgressCallback>,
}

impl KickoffOptions {
    pub fn from_config(config: &ComparisonConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }
}

/// A validated group of agents and tasks.
#[derive(Debug, Clone)]
pub struct Crew {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    process: Process,
}

impl Crew {
    /// Validate and assemble a crew.
    ///
    /// Rejects an empty task list, duplicate agent roles, tasks assigned to
    /// agents outside the crew, and context references to the same or a
    /// later task.
    pub fn new(agents: Vec<Agent>, tasks: Vec<Task>, process: Process) -> Result<Self, CrewError> {
        if tasks.is_empty() {
            return Err(CrewError::NoTasks);
        }

        let mut roles = HashSet::new();
        for agent in &agents {
            if !roles.insert(agent.role.as_str()) {
                return Err(CrewError::DuplicateAgent(agent.role.clone()));
            }
        }

        for (idx, task) in tasks.iter().enumerate() {
            if !roles.contains(task.agent.as_str()) {
                return Err(CrewError::UnknownAgent {
                    task: idx + 1,
                    role: task.agent.clone(),
                });
            }
            if let Some(&bad) = task.context.iter().find(|&&c| c >= idx) {
                return Err(CrewError::InvalidContext {
                    task: idx + 1,
                    context: bad + 1,
                });
            }
        }

        Ok(Self {
            agents,
            tasks,
            process,
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn process(&self) -> Process {
        self.process
    }

    fn agent(&self, role: &str) -> &Agent {
        // Crew::new guarantees every task's agent exists.
        self.agents
            .iter()
            .find(|a| a.role == role)
            .unwrap_or(&self.agents[0])
    }

    /// Run every task in order and return the last task's answer.
    pub async fn kickoff(
        &self,
        model: &dyn CompletionModel,
        inputs: &Inputs,
        options: &KickoffOptions,
    ) -> Result<CrewOutput, CrewError> {
        let start = Instant::now();
        let total = self.tasks.len();
        info!("Crew kickoff: {} tasks, {:?} process", total, self.process);
        if let Some(ref cb) = options.progress {
            cb.on_kickoff_start(total);
        }

        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(total);
        for (idx, task) in self.tasks.iter().enumerate() {
            let result = self.run_task(idx, task, &outputs, model, inputs, options).await;
            match result {
                Ok(output) => {
                    if let Some(ref cb) = options.progress {
                        cb.on_task_complete(idx + 1, total, output.raw.len());
                    }
                    outputs.push(output);
                }
                Err(e) => {
                    if let Some(ref cb) = options.progress {
                        cb.on_task_error(idx + 1, total, &e.to_string());
                    }
                    return Err(e);
                }
            }
        }

        if let Some(ref cb) = options.progress {
            cb.on_kickoff_complete(total);
        }

        let raw = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();
        let duration_ms = start.elapsed().as_millis() as u64;
        info!("Crew finished in {}ms", duration_ms);

        Ok(CrewOutput {
            raw,
            tasks_output: outputs,
            duration_ms,
        })
    }

    async fn run_task(
        &self,
        idx: usize,
        task: &Task,
        completed: &[TaskOutput],
        model: &dyn CompletionModel,
        inputs: &Inputs,
        options: &KickoffOptions,
    ) -> Result<TaskOutput, CrewError> {
        let start = Instant::now();
        let agent = self.agent(&task.agent);
        info!("Task {}/{}: {}", idx + 1, self.tasks.len(), agent.role);
        if let Some(ref cb) = options.progress {
            cb.on_task_start(idx + 1, self.tasks.len(), &agent.role);
        }

        let mut tool_results = Vec::with_capacity(agent.tools.len());
        for tool in &agent.tools {
            let output = tool.run().map_err(|e| CrewError::Tool {
                tool: tool.name().to_string(),
                detail: e.to_string(),
            })?;
            debug!("Tool '{}' returned {} chars", tool.name(), output.len());
            tool_results.push((tool.name(), tool.description(), output));
        }

        // Context tasks all ran earlier (checked in Crew::new).
        let context: Vec<&TaskOutput> = task
            .context
            .iter()
            .filter_map(|&c| completed.get(c))
            .collect();

        let user = build_task_prompt(task, inputs, &tool_results, &context);
        let request = ModelRequest {
            system: agent.system_prompt(),
            user,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };
        if agent.verbose {
            debug!("[{}] prompt:\n{}", agent.role, request.user);
        }

        let (reply, retries) = complete_with_retry(
            model,
            &request,
            options.max_retries,
            options.retry_backoff_ms,
        )
        .await
        .map_err(|source| CrewError::TaskFailed {
            task: idx + 1,
            role: agent.role.clone(),
            retries: options.max_retries,
            source,
        })?;

        if agent.verbose {
            debug!("[{}] answer:\n{}", agent.role, reply.content);
        }

        Ok(TaskOutput {
            task: idx + 1,
            description: task.description.clone(),
            agent: agent.role.clone(),
            raw: reply.content,
            prompt_tokens: reply.prompt_tokens,
            completion_tokens: reply.completion_tokens,
            duration_ms: start.elapsed().as_millis() as u64,
            retries,
        })
    }
}

/// Compose the user message for a task.
pub fn build_task_prompt(
    task: &Task,
    inputs: &Inputs,
    tool_results: &[(&str, &str, String)],
    context: &[&TaskOutput],
) -> String {
    let mut prompt = interpolate(&task.description, inputs);
    prompt.push_str("\n\n");
    prompt.push_str(&expected_output_clause(&task.expected_output));

    if !tool_results.is_empty() {
        prompt.push_str("\n\n# Tool results");
        for (name, description, output) in tool_results {
            prompt.push_str(&format!("\n\n## {name} ({description})\n{output}"));
        }
    }

    if !context.is_empty() {
        prompt.push_str("\n\n# Context from previous tasks");
        for out in context {
            prompt.push_str(&format!(
                "\n\n## Task {} output ({})\n{}",
                out.task, out.agent, out.raw
            ));
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::pipeline::llm::ModelReply;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Answers "<role> answer" and records every request.
    #[derive(Default)]
    struct EchoModel {
        requests: Mutex<Vec<ModelRequest>>,
        fail_on_call: Option<usize>,
    }

    #[async_trait]
    impl CompletionModel for EchoModel {
        async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
            let mut reqs = self.requests.lock().unwrap();
            reqs.push(request.clone());
            if Some(reqs.len()) == self.fail_on_call {
                return Err(ModelError::Api {
                    message: "model down".into(),
                });
            }
            let role = request
                .system
                .strip_prefix("You are ")
                .and_then(|s| s.split('.').next())
                .unwrap_or("?");
            Ok(ModelReply {
                content: format!("{role} answer"),
                prompt_tokens: 10,
                completion_tokens: 5,
            })
        }
    }

    fn agents() -> Vec<Agent> {
        vec![
            Agent::new("Reader", "read", "reads")
                .with_tool(Arc::new(PdfExtractorTool::from_items(vec!["Module A".into()]))),
            Agent::new("Formatter", "format", "formats"),
            Agent::new("Judge", "judge", "judges"),
        ]
    }

    fn tasks() -> Vec<Task> {
        vec![
            Task::new("Read the brochure", "items", "Reader"),
            Task::new("Format {sheet_data}", "curriculum", "Formatter"),
            Task::new("Compare", "report", "Judge").with_context([0, 1]),
        ]
    }

    fn inputs() -> Inputs {
        let mut i = Inputs::new();
        i.insert("sheet_data".into(), "Term 1 | Module A".into());
        i
    }

    #[test]
    fn rejects_forward_context() {
        let tasks = vec![
            Task::new("a", "a", "Reader").with_context([1]),
            Task::new("b", "b", "Reader"),
        ];
        let err = Crew::new(agents(), tasks, Process::Sequential).unwrap_err();
        assert!(matches!(err, CrewError::InvalidContext { task: 1, context: 2 }));
    }

    #[test]
    fn rejects_self_context() {
        let tasks = vec![Task::new("a", "a", "Reader").with_context([0])];
        assert!(matches!(
            Crew::new(agents(), tasks, Process::Sequential),
            Err(CrewError::InvalidContext { .. })
        ));
    }

    #[test]
    fn rejects_unknown_agent_and_empty_tasks() {
        let tasks = vec![Task::new("a", "a", "Nobody")];
        assert!(matches!(
            Crew::new(agents(), tasks, Process::Sequential),
            Err(CrewError::UnknownAgent { task: 1, .. })
        ));
        assert!(matches!(
            Crew::new(agents(), vec![], Process::Sequential),
            Err(CrewError::NoTasks)
        ));
    }

    #[test]
    fn rejects_duplicate_roles() {
        let agents = vec![Agent::new("A", "g", "b"), Agent::new("A", "g2", "b2")];
        let tasks = vec![Task::new("a", "a", "A")];
        assert!(matches!(
            Crew::new(agents, tasks, Process::Sequential),
            Err(CrewError::DuplicateAgent(_))
        ));
    }

    #[tokio::test]
    async fn runs_tasks_in_order_with_context() {
        let crew = Crew::new(agents(), tasks(), Process::Sequential).unwrap();
        let model = EchoModel::default();
        let out = crew
            .kickoff(&model, &inputs(), &KickoffOptions::default())
            .await
            .unwrap();

        let order: Vec<&str> = out.tasks_output.iter().map(|t| t.agent.as_str()).collect();
        assert_eq!(order, vec!["Reader", "Formatter", "Judge"]);
        assert_eq!(out.raw, "Judge answer");
        assert_eq!(out.total_prompt_tokens(), 30);

        let reqs = model.requests.lock().unwrap();
        assert_eq!(reqs.len(), 3);
        // Tool output reaches the reader's prompt.
        assert!(reqs[0].user.contains("- Module A"));
        // Inputs are interpolated.
        assert!(reqs[1].user.starts_with("Format Term 1 | Module A"));
        // The comparison prompt carries both prior answers.
        assert!(reqs[2].user.contains("Reader answer"));
        assert!(reqs[2].user.contains("Formatter answer"));
        assert!(!reqs[1].user.contains("Reader answer"));
    }

    #[tokio::test]
    async fn failure_stops_the_run() {
        let crew = Crew::new(agents(), tasks(), Process::Sequential).unwrap();
        let model = EchoModel {
            fail_on_call: Some(2),
            ..Default::default()
        };
        let err = crew
            .kickoff(&model, &inputs(), &KickoffOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CrewError::TaskFailed { task: 2, .. }));
        assert_eq!(model.requests.lock().unwrap().len(), 2);
    }

    #[test]
    fn prompt_sections() {
        let task = Task::new("Do it", "a list", "Reader");
        let ctx = TaskOutput {
            task: 1,
            description: "x".into(),
            agent: "Reader".into(),
            raw: "prior".into(),
            prompt_tokens: 0,
            completion_tokens: 0,
            duration_ms: 0,
            retries: 0,
        };
        let p = build_task_prompt(
            &task,
            &Inputs::new(),
            &[("PDF Extractor", "extracts", "- A".to_string())],
            &[&ctx],
        );
        assert!(p.starts_with("Do it\n\nThis is the expected criteria for your final answer: a list"));
        assert!(p.contains("## PDF Extractor (extracts)\n- A"));
        assert!(p.contains("## Task 1 output (Reader)\nprior"));
    }
}
