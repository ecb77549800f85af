use std::collections::BTreeMap;

/// 0-based position of a task in the crew's task list.
pub type TaskId = usize;

/// Named string values substituted into `{placeholder}`s in task descriptions.
pub type Inputs = BTreeMap<String, String>;

/// A unit of work for one agent.
#[derive(Debug, Clone)]
pub struct Task {
    /// Prompt text; may contain `{name}` placeholders filled from [`Inputs`].
    pub description: String,
    pub expected_output: String,
    /// Role of the agent that runs this task.
    pub agent: String,
    /// Tasks whose outputs are passed to this one. Each must run earlier.
    pub context: Vec<TaskId>,
}

impl Task {
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent: agent.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl IntoIterator<Item = TaskId>) -> Self {
        self.context.extend(context);
        self
    }
}

/// Replace each `{key}` whose key is in `inputs`; other braces are left alone.
pub fn interpolate(template: &str, inputs: &Inputs) -> String {
    let mut out = template.to_string();
    for (key, value) in inputs {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}
