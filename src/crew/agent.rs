use super::tool::Tool;
use crate::prompts::agent_system_prompt;
use std::fmt;
use std::sync::Arc;

/// A role-framed participant in the crew.
///
/// Role, goal and backstory only shape the system prompt; tools are run
/// before each of the agent's model calls.
#[derive(Clone)]
pub struct Agent {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<Arc<dyn Tool>>,
    /// Log prompts and answers at `debug` level.
    pub verbose: bool,
}

impl Agent {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
            verbose: false,
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn verbose(mut self, v: bool) -> Self {
        self.verbose = v;
        self
    }

    pub fn system_prompt(&self) -> String {
        agent_system_prompt(&self.role, &self.goal, &self.backstory)
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name().to_string()).collect::<Vec<_>>(),
            )
            .field("verbose", &self.verbose)
            .finish()
    }
}
