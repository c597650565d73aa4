//! System-instruction rendering for the language capability.

use crate::orchestrator::catalog::ToolDefinition;
use minijinja::{Environment, context};
use thiserror::Error;

/// Instruction template rendered once per engine with the operation catalog.
const INSTRUCTIONS_TEMPLATE: &str = "\
You are a helpful task list assistant.

Your role is to help users manage their tasks using natural language. You have access to the following tools:
{% for tool in tools %}- {{ tool.name }}: {{ tool.description }}
{% endfor %}
Guidelines:
- When the user wants to add, create, or remember something, extract the task title from their message and call add_task. Extra details become the description.
- If a request to add something carries no usable title, do not call add_task; ask what they would like to add instead.
- When the user asks what is on their list, call list_tasks with the status filter their wording implies (all, pending, or completed).
- When the user refers to an existing task, pass its task_id if a previous list_tasks result identifies it; otherwise pass their wording as the reference argument and the system will resolve it.
- Request at most one tool call at a time and wait for its result.
- Never invent task identifiers, and never include another user's data in a reply.
- Always be helpful, friendly, and conversational.
";

/// Errors returned while rendering the instruction template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    /// Template rendering failed.
    #[error("instruction template rendering failed: {reason}")]
    TemplateRender {
        /// Underlying renderer message.
        reason: String,
    },
}

/// Renders the system instructions for the given operation catalog.
///
/// # Errors
///
/// Returns [`PromptError::TemplateRender`] when the template cannot be
/// rendered.
pub fn render_instructions(catalog: &[ToolDefinition]) -> Result<String, PromptError> {
    let environment = Environment::new();
    environment
        .render_str(INSTRUCTIONS_TEMPLATE, context! { tools => catalog })
        .map_err(|error| PromptError::TemplateRender {
            reason: error.to_string(),
        })
}
