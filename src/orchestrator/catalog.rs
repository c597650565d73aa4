//! Closed catalog of the dispatchable task operations.
//!
//! The five operations form a closed tagged union: the turn engine matches
//! exhaustively over [`OperationCall`], so adding an operation is a
//! compile-time-checked extension rather than a dynamic lookup. The JSON
//! tool definitions handed to the language capability are rendered from the
//! same source of truth and deliberately omit the user identifier: identity
//! comes from the verified credential, never from capability output.

use crate::task::domain::{StatusFilter, TaskId};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use uuid::Uuid;

/// Reference to an existing task within an operation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSelector {
    /// The task is identified directly.
    Id(TaskId),
    /// The task is referenced by a natural-language phrase and must go
    /// through the reference resolver before dispatch.
    Phrase(String),
}

/// One requested operation with typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationCall {
    /// Create a new task.
    AddTask {
        /// Requested title, not yet validated.
        title: String,
        /// Optional description.
        description: Option<String>,
    },
    /// List the user's tasks.
    ListTasks {
        /// Completion-status filter.
        status: StatusFilter,
    },
    /// Mark a task completed.
    CompleteTask {
        /// The task to complete.
        selector: TaskSelector,
    },
    /// Remove a task.
    DeleteTask {
        /// The task to delete.
        selector: TaskSelector,
    },
    /// Change a task's title and/or description.
    UpdateTask {
        /// The task to update.
        selector: TaskSelector,
        /// Replacement title, when given.
        title: Option<String>,
        /// Replacement description, when given.
        description: Option<String>,
    },
}

impl OperationCall {
    /// Returns the wire name of the operation.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddTask { .. } => "add_task",
            Self::ListTasks { .. } => "list_tasks",
            Self::CompleteTask { .. } => "complete_task",
            Self::DeleteTask { .. } => "delete_task",
            Self::UpdateTask { .. } => "update_task",
        }
    }

    /// Parses a named tool invocation into a typed operation call.
    ///
    /// # Errors
    ///
    /// Returns [`OperationParseError::UnknownOperation`] for a name outside
    /// the catalog, [`OperationParseError::MissingArgument`] when a required
    /// argument is absent, and [`OperationParseError::InvalidArgument`] when
    /// a value has the wrong shape.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, OperationParseError> {
        match name {
            "add_task" => Ok(Self::AddTask {
                title: required_str(arguments, "title")?.to_owned(),
                description: optional_str(arguments, "description")?.map(str::to_owned),
            }),
            "list_tasks" => Ok(Self::ListTasks {
                status: parse_status(arguments)?,
            }),
            "complete_task" => Ok(Self::CompleteTask {
                selector: parse_selector(arguments)?,
            }),
            "delete_task" => Ok(Self::DeleteTask {
                selector: parse_selector(arguments)?,
            }),
            "update_task" => Ok(Self::UpdateTask {
                selector: parse_selector(arguments)?,
                title: optional_str(arguments, "title")?.map(str::to_owned),
                description: optional_str(arguments, "description")?.map(str::to_owned),
            }),
            other => Err(OperationParseError::UnknownOperation(other.to_owned())),
        }
    }
}

/// Errors returned while parsing a tool invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OperationParseError {
    /// The operation name is not in the catalog.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// A required argument is missing.
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    /// An argument has the wrong type or an out-of-range value.
    #[error("invalid value for argument: {0}")]
    InvalidArgument(&'static str),
}

fn required_str<'a>(
    arguments: &'a Value,
    key: &'static str,
) -> Result<&'a str, OperationParseError> {
    match arguments.get(key) {
        Some(Value::String(value)) => Ok(value),
        Some(Value::Null) | None => Err(OperationParseError::MissingArgument(key)),
        Some(_) => Err(OperationParseError::InvalidArgument(key)),
    }
}

fn optional_str<'a>(
    arguments: &'a Value,
    key: &'static str,
) -> Result<Option<&'a str>, OperationParseError> {
    match arguments.get(key) {
        Some(Value::String(value)) => Ok(Some(value)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(OperationParseError::InvalidArgument(key)),
    }
}

fn parse_status(arguments: &Value) -> Result<StatusFilter, OperationParseError> {
    optional_str(arguments, "status")?.map_or(Ok(StatusFilter::All), |raw| {
        StatusFilter::try_from(raw).map_err(|_| OperationParseError::InvalidArgument("status"))
    })
}

fn parse_selector(arguments: &Value) -> Result<TaskSelector, OperationParseError> {
    if let Some(raw) = optional_str(arguments, "task_id")? {
        let uuid = Uuid::parse_str(raw)
            .map_err(|_| OperationParseError::InvalidArgument("task_id"))?;
        return Ok(TaskSelector::Id(TaskId::from_uuid(uuid)));
    }
    if let Some(phrase) = optional_str(arguments, "reference")? {
        if phrase.trim().is_empty() {
            return Err(OperationParseError::InvalidArgument("reference"));
        }
        return Ok(TaskSelector::Phrase(phrase.to_owned()));
    }
    Err(OperationParseError::MissingArgument("task_id"))
}

/// Tool metadata handed to the language capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Value,
}

impl ToolDefinition {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            input_schema,
        }
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the JSON schema of the tool arguments.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }
}

/// One dispatched operation within a turn result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationRecord {
    /// Wire name of the dispatched operation.
    pub name: String,
    /// Arguments as dispatched, after reference resolution.
    pub arguments: Value,
    /// Structured operation result.
    pub result: Value,
}

fn selector_properties() -> serde_json::Map<String, Value> {
    let mut properties = serde_json::Map::new();
    properties.insert(
        "task_id".to_owned(),
        json!({
            "type": "string",
            "format": "uuid",
            "description": "Identifier of the task, when known from an earlier list_tasks result."
        }),
    );
    properties.insert(
        "reference".to_owned(),
        json!({
            "type": "string",
            "description": "Natural-language reference to the task when its identifier is unknown, e.g. 'the milk task'."
        }),
    );
    properties
}

/// Returns the catalog of tool definitions for the five task operations.
#[must_use]
pub fn operation_catalog() -> Vec<ToolDefinition> {
    let mut update_properties = selector_properties();
    update_properties.insert(
        "title".to_owned(),
        json!({
            "type": "string",
            "description": "Replacement title (1-200 characters)."
        }),
    );
    update_properties.insert(
        "description".to_owned(),
        json!({
            "type": "string",
            "description": "Replacement description (max 2000 characters)."
        }),
    );

    vec![
        ToolDefinition::new(
            "add_task",
            "Create a new task on the user's list.",
            json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Task title extracted from the user's message (1-200 characters)."
                    },
                    "description": {
                        "type": "string",
                        "description": "Optional additional details about the task (max 2000 characters)."
                    }
                },
                "required": ["title"]
            }),
        ),
        ToolDefinition::new(
            "list_tasks",
            "Retrieve the user's tasks, optionally filtered by completion status.",
            json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": ["all", "pending", "completed"],
                        "description": "Completion-status filter; defaults to 'all'."
                    }
                }
            }),
        ),
        ToolDefinition::new(
            "complete_task",
            "Mark one of the user's tasks as done.",
            json!({
                "type": "object",
                "properties": Value::Object(selector_properties()),
                "anyOf": [{"required": ["task_id"]}, {"required": ["reference"]}]
            }),
        ),
        ToolDefinition::new(
            "delete_task",
            "Permanently remove one of the user's tasks.",
            json!({
                "type": "object",
                "properties": Value::Object(selector_properties()),
                "anyOf": [{"required": ["task_id"]}, {"required": ["reference"]}]
            }),
        ),
        ToolDefinition::new(
            "update_task",
            "Change the title and/or description of one of the user's tasks.",
            json!({
                "type": "object",
                "properties": Value::Object(update_properties),
                "anyOf": [{"required": ["task_id"]}, {"required": ["reference"]}]
            }),
        ),
    ]
}
