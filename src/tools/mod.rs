//! Tool registry and the built-in tools.
//!
//! A tool is a [`ToolDescriptor`]: a unique name, a description, the
//! [`InputSchema`] its arguments must satisfy, and a [`ToolHandler`]
//! variant saying what runs when it is called. Handlers are matched
//! exhaustively, so every registered tool always has exactly one handler.
//!
//! Built-in tools, in registration order:
//!
//! | Tool | Effect |
//! |------|--------|
//! | `add_task` | Appends a pending task |
//! | `list_tasks` | Lists tasks in insertion order |
//! | `complete_task` | Marks a task complete (no-op if already complete) |
//! | `get_weather` | Canned weather for a city |
//! | `calculate` | One arithmetic operation on two numbers |
//! | `evaluate` | Evaluates an arithmetic expression |

pub mod calculator;
pub mod weather;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{DispatchError, RegistryError};
use crate::mcp::schema::{Arguments, InputSchema, ParamType, SchemaViolation};
use crate::tasks::{Completion, TaskStore};

use self::calculator::ArithmeticOp;

/// A tool definition for the tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Concatenates all text content.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What runs when a tool is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolHandler {
    /// Append a task.
    AddTask,
    /// List all tasks.
    ListTasks,
    /// Mark a task complete.
    CompleteTask,
    /// Canned weather report.
    GetWeather,
    /// Two-operand arithmetic.
    Calculate,
    /// Expression evaluation.
    Evaluate,
}

/// A registered tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Declared argument schema.
    pub schema: InputSchema,
    /// Handler variant.
    pub handler: ToolHandler,
}

impl ToolDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(name: &str, description: &str, schema: InputSchema, handler: ToolHandler) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            schema,
            handler,
        }
    }

    /// The listing entry for tools/list.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.schema.to_json_schema(),
        }
    }

    /// Runs the handler on already-validated arguments.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::TaskNotFound`] or
    /// [`DispatchError::Calculation`] for handler failures, or
    /// [`DispatchError::InvalidArguments`] if the handler needs a field the
    /// schema does not guarantee.
    pub fn invoke(
        &self,
        store: &mut TaskStore,
        args: &Arguments,
    ) -> Result<ToolCallResult, DispatchError> {
        let invalid = |source: SchemaViolation| DispatchError::InvalidArguments {
            target: self.name.clone(),
            source,
        };

        match self.handler {
            ToolHandler::AddTask => {
                let title = args.require_str("title").map_err(invalid)?;
                let description = args.str("description").unwrap_or_default();
                let task = store.add(title, description);
                tracing::info!(task_id = task.id, "Task added");
                Ok(ToolCallResult::text(format!(
                    "Task '{}' added with ID {}",
                    task.title, task.id
                )))
            }
            ToolHandler::ListTasks => Ok(ToolCallResult::text(render_task_list(store))),
            ToolHandler::CompleteTask => {
                let id = args.require_integer("task_id").map_err(invalid)?;
                let (task, outcome) = store.complete(id)?;
                let text = match outcome {
                    Completion::Completed => {
                        tracing::info!(task_id = id, "Task completed");
                        format!("Task '{}' marked as completed!", task.title)
                    }
                    Completion::AlreadyCompleted => {
                        format!("Task '{}' was already completed.", task.title)
                    }
                };
                Ok(ToolCallResult::text(text))
            }
            ToolHandler::GetWeather => {
                let city = args.require_str("city").map_err(invalid)?;
                let report = weather::lookup(city);
                Ok(ToolCallResult::text(weather::render(city, &report)))
            }
            ToolHandler::Calculate => {
                let op: ArithmeticOp = args.require_str("operation").map_err(invalid)?.parse()?;
                let a = args.require_number("a").map_err(invalid)?;
                let b = args.require_number("b").map_err(invalid)?;
                let result = calculator::calculate(op, a, b)?;
                Ok(ToolCallResult::text(format!("{a} {op} {b} = {result}")))
            }
            ToolHandler::Evaluate => {
                let expression = args.require_str("expression").map_err(invalid)?;
                let result = calculator::evaluate(expression)?;
                Ok(ToolCallResult::text(format!("{expression} = {result}")))
            }
        }
    }
}

fn render_task_list(store: &TaskStore) -> String {
    use std::fmt::Write as _;

    if store.is_empty() {
        return "No tasks found.".to_string();
    }

    let mut out = String::from("Current Tasks:\n");
    for task in store.tasks() {
        let status = if task.completed { "✅" } else { "⏳" };
        let _ = writeln!(
            out,
            "{status} [{}] {} (created: {})",
            task.id,
            task.title,
            task.created.format("%Y-%m-%d")
        );
    }
    out
}

/// Tools keyed by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] if the name is taken.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), RegistryError> {
        if self.tools.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateTool {
                name: descriptor.name,
            });
        }
        self.tools.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// All tools, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// The built-in tools, in the order they are advertised.
#[must_use]
pub fn builtin_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "add_task",
            "Add a new task to the task list",
            InputSchema::new()
                .required("title", ParamType::String, "The task title")
                .optional("description", ParamType::String, "Optional task description"),
            ToolHandler::AddTask,
        ),
        ToolDescriptor::new(
            "list_tasks",
            "List all tasks with their status",
            InputSchema::new().deny_additional(),
            ToolHandler::ListTasks,
        ),
        ToolDescriptor::new(
            "complete_task",
            "Mark a task as completed",
            InputSchema::new().required(
                "task_id",
                ParamType::Integer,
                "The ID of the task to complete",
            ),
            ToolHandler::CompleteTask,
        ),
        ToolDescriptor::new(
            "get_weather",
            "Get current weather information (simulated)",
            InputSchema::new().required("city", ParamType::String, "The city name"),
            ToolHandler::GetWeather,
        ),
        ToolDescriptor::new(
            "calculate",
            "Apply add, subtract, multiply or divide to two numbers",
            InputSchema::new()
                .required_enum(
                    "operation",
                    &ArithmeticOp::NAMES,
                    "The arithmetic operation to apply",
                )
                .required("a", ParamType::Number, "Left operand")
                .required("b", ParamType::Number, "Right operand"),
            ToolHandler::Calculate,
        ),
        ToolDescriptor::new(
            "evaluate",
            "Evaluate a basic arithmetic expression (+ - * / // ** and parentheses)",
            InputSchema::new().required(
                "expression",
                ParamType::String,
                "Mathematical expression to evaluate",
            ),
            ToolHandler::Evaluate,
        ),
    ]
}
