//! Prompt registry and the built-in prompt templates.
//!
//! Prompts turn a handful of string arguments into a single user message.
//! Their argument schema is derived from the declared arguments: every
//! argument is a string and the required ones must be present.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{DispatchError, RegistryError};
use crate::mcp::schema::{Arguments, InputSchema, ParamType};
use crate::tasks::{Task, TaskStore};
use crate::tools::ToolContent;

const DEFAULT_FOCUS_AREA: &str = "general MCP concepts";

/// A declared prompt argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Whether the caller must supply it.
    pub required: bool,
}

impl PromptArgument {
    fn new(name: &str, description: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required,
        }
    }
}

/// Which text a prompt renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// Summary request over the current tasks.
    TaskSummary,
    /// Personalised learning plan request.
    LearningPlan,
    /// Concept explanation request.
    ExplainConcept,
}

/// A registered prompt.
#[derive(Debug, Clone)]
pub struct PromptDescriptor {
    /// Unique prompt name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Declared arguments.
    pub arguments: Vec<PromptArgument>,
    /// Template variant.
    pub template: PromptTemplate,
    schema: InputSchema,
}

impl PromptDescriptor {
    /// Creates a descriptor, deriving its schema from `arguments`.
    #[must_use]
    pub fn new(
        name: &str,
        description: &str,
        arguments: Vec<PromptArgument>,
        template: PromptTemplate,
    ) -> Self {
        let schema = arguments.iter().fold(InputSchema::new(), |schema, arg| {
            if arg.required {
                schema.required(&arg.name, ParamType::String, &arg.description)
            } else {
                schema.optional(&arg.name, ParamType::String, &arg.description)
            }
        });

        Self {
            name: name.to_string(),
            description: description.to_string(),
            arguments,
            template,
            schema,
        }
    }

    /// The schema arguments are validated against.
    #[must_use]
    pub const fn schema(&self) -> &InputSchema {
        &self.schema
    }

    /// The listing entry for prompts/list.
    #[must_use]
    pub fn listing(&self) -> Prompt {
        Prompt {
            name: self.name.clone(),
            description: self.description.clone(),
            arguments: self.arguments.clone(),
        }
    }

    /// Renders the prompt from validated arguments. Never mutates `store`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if task data cannot be
    /// serialised.
    pub fn render(
        &self,
        store: &TaskStore,
        args: &Arguments,
    ) -> Result<GetPromptResult, DispatchError> {
        match self.template {
            PromptTemplate::TaskSummary => {
                let include_completed = args
                    .str("include_completed")
                    .map_or(true, |v| v.eq_ignore_ascii_case("true"));
                Ok(GetPromptResult::user(
                    "Task summary prompt with current task data",
                    task_summary(store, include_completed)?,
                ))
            }
            PromptTemplate::LearningPlan => {
                let skill_level = args.str("skill_level").unwrap_or_default();
                let focus_area = args.str("focus_area").unwrap_or(DEFAULT_FOCUS_AREA);
                Ok(GetPromptResult::user(
                    format!("Personalized MCP learning plan for {skill_level} level"),
                    learning_plan(skill_level, focus_area),
                ))
            }
            PromptTemplate::ExplainConcept => {
                let concept = args.str("concept").unwrap_or_default();
                Ok(GetPromptResult::user(
                    format!("Detailed explanation of MCP concept: {concept}"),
                    explain_concept(concept),
                ))
            }
        }
    }
}

fn task_summary(store: &TaskStore, include_completed: bool) -> Result<String, DispatchError> {
    let (intro, shown): (&str, Vec<&Task>) = if include_completed {
        (
            "Please provide a comprehensive summary of all tasks (completed and pending).",
            store.tasks().iter().collect(),
        )
    } else {
        (
            "Please provide a summary of pending tasks only.",
            store.pending().collect(),
        )
    };

    let data = serde_json::to_string_pretty(&shown).map_err(|e| DispatchError::Internal {
        message: format!("failed to serialise tasks: {e}"),
    })?;

    let completed = store.completed_count();
    Ok(format!(
        "{intro}\n\nCurrent tasks data:\n{data}\n\nTotal tasks: {}\nCompleted: {completed}\nPending: {}",
        store.len(),
        store.len() - completed
    ))
}

fn learning_plan(skill_level: &str, focus_area: &str) -> String {
    format!(
        "Create a personalized learning plan for MCP (Model Context Protocol) based on the following:

Skill Level: {skill_level}
Focus Area: {focus_area}

Please provide:
1. Learning objectives appropriate for this skill level
2. Recommended sequence of topics to study
3. Practical exercises to reinforce learning
4. Resources for further reading
5. Expected timeline for mastery

Consider the current MCP server capabilities available in this playground environment."
    )
}

fn explain_concept(concept: &str) -> String {
    format!(
        "Please provide a detailed explanation of the MCP concept: \"{concept}\"

Include:
1. Definition and purpose
2. How it works in the MCP architecture
3. Real-world use cases and examples
4. Best practices for implementation
5. Common pitfalls to avoid
6. How it relates to other MCP concepts

Use examples from this MCP learning server where relevant to illustrate the concepts."
    )
}

/// An entry in the prompts/list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    /// Prompt name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Declared arguments.
    pub arguments: Vec<PromptArgument>,
}

/// Speaker of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,
}

/// One message of a rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    /// Who speaks.
    pub role: Role,
    /// What is said.
    pub content: ToolContent,
}

/// Result of a prompts/get request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetPromptResult {
    /// Description of the rendered prompt.
    pub description: String,
    /// The rendered messages.
    pub messages: Vec<PromptMessage>,
}

impl GetPromptResult {
    /// A result holding a single user message.
    #[must_use]
    pub fn user(description: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            messages: vec![PromptMessage {
                role: Role::User,
                content: ToolContent::Text { text: text.into() },
            }],
        }
    }
}

/// Prompts keyed by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct PromptRegistry {
    prompts: IndexMap<String, PromptDescriptor>,
}

impl PromptRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a prompt.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicatePrompt`] if the name is taken.
    pub fn register(&mut self, descriptor: PromptDescriptor) -> Result<(), RegistryError> {
        if self.prompts.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicatePrompt {
                name: descriptor.name,
            });
        }
        self.prompts.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Looks up a prompt by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PromptDescriptor> {
        self.prompts.get(name)
    }

    /// All prompts, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &PromptDescriptor> {
        self.prompts.values()
    }

    /// Number of registered prompts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Whether no prompts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

/// The built-in prompts, in the order they are advertised.
#[must_use]
pub fn builtin_prompts() -> Vec<PromptDescriptor> {
    vec![
        PromptDescriptor::new(
            "task_summary",
            "Generate a summary of current tasks",
            vec![PromptArgument::new(
                "include_completed",
                "Whether to include completed tasks",
                false,
            )],
            PromptTemplate::TaskSummary,
        ),
        PromptDescriptor::new(
            "learning_plan",
            "Create a personalized MCP learning plan",
            vec![
                PromptArgument::new(
                    "skill_level",
                    "Current skill level (beginner, intermediate, advanced)",
                    true,
                ),
                PromptArgument::new(
                    "focus_area",
                    "Specific area to focus on (tools, resources, prompts, etc.)",
                    false,
                ),
            ],
            PromptTemplate::LearningPlan,
        ),
        PromptDescriptor::new(
            "explain_concept",
            "Explain an MCP concept in detail",
            vec![PromptArgument::new(
                "concept",
                "The MCP concept to explain (tools, resources, prompts, servers, clients)",
                true,
            )],
            PromptTemplate::ExplainConcept,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prompt(name: &str) -> PromptDescriptor {
        builtin_prompts()
            .into_iter()
            .find(|p| p.name == name)
            .unwrap()
    }

    fn render(store: &TaskStore, name: &str, args: serde_json::Value) -> GetPromptResult {
        let descriptor = prompt(name);
        let args = descriptor.schema().validate(&args).unwrap();
        descriptor.render(store, &args).unwrap()
    }

    fn text(result: &GetPromptResult) -> &str {
        match &result.messages[0].content {
            ToolContent::Text { text } => text,
        }
    }

    #[test]
    fn derived_schema_enforces_required() {
        let descriptor = prompt("learning_plan");
        assert!(descriptor.schema().validate(&json!({})).is_err());
        assert!(descriptor
            .schema()
            .validate(&json!({"skill_level": 3}))
            .is_err());
        assert!(descriptor
            .schema()
            .validate(&json!({"skill_level": "beginner"}))
            .is_ok());
    }

    #[test]
    fn task_summary_filters_completed() {
        let store = TaskStore::with_sample_tasks();

        let all = render(&store, "task_summary", json!({}));
        assert!(text(&all).contains("Build a simple tool"));
        assert!(text(&all).contains("Total tasks: 3\nCompleted: 1\nPending: 2"));

        let pending = render(&store, "task_summary", json!({"include_completed": "FALSE"}));
        assert!(text(&pending).starts_with("Please provide a summary of pending tasks only."));
        assert!(!text(&pending).contains("Build a simple tool"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn learning_plan_defaults_focus() {
        let result = render(&TaskStore::new(), "learning_plan", json!({"skill_level": "beginner"}));
        assert_eq!(
            result.description,
            "Personalized MCP learning plan for beginner level"
        );
        assert!(text(&result).contains("Focus Area: general MCP concepts"));
    }

    #[test]
    fn explain_concept_quotes_concept() {
        let result = render(&TaskStore::new(), "explain_concept", json!({"concept": "tools"}));
        assert!(text(&result).contains("the MCP concept: \"tools\""));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"]["type"], "text");
    }

    #[test]
    fn duplicate_prompt_rejected() {
        let mut registry = PromptRegistry::new();
        registry.register(prompt("task_summary")).unwrap();
        assert!(matches!(
            registry.register(prompt("task_summary")),
            Err(RegistryError::DuplicatePrompt { .. })
        ));
        assert_eq!(registry.len(), 1);
    }
}
