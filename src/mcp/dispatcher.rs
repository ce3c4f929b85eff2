//! Routing facade between the protocol layer and the registries.
//!
//! A [`Dispatcher`] owns the three registries and the task store. It can
//! only be obtained from a [`DispatcherBuilder`], so every registry is
//! complete before the first request is routed; afterwards only task data
//! changes.
//!
//! The typed methods (`call_tool`, `read_resource`, ...) return domain
//! values. [`Dispatcher::dispatch`] wraps them for the server: it turns
//! handler failures into `isError` tool results, serialises successes and
//! logs everything else before handing the error back for JSON-RPC mapping.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{DispatchError, RegistryError};
use crate::mcp::protocol::DEFAULT_SERVER_NAME;
use crate::prompts::{builtin_prompts, GetPromptResult, Prompt, PromptDescriptor, PromptRegistry};
use crate::resources::{
    builtin_resources, ReadResourceResult, Resource, ResourceDescriptor, ResourceRegistry,
};
use crate::tasks::TaskStore;
use crate::tools::{builtin_tools, ToolCallResult, ToolDefinition, ToolDescriptor, ToolRegistry};

/// A request the dispatcher knows how to route.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// List registered tools.
    ListTools,
    /// Invoke a tool.
    CallTool {
        /// Tool name.
        name: String,
        /// Raw arguments; `null` counts as `{}`.
        arguments: Value,
    },
    /// List concrete resources.
    ListResources,
    /// Read one resource.
    ReadResource {
        /// Resource URI.
        uri: String,
    },
    /// List registered prompts.
    ListPrompts,
    /// Render a prompt.
    GetPrompt {
        /// Prompt name.
        name: String,
        /// Raw arguments; `null` counts as `{}`.
        arguments: Value,
    },
}

/// Routes operations to tools, resources and prompts.
#[derive(Debug)]
pub struct Dispatcher {
    server_name: String,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    prompts: PromptRegistry,
    store: TaskStore,
}

impl Dispatcher {
    /// Starts building a dispatcher.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Name reported in `serverInfo` and `system://info`.
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Read access to the task store.
    #[must_use]
    pub const fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Tool definitions in registration order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(ToolDescriptor::definition).collect()
    }

    /// Validates `arguments` and runs the named tool.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownTool`], [`DispatchError::InvalidArguments`],
    /// or the handler's own error.
    pub fn call_tool(
        &mut self,
        name: &str,
        arguments: &Value,
    ) -> Result<ToolCallResult, DispatchError> {
        let descriptor = self
            .tools
            .get(name)
            .ok_or_else(|| DispatchError::UnknownTool {
                name: name.to_string(),
            })?;

        let args = descriptor
            .schema
            .validate(arguments)
            .map_err(|source| DispatchError::InvalidArguments {
                target: name.to_string(),
                source,
            })?;

        tracing::debug!(tool = name, "Calling tool");
        descriptor.invoke(&mut self.store, &args)
    }

    /// Concrete resources, with the notes pattern expanded.
    #[must_use]
    pub fn list_resources(&self) -> Vec<Resource> {
        self.resources.list()
    }

    /// Reads the resource at `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownResource`] or
    /// [`DispatchError::ResourceUnavailable`].
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, DispatchError> {
        tracing::debug!(uri, "Reading resource");
        self.resources
            .read(uri, &self.store, &self.server_name)
            .await
    }

    /// Prompt listings in registration order.
    #[must_use]
    pub fn list_prompts(&self) -> Vec<Prompt> {
        self.prompts.iter().map(PromptDescriptor::listing).collect()
    }

    /// Validates `arguments` and renders the named prompt.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownPrompt`] or
    /// [`DispatchError::InvalidArguments`].
    pub fn get_prompt(
        &self,
        name: &str,
        arguments: &Value,
    ) -> Result<GetPromptResult, DispatchError> {
        let descriptor = self
            .prompts
            .get(name)
            .ok_or_else(|| DispatchError::UnknownPrompt {
                name: name.to_string(),
            })?;

        let args = descriptor.schema().validate(arguments).map_err(|source| {
            DispatchError::InvalidArguments {
                target: name.to_string(),
                source,
            }
        })?;

        descriptor.render(&self.store, &args)
    }

    /// Routes `operation` and serialises the outcome.
    ///
    /// Handler failures come back as `Ok` tool results with `isError` set.
    ///
    /// # Errors
    ///
    /// Returns every other [`DispatchError`] for the caller to map onto a
    /// protocol error.
    pub async fn dispatch(&mut self, operation: Operation) -> Result<Value, DispatchError> {
        let outcome = match operation {
            Operation::ListTools => Ok(json!({ "tools": self.list_tools() })),
            Operation::CallTool { name, arguments } => match self.call_tool(&name, &arguments) {
                Ok(result) => to_value(&result),
                Err(e) if e.is_handler_error() => {
                    tracing::info!(tool = %name, error = %e, "Tool reported an error");
                    to_value(&ToolCallResult::error(e.to_string()))
                }
                Err(e) => Err(e),
            },
            Operation::ListResources => Ok(json!({ "resources": self.list_resources() })),
            Operation::ReadResource { uri } => self
                .read_resource(&uri)
                .await
                .and_then(|result| to_value(&result)),
            Operation::ListPrompts => Ok(json!({ "prompts": self.list_prompts() })),
            Operation::GetPrompt { name, arguments } => self
                .get_prompt(&name, &arguments)
                .and_then(|result| to_value(&result)),
        };

        if let Err(e) = &outcome {
            match e {
                DispatchError::Internal { .. } => tracing::error!(error = %e, "Dispatch failed"),
                _ => tracing::warn!(error = %e, "Dispatch rejected"),
            }
        }
        outcome
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, DispatchError> {
    serde_json::to_value(value).map_err(|e| DispatchError::Internal {
        message: format!("failed to serialise result: {e}"),
    })
}

/// Assembles a [`Dispatcher`].
#[derive(Debug, Default)]
pub struct DispatcherBuilder {
    server_name: Option<String>,
    store: Option<TaskStore>,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    prompts: PromptRegistry,
}

impl DispatcherBuilder {
    /// Sets the advertised server name.
    #[must_use]
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Uses `store` instead of an empty one.
    #[must_use]
    pub fn task_store(mut self, store: TaskStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Registers a tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] if the name is taken.
    pub fn register_tool(mut self, descriptor: ToolDescriptor) -> Result<Self, RegistryError> {
        self.tools.register(descriptor)?;
        Ok(self)
    }

    /// Registers a resource or resource pattern.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateResource`] if the URI is taken.
    pub fn register_resource(
        mut self,
        descriptor: ResourceDescriptor,
    ) -> Result<Self, RegistryError> {
        self.resources.register(descriptor)?;
        Ok(self)
    }

    /// Registers a prompt.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicatePrompt`] if the name is taken.
    pub fn register_prompt(mut self, descriptor: PromptDescriptor) -> Result<Self, RegistryError> {
        self.prompts.register(descriptor)?;
        Ok(self)
    }

    /// Registers every built-in tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] if one is already registered.
    pub fn register_builtin_tools(self) -> Result<Self, RegistryError> {
        builtin_tools().into_iter().try_fold(self, Self::register_tool)
    }

    /// Registers every built-in resource, serving notes from `notes_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidNotesDir`] or
    /// [`RegistryError::DuplicateResource`].
    pub fn register_builtin_resources(self, notes_dir: &Path) -> Result<Self, RegistryError> {
        builtin_resources(notes_dir)?
            .into_iter()
            .try_fold(self, Self::register_resource)
    }

    /// Registers every built-in prompt.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicatePrompt`] if one is already registered.
    pub fn register_builtin_prompts(self) -> Result<Self, RegistryError> {
        builtin_prompts()
            .into_iter()
            .try_fold(self, Self::register_prompt)
    }

    /// Freezes the registries.
    #[must_use]
    pub fn build(self) -> Dispatcher {
        let dispatcher = Dispatcher {
            server_name: self
                .server_name
                .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
            tools: self.tools,
            resources: self.resources,
            prompts: self.prompts,
            store: self.store.unwrap_or_default(),
        };

        tracing::debug!(
            tools = dispatcher.tools.len(),
            resources = dispatcher.resources.len(),
            prompts = dispatcher.prompts.len(),
            "Dispatcher built"
        );
        dispatcher
    }
}
