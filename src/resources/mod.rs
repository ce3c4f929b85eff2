//! Resource registry and the built-in resources.
//!
//! A resource is addressed by URI. Most are registered under a literal URI;
//! the notes directory is registered under a `file://` glob pattern and
//! expands to one entry per markdown file when listed. Reading a URI first
//! looks for a literal match and then tries each pattern.
//!
//! Built-in resources, in listing order:
//!
//! - `tasks://database`: the task store as pretty-printed JSON
//! - `file://<notes_dir>/<name>.md`: one entry per note file
//! - `system://info`: time, server name, platform and working directory

pub mod notes;

use std::path::{Component, Path, PathBuf};

use chrono::Local;
use glob::{MatchOptions, Pattern};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;

use crate::error::{DispatchError, RegistryError};
use crate::tasks::TaskStore;

pub use notes::seed_sample_notes;

/// URI of the task database resource.
pub const TASKS_URI: &str = "tasks://database";

/// URI of the system information resource.
pub const SYSTEM_INFO_URI: &str = "system://info";

const FILE_SCHEME: &str = "file://";

const NOTE_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Where a resource's content comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceSource {
    /// Snapshot of the task store.
    TaskDatabase,
    /// Process and host information.
    SystemInfo,
    /// Markdown files directly inside `dir`.
    Notes {
        /// Directory holding the notes.
        dir: PathBuf,
        /// Compiled `<dir>/*.md` pattern.
        pattern: Pattern,
    },
}

/// A registered resource or resource pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    /// Literal URI, or the URI pattern for pattern sources.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Content source.
    pub source: ResourceSource,
}

impl ResourceDescriptor {
    /// The `tasks://database` resource.
    #[must_use]
    pub fn task_database() -> Self {
        Self {
            uri: TASKS_URI.to_string(),
            name: "Task Database".to_string(),
            description: "Current task list with completion status".to_string(),
            mime_type: "application/json".to_string(),
            source: ResourceSource::TaskDatabase,
        }
    }

    /// The `system://info` resource.
    #[must_use]
    pub fn system_info() -> Self {
        Self {
            uri: SYSTEM_INFO_URI.to_string(),
            name: "System Information".to_string(),
            description: "Current system date and time information".to_string(),
            mime_type: "application/json".to_string(),
            source: ResourceSource::SystemInfo,
        }
    }

    /// The notes pattern `file://<dir>/*.md`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidNotesDir`] if `dir` is empty or not
    /// valid UTF-8.
    pub fn notes(dir: &Path) -> Result<Self, RegistryError> {
        let invalid = || RegistryError::InvalidNotesDir {
            path: dir.to_path_buf(),
        };

        let dir_str = dir.to_str().ok_or_else(invalid)?;
        let trimmed = dir_str.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let glob = format!("{}/*.md", Pattern::escape(trimmed));
        let pattern = Pattern::new(&glob).map_err(|_| invalid())?;

        Ok(Self {
            uri: format!("{FILE_SCHEME}{glob}"),
            name: "Notes".to_string(),
            description: format!("Markdown notes in {trimmed}"),
            mime_type: "text/markdown".to_string(),
            source: ResourceSource::Notes {
                dir: PathBuf::from(trimmed),
                pattern,
            },
        })
    }

    fn is_pattern(&self) -> bool {
        matches!(self.source, ResourceSource::Notes { .. })
    }

    fn listing(&self, uri: String, name: String, description: String) -> Resource {
        Resource {
            uri,
            name,
            description,
            mime_type: self.mime_type.clone(),
        }
    }
}

/// A concrete entry in the resources/list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Concrete URI.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// MIME type of the content.
    pub mime_type: String,
}

/// One content block of a resources/read response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// URI that was read.
    pub uri: String,
    /// MIME type of `text`.
    pub mime_type: String,
    /// The content.
    pub text: String,
}

/// Result of a resources/read request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadResourceResult {
    /// Content blocks; always exactly one for built-in resources.
    pub contents: Vec<ResourceContents>,
}

/// Resources keyed by URI (or URI pattern), in registration order.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: IndexMap<String, ResourceDescriptor>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateResource`] if the URI is taken.
    pub fn register(&mut self, descriptor: ResourceDescriptor) -> Result<(), RegistryError> {
        if self.resources.contains_key(&descriptor.uri) {
            return Err(RegistryError::DuplicateResource {
                uri: descriptor.uri,
            });
        }
        self.resources.insert(descriptor.uri.clone(), descriptor);
        Ok(())
    }

    /// Number of registered resources and patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Lists every concrete resource, expanding patterns against the
    /// filesystem.
    #[must_use]
    pub fn list(&self) -> Vec<Resource> {
        let mut out = Vec::new();
        for descriptor in self.resources.values() {
            match &descriptor.source {
                ResourceSource::Notes { pattern, .. } => {
                    out.extend(expand_notes(descriptor, pattern));
                }
                ResourceSource::TaskDatabase | ResourceSource::SystemInfo => {
                    out.push(descriptor.listing(
                        descriptor.uri.clone(),
                        descriptor.name.clone(),
                        descriptor.description.clone(),
                    ));
                }
            }
        }
        out
    }

    /// Finds the descriptor that serves `uri`.
    ///
    /// For pattern matches the returned path is the file to read.
    #[must_use]
    pub fn resolve(&self, uri: &str) -> Option<(&ResourceDescriptor, Option<PathBuf>)> {
        if let Some(descriptor) = self.resources.get(uri).filter(|d| !d.is_pattern()) {
            return Some((descriptor, None));
        }

        let path = uri.strip_prefix(FILE_SCHEME)?;
        if Path::new(path)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }

        self.resources.values().find_map(|descriptor| match &descriptor.source {
            ResourceSource::Notes { pattern, .. } if pattern.matches_with(path, NOTE_MATCH) => {
                Some((descriptor, Some(PathBuf::from(path))))
            }
            _ => None,
        })
    }

    /// Reads the resource at `uri`.
    ///
    /// Task data is serialised before any file I/O is awaited.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownResource`] if nothing serves `uri`,
    /// or [`DispatchError::ResourceUnavailable`] if a note cannot be read.
    pub async fn read(
        &self,
        uri: &str,
        store: &TaskStore,
        server_name: &str,
    ) -> Result<ReadResourceResult, DispatchError> {
        let (descriptor, path) = self
            .resolve(uri)
            .ok_or_else(|| DispatchError::UnknownResource {
                uri: uri.to_string(),
            })?;

        let text = match (&descriptor.source, path) {
            (ResourceSource::TaskDatabase, _) => to_pretty_json(store.tasks())?,
            (ResourceSource::SystemInfo, _) => to_pretty_json(&system_info(server_name))?,
            (ResourceSource::Notes { .. }, Some(path)) => tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| DispatchError::ResourceUnavailable {
                    uri: uri.to_string(),
                    source,
                })?,
            (ResourceSource::Notes { .. }, None) => {
                return Err(DispatchError::UnknownResource {
                    uri: uri.to_string(),
                })
            }
        };

        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: descriptor.mime_type.clone(),
                text,
            }],
        })
    }
}

fn expand_notes(descriptor: &ResourceDescriptor, pattern: &Pattern) -> Vec<Resource> {
    let paths = match glob::glob_with(pattern.as_str(), NOTE_MATCH) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!(pattern = pattern.as_str(), error = %e, "Invalid notes pattern");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable note");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    files
        .into_iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            descriptor.listing(
                format!("{FILE_SCHEME}{}", path.display()),
                format!("Note: {stem}"),
                format!("Learning note about {}", stem.replace('_', " ")),
            )
        })
        .collect()
}

fn system_info(server_name: &str) -> serde_json::Value {
    let working_directory = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    json!({
        "current_time": Local::now().to_rfc3339(),
        "server_name": server_name,
        "platform": std::env::consts::OS,
        "working_directory": working_directory,
    })
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DispatchError> {
    serde_json::to_string_pretty(value).map_err(|e| DispatchError::Internal {
        message: format!("failed to serialise resource: {e}"),
    })
}

/// The built-in resources for a notes directory, in listing order.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidNotesDir`] if `notes_dir` cannot be used
/// as a pattern.
pub fn builtin_resources(notes_dir: &Path) -> Result<Vec<ResourceDescriptor>, RegistryError> {
    Ok(vec![
        ResourceDescriptor::task_database(),
        ResourceDescriptor::notes(notes_dir)?,
        ResourceDescriptor::system_info(),
    ])
}
