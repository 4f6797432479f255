//! # Task Catalog
//!
//! Loads task schema documents from a folder and resolves task names
//! reported by the model back to definitions.

use super::task::{TaskDefinition, TaskDocument};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Errors while loading the catalog. All are fatal.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("task folder not found: {0}")]
    MissingFolder(PathBuf),

    #[error("failed to read task document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed task document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to list task folder: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Outcome of resolving a name against the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLookup<'a> {
    /// Name equals a task name (case-insensitive)
    Exact(&'a TaskDefinition),
    /// Exactly one task name is contained in the text
    Contained(&'a TaskDefinition),
    /// Several task names are contained in the text
    Ambiguous(&'a TaskDefinition, &'a TaskDefinition),
    NotFound,
}

impl<'a> TaskLookup<'a> {
    pub fn task(self) -> Option<&'a TaskDefinition> {
        match self {
            TaskLookup::Exact(t) | TaskLookup::Contained(t) => Some(t),
            TaskLookup::Ambiguous(..) | TaskLookup::NotFound => None,
        }
    }
}

/// All task definitions, in load order
#[derive(Debug, Clone, Default)]
pub struct TaskCatalog {
    tasks: Vec<TaskDefinition>,
}

impl TaskCatalog {
    /// Load every `*.json` document directly inside `folder`, in file-name order
    pub fn load(folder: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            return Err(CatalogError::MissingFolder(folder.to_path_buf()));
        }

        let mut tasks = Vec::new();
        for entry in WalkDir::new(folder)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }

            let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let doc: TaskDocument =
                serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;

            tasks.push(TaskDefinition::from_document(doc, Some(path.to_path_buf())));
        }

        if tasks.is_empty() {
            warn!(folder = %folder.display(), "No task documents found");
        } else {
            info!(count = tasks.len(), folder = %folder.display(), "Loaded task catalog");
        }

        Ok(Self { tasks })
    }

    /// Build a catalog from documents already in memory
    pub fn from_documents(docs: impl IntoIterator<Item = TaskDocument>) -> Self {
        Self {
            tasks: docs
                .into_iter()
                .map(|doc| TaskDefinition::from_document(doc, None))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.tasks.iter()
    }

    /// Exact, case-insensitive name lookup
    pub fn get(&self, name: &str) -> Option<&TaskDefinition> {
        let wanted = name.trim().to_lowercase();
        self.tasks
            .iter()
            .find(|t| t.task_name.trim().to_lowercase() == wanted)
    }

    /// Resolve free text (usually the model's `task` field) to a task.
    ///
    /// Exact match first, then containment of a task name in the text.
    /// Containment with more than one candidate is ambiguous.
    pub fn resolve(&self, text: &str) -> TaskLookup<'_> {
        if let Some(task) = self.get(text) {
            return TaskLookup::Exact(task);
        }

        let haystack = text.to_lowercase();
        let mut contained = self
            .tasks
            .iter()
            .filter(|t| haystack.contains(&t.task_name.trim().to_lowercase()));

        match (contained.next(), contained.next()) {
            (Some(task), None) => TaskLookup::Contained(task),
            (Some(first), Some(second)) => TaskLookup::Ambiguous(first, second),
            _ => TaskLookup::NotFound,
        }
    }

    /// Resolve a name, logging ambiguity
    pub fn find_by_name(&self, text: &str) -> Option<&TaskDefinition> {
        match self.resolve(text) {
            TaskLookup::Ambiguous(first, second) => {
                warn!(
                    name = %text,
                    first = %first.task_name,
                    second = %second.task_name,
                    "Task name matches more than one task"
                );
                None
            }
            lookup => lookup.task(),
        }
    }
}
