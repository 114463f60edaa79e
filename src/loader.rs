use crate::error::LoadError;
use crate::types::Container;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

/// The raw dataset, held immutably once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub containers: Vec<Container>,
}

impl Dataset {
    pub fn new(containers: Vec<Container>) -> Self {
        Self { containers }
    }

    pub fn document_count(&self) -> usize {
        self.containers.iter().map(|c| c.documents.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub containers: usize,
    pub documents: usize,
    pub skipped_documents: usize,
    pub containers_without_documents: usize,
}

pub fn load_dataset(path: impl AsRef<Path>) -> Result<(Dataset, LoadReport), LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = text.len(), "read booking export");
    parse_dataset(&text)
}

pub fn parse_dataset(text: &str) -> Result<(Dataset, LoadReport), LoadError> {
    let value: Value = serde_json::from_str(text)?;
    dataset_from_value(value)
}

/// Validate the top-level shape and build the typed dataset.
///
/// The top level must be an array and every element an object. Inside a
/// container nothing is fatal: a missing or non-array `documents` yields an
/// empty container and non-object documents are skipped.
pub fn dataset_from_value(value: Value) -> Result<(Dataset, LoadReport), LoadError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(LoadError::Structural {
                location: "top level".to_string(),
                expected: "an array of containers",
                found: json_kind(&other),
            })
        }
    };

    let mut report = LoadReport {
        containers: items.len(),
        ..LoadReport::default()
    };
    let mut containers = Vec::with_capacity(items.len());

    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            return Err(LoadError::Structural {
                location: format!("element {}", idx),
                expected: "a container object",
                found: json_kind(&item),
            });
        }
        match item.get("documents") {
            Some(Value::Array(docs)) => {
                let objects = docs.iter().filter(|d| d.is_object()).count();
                report.documents += objects;
                report.skipped_documents += docs.len() - objects;
            }
            _ => report.containers_without_documents += 1,
        }
        let container: Container =
            serde_json::from_value(item).map_err(|_| LoadError::Structural {
                location: format!("element {}", idx),
                expected: "a container object",
                found: "an unreadable object",
            })?;
        containers.push(container);
    }

    if report.skipped_documents > 0 {
        warn!(
            skipped = report.skipped_documents,
            "skipped booking documents that are not JSON objects"
        );
    }
    info!(
        containers = report.containers,
        documents = report.documents,
        "booking dataset loaded"
    );
    Ok((Dataset::new(containers), report))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
