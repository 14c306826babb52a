//! Resolved configuration files pulled alongside properties.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value as JsonValue};

use crate::error::ConfigHubError;
use crate::value::shape;

/// Repository file path → fully resolved file content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Files {
    files: HashMap<String, String>,
}

impl Files {
    /// Build a table from the `"files"` object of a pull payload.
    /// Content must be a JSON string and is kept verbatim.
    pub fn decode(payload: &Map<String, JsonValue>) -> Result<Self, ConfigHubError> {
        let files = payload
            .iter()
            .map(|(path, content)| match content {
                JsonValue::String(text) => Ok((path.clone(), text.clone())),
                other => Err(ConfigHubError::Decode {
                    key: path.clone(),
                    reason: format!("expected file content as string, found {}", shape(other)),
                }),
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { files })
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write a pulled file to `destination`, creating parent directories.
    pub fn write_to_local(&self, path: &str, destination: &Path) -> Result<(), ConfigHubError> {
        let content = self
            .get(path)
            .ok_or_else(|| ConfigHubError::NotPulled(path.to_string()))?;

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigHubError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(destination, content).map_err(|e| ConfigHubError::IoError {
            path: destination.to_path_buf(),
            source: e,
        })
    }
}
