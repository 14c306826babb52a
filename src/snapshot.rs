//! The pull response document, which doubles as the local snapshot format.
//!
//! ```json
//! {
//!   "context": "Development;UnitTest",
//!   "account": "ConfigHub",
//!   "repo": "UnitTest",
//!   "properties": { "db.port": { "type": "Integer", "val": 3306 } },
//!   "files": { "server/conf/tomee.xml": "<tomee>...</tomee>" }
//! }
//! ```
//!
//! Pull responses may also carry an `"error"` message. Snapshots never do.
//! `properties` and `files` are kept as raw JSON so that saving a snapshot
//! writes exactly what was decoded.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::ConfigHubError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub properties: Option<Map<String, JsonValue>>,
    #[serde(default)]
    pub files: Option<Map<String, JsonValue>>,
}

impl Snapshot {
    pub fn parse(text: &str) -> Result<Self, ConfigHubError> {
        serde_json::from_str(text).map_err(ConfigHubError::InvalidPayload)
    }

    pub fn read(path: &Path) -> Result<Self, ConfigHubError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigHubError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&text)
    }

    /// Pretty-print to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), ConfigHubError> {
        let text = serde_json::to_string_pretty(self).map_err(ConfigHubError::InvalidPayload)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigHubError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, text).map_err(|e| ConfigHubError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::PULL_RESPONSE;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parse_pull_response() {
        let snap = Snapshot::parse(PULL_RESPONSE).unwrap();
        assert_eq!(snap.context.as_deref(), Some("Development;UnitTest"));
        assert_eq!(snap.account.as_deref(), Some("ConfigHub"));
        assert_eq!(snap.repo.as_deref(), Some("UnitTest"));
        assert!(snap.error.is_none());
        assert!(snap.properties.unwrap().contains_key("db.port"));
        assert!(snap.files.unwrap().contains_key("server/conf/tomee.xml"));
    }

    #[test]
    fn missing_sections_default_to_none() {
        let snap = Snapshot::parse(r#"{"error": "Invalid token"}"#).unwrap();
        assert_eq!(snap.error.as_deref(), Some("Invalid token"));
        assert!(snap.properties.is_none());
        assert!(snap.files.is_none());
    }

    #[test]
    fn invalid_json_is_invalid_payload() {
        assert!(matches!(
            Snapshot::parse("{not json"),
            Err(ConfigHubError::InvalidPayload(_))
        ));
    }

    #[test]
    fn write_is_pretty_and_omits_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("conf.json");
        let snap = Snapshot::parse(PULL_RESPONSE).unwrap();

        snap.write(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"context\": \"Development;UnitTest\""));
        assert!(!text.contains("\"error\""));
        assert_eq!(Snapshot::read(&path).unwrap(), snap);
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = Snapshot::read(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigHubError::IoError { .. })));
    }
}
