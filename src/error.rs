use std::path::PathBuf;
use thiserror::Error;

use crate::value::ValueKind;

#[derive(Debug, Error)]
pub enum ConfigHubError {
    #[error("{0} cannot be blank")]
    BlankParameter(&'static str),

    #[error("Either token, or account and repository name have to be specified")]
    AuthRequired,

    #[error("Token and account/repository are mutually exclusive, pick one")]
    ConflictingAuth,

    #[error(
        "Requested context '{requested}' is not the same as context in the configuration: '{received}'"
    )]
    ContextMismatch { requested: String, received: String },

    #[error("ConfigHub returned an error: {0}")]
    Remote(String),

    #[error("Received invalid configuration: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("Invalid entry for '{key}': {reason}")]
    Decode { key: String, reason: String },

    #[error("Cannot read a {found} value as {requested}")]
    TypeMismatch {
        found: ValueKind,
        requested: ValueKind,
    },

    #[error("Cannot parse '{value}' as {requested}: {reason}")]
    Format {
        value: String,
        requested: ValueKind,
        reason: String,
    },

    #[error("Requested file '{0}' not pulled")]
    NotPulled(String),

    #[error("Unsupported value for key '{key}': {reason}")]
    UnsupportedValueType { key: String, reason: String },

    #[error("Pull rejected with status {status}: {reason}")]
    PullRejected { status: u16, reason: &'static str },

    #[error("Failed to reach ConfigHub: {0}")]
    Transport(String),

    #[error("I/O error on {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Settings error: {0}")]
    Settings(#[from] confique::Error),
}
