//! Error types for the nsync CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (6=sync, 7=config, 8=io, 10=partial run, ...)
//! - Context-aware recovery hints
//! - Structured JSON output under `--json`

use thiserror::Error;

use crate::config::TOKEN_ENV;
use crate::notion::NotionError;
use crate::sync::SyncError;

/// Result type alias for nsync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Sync (exit 6)
    CorruptOffsetStore,
    SyncError,

    // Config (exit 7)
    ConfigError,
    MissingToken,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Remote API (exit 9)
    NotionError,

    // Run finished with per-record or per-collection failures (exit 10)
    PartialFailure,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::CorruptOffsetStore => "CORRUPT_OFFSET_STORE",
            Self::SyncError => "SYNC_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::MissingToken => "MISSING_TOKEN",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::NotionError => "NOTION_ERROR",
            Self::PartialFailure => "PARTIAL_FAILURE",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::CorruptOffsetStore | Self::SyncError => 6,
            Self::ConfigError | Self::MissingToken => 7,
            Self::IoError | Self::JsonError => 8,
            Self::NotionError => 9,
            Self::PartialFailure => 10,
        }
    }

    /// Whether rerunning the same command may succeed.
    ///
    /// True for remote failures and partial runs: unchanged records are
    /// skipped, so a rerun only retries what failed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NotionError | Self::PartialFailure)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in nsync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Notion error: {0}")]
    Notion(#[from] NotionError),

    #[error("No Notion token: set {TOKEN_ENV} or pass --token")]
    MissingToken,

    #[error("Sync finished with {failed} failed record(s) and {unavailable} unavailable database(s)")]
    RunFailures { failed: usize, unavailable: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Sync(SyncError::CorruptOffsetStore { .. }) => ErrorCode::CorruptOffsetStore,
            Self::Sync(SyncError::Io(_)) | Self::Io(_) => ErrorCode::IoError,
            Self::Sync(SyncError::Json(_)) | Self::Json(_) => ErrorCode::JsonError,
            Self::Sync(_) => ErrorCode::SyncError,
            Self::Notion(_) => ErrorCode::NotionError,
            Self::MissingToken => ErrorCode::MissingToken,
            Self::RunFailures { .. } => ErrorCode::PartialFailure,
            Self::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::MissingToken => Some(format!(
                "Create an integration at https://www.notion.so/my-integrations, share the \
                 databases with it, then export {TOKEN_ENV} (a .env file in the working \
                 directory also works)."
            )),

            Self::Sync(SyncError::CorruptOffsetStore { path, .. }) => Some(format!(
                "The offset file {path} is not a JSON object of id -> timestamp. \
                 Fix it by hand, or delete it to resync every record."
            )),

            Self::RunFailures { .. } => Some(
                "Successful records were saved. Rerun `nsync sync` to retry the failures; \
                 use -v for per-record details."
                    .to_string(),
            ),

            Self::Notion(NotionError::Api { status: 401, .. }) => {
                Some(format!("The API rejected the token. Check {TOKEN_ENV}."))
            }
            Self::Notion(NotionError::Api { status: 404, .. }) => Some(
                "Not found. Make sure the database is shared with your integration.".to_string(),
            ),

            Self::Config(_) => Some(
                "The config file is JSON, e.g. {\"databases_id\": [\"<database id>\"]}".to_string(),
            ),

            Self::Sync(_) | Self::Notion(_) | Self::Io(_) | Self::Json(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
