//! Error types for the Rage CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=config, 3=connection, 4=io, 5=data, ...)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Only setup-level failures (configuration, connection, unreadable mirror
//! root) surface as [`Error`]. Collection and document failures are recorded
//! in the sync summary instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::mirror::MirrorError;
use crate::sync::SyncError;

/// Result type alias for Rage operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Config (exit 2)
    ConfigError,
    ConfigNotFound,

    // Connection (exit 3)
    ConnectionError,

    // I/O (exit 4)
    IoError,

    // Data (exit 5)
    DataError,
    JsonError,

    // Validation (exit 6)
    InvalidArgument,

    // Interrupted (exit 130)
    Cancelled,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::ConnectionError => "CONNECTION_ERROR",
            Self::IoError => "IO_ERROR",
            Self::DataError => "DATA_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Cancelled => "CANCELLED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::ConfigError | Self::ConfigNotFound => 2,
            Self::ConnectionError => 3,
            Self::IoError => 4,
            Self::DataError | Self::JsonError => 5,
            Self::InvalidArgument => 6,
            Self::Cancelled => 130,
        }
    }

    /// Whether re-running the same command may succeed without changes.
    ///
    /// True for connection and I/O failures, which are usually transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError | Self::IoError | Self::Cancelled)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in Rage CLI operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration file already exists: {}", path.display())]
    ConfigExists { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Mirror directory not found: {}", path.display())]
    MirrorNotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Self::ConfigExists { .. } | Self::Config(_) => ErrorCode::ConfigError,
            Self::Connection(_) => ErrorCode::ConnectionError,
            Self::MirrorNotFound { .. } | Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Data(_) => ErrorCode::DataError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint for humans.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ConfigNotFound { path } => Some(format!(
                "Create one with `rage init --config {}` or pass --config <path>.",
                path.display()
            )),
            Self::ConfigExists { .. } => {
                Some("Use `rage init --force` to overwrite it.".to_string())
            }
            Self::Config(_) => Some(
                "Check the JSON syntax and field names (method, databaseType, \
                 databaseSpecificSettings, loopStartDelay, outDir)."
                    .to_string(),
            ),
            Self::Connection(_) => Some(
                "Verify the secret connection string and that the database is reachable. \
                 Override it with --secret."
                    .to_string(),
            ),
            Self::MirrorNotFound { .. } => {
                Some("Run `rage pull` first to create the mirror tree.".to_string())
            }
            Self::Cancelled => {
                Some("Completed collections were kept. Re-run to finish the rest.".to_string())
            }
            Self::Io(_)
            | Self::Json(_)
            | Self::Data(_)
            | Self::InvalidArgument(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
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

impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Connection(message) => Self::Connection(message),
        }
    }
}

impl From<MirrorError> for Error {
    fn from(err: MirrorError) -> Self {
        match err {
            MirrorError::Io(e) => Self::Io(e),
            MirrorError::NotFound(path) => Self::MirrorNotFound { path },
            other => Self::Data(other.to_string()),
        }
    }
}
