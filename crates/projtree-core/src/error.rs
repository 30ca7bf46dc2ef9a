//! Unified application error types for ProjTree.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The tree-specific kinds
//! (`InvalidName`, `DuplicateName`, ...) are what callers match on to tell
//! a rejected mutation apart from an infrastructure failure.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested project or entity was not found.
    NotFound,
    /// A name or path is illegal (bad characters, too long, blocked, or a
    /// folder moved into its own subtree).
    InvalidName,
    /// A sibling with the same name already exists.
    DuplicateName,
    /// The project already holds the maximum number of entities.
    EntityLimitExceeded,
    /// The project has no history id configured.
    ProjectHistoryDisabled,
    /// A doc cannot be converted because it carries tracked-change ranges.
    DocHasRanges,
    /// Input validation failed for a reason other than naming.
    Validation,
    /// A precondition on the stored document no longer holds, or a lock
    /// could not be acquired.
    Conflict,
    /// An internal invariant was violated.
    Internal,
    /// A database error occurred.
    Database,
    /// A storage I/O error occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A collaborating service failed.
    ExternalService,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidName => write!(f, "INVALID_NAME"),
            Self::DuplicateName => write!(f, "DUPLICATE_NAME"),
            Self::EntityLimitExceeded => write!(f, "ENTITY_LIMIT_EXCEEDED"),
            Self::ProjectHistoryDisabled => write!(f, "PROJECT_HISTORY_DISABLED"),
            Self::DocHasRanges => write!(f, "DOC_HAS_RANGES"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
        }
    }
}

/// The unified application error used throughout ProjTree.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid-name error.
    pub fn invalid_name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidName, message)
    }

    /// Create a duplicate-name error.
    pub fn duplicate_name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateName, message)
    }

    /// Create an entity-limit error.
    pub fn entity_limit_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EntityLimitExceeded, message)
    }

    /// Create a history-disabled error.
    pub fn project_history_disabled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProjectHistoryDisabled, message)
    }

    /// Create a doc-has-ranges error.
    pub fn doc_has_ranges(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DocHasRanges, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external-service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Whether this error has the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = AppError::duplicate_name("file already exists");
        assert_eq!(err.to_string(), "DUPLICATE_NAME: file already exists");
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("disk gone");
        let err = AppError::from(io);
        assert!(err.source.is_some());
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Storage);
        assert!(cloned.source.is_none());
    }

    #[test]
    fn test_is_kind() {
        let err = AppError::invalid_name("blocked element name");
        assert!(err.is(ErrorKind::InvalidName));
        assert!(!err.is(ErrorKind::DuplicateName));
    }
}
