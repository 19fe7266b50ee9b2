//! Error types for project migration.

use thiserror::Error;

/// Boxed error used as the cause of step and descriptor failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while planning, running or relocating a project migration.
#[derive(Error, Debug)]
pub enum MigrationError {
    // Source state errors
    #[error("No project descriptor found at '{0}'. The project cannot be migrated.")]
    NoDescriptor(String),

    #[error("Invalid project descriptor '{0}': no Bonita version found.")]
    InvalidDescriptor(String),

    #[error("Failed to read project descriptor '{path}'.")]
    CantReadDescriptor {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    // Step errors
    #[error("{message}")]
    Prerequisite {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("{message}")]
    StepFailed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Project migration has been cancelled.")]
    Cancelled,

    #[error("Invalid step transition: {0}")]
    Transition(#[from] crate::wizard::InvalidTransition),

    // Relocation errors
    #[error("Failed to backup current project state.")]
    Backup(#[source] std::io::Error),

    #[error("Failed to copy project to workspace.")]
    CopyToWorkspace(#[source] std::io::Error),

    // Collaborator errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid XML in '{path}': {message}")]
    Xml { path: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Command not defined: {0}")]
    CommandNotFound(String),

    #[error("Missing command parameter: {0}")]
    MissingParameter(String),
}

impl MigrationError {
    /// A step execution failure without an underlying cause.
    pub fn step_failed(message: impl Into<String>) -> Self {
        Self::StepFailed {
            message: message.into(),
            source: None,
        }
    }

    /// A step execution failure wrapping its root cause.
    pub fn step_failed_with(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::StepFailed {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// A step prerequisite (e.g. a required file) is missing or corrupt.
    pub fn prerequisite(message: impl Into<String>) -> Self {
        Self::Prerequisite {
            message: message.into(),
            source: None,
        }
    }

    pub fn prerequisite_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Prerequisite {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns true when the error stems from a user cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Message shown to the user for this error.
    ///
    /// Prefers the error's own message, then the message of its cause, and
    /// falls back to the error kind when both are blank.
    pub fn diagnostic(&self) -> String {
        let own = self.to_string();
        if !own.trim().is_empty() {
            return own;
        }
        if let Some(cause) = std::error::Error::source(self) {
            let message = cause.to_string();
            if !message.trim().is_empty() {
                return message;
            }
        }
        self.kind().to_string()
    }

    /// Stable name of the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoDescriptor(_) => "NoDescriptor",
            Self::InvalidDescriptor(_) => "InvalidDescriptor",
            Self::CantReadDescriptor { .. } => "CantReadDescriptor",
            Self::InvalidVersion { .. } => "InvalidVersion",
            Self::Prerequisite { .. } => "Prerequisite",
            Self::StepFailed { .. } => "StepFailed",
            Self::Cancelled => "Cancelled",
            Self::Transition(_) => "Transition",
            Self::Backup(_) => "Backup",
            Self::CopyToWorkspace(_) => "CopyToWorkspace",
            Self::Io(_) => "Io",
            Self::Xml { .. } => "Xml",
            Self::Json(_) => "Json",
            Self::Http(_) => "Http",
            Self::Config(_) => "Config",
            Self::CommandNotFound(_) => "CommandNotFound",
            Self::MissingParameter(_) => "MissingParameter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_prefers_own_message() {
        let err = MigrationError::step_failed_with(
            "Failed to delete project settings.",
            std::io::Error::other("permission denied"),
        );
        assert_eq!(err.diagnostic(), "Failed to delete project settings.");
    }

    #[test]
    fn test_diagnostic_falls_back_to_cause() {
        let err = MigrationError::step_failed_with("", std::io::Error::other("disk full"));
        assert_eq!(err.diagnostic(), "disk full");
    }

    #[test]
    fn test_diagnostic_falls_back_to_kind() {
        let err = MigrationError::step_failed("  ");
        assert_eq!(err.diagnostic(), "StepFailed");
    }

    #[test]
    fn test_cancelled_is_distinguished() {
        assert!(MigrationError::Cancelled.is_cancelled());
        assert!(!MigrationError::step_failed("boom").is_cancelled());
    }
}
