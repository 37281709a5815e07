use std::fmt;

use thiserror::Error;

use crate::models::UserStatus;

/// A single failed form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field errors collected from one form submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message for a field, if it failed
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Turn the collected errors into a result
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AdminError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Coarse error categories, used to decide how an error is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rendered inline next to the form, nothing was sent
    Validation,
    /// Blocking message, the action was aborted
    Authentication,
    /// Blocking message with the server's (or a generic) explanation
    Server,
}

#[derive(Error, Debug)]
pub enum AdminError {
    // Validation errors
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    // Authentication errors
    #[error("No access token in session, please log in again")]
    MissingToken,

    #[error("Admin ID is missing from the session, please log in again")]
    MissingAdminId,

    #[error("Session expired")]
    SessionExpired,

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    // Moderation errors
    #[error("User {user_id} has no moderation log to reverse")]
    MissingModerationLog { user_id: String },

    #[error("Cannot {action} user {user_id} while status is {from}")]
    InvalidTransition {
        user_id: String,
        from: UserStatus,
        action: &'static str,
    },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    // Backend errors
    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Unexpected response from {endpoint}: {source}")]
    Schema {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Firebase error: {message}")]
    Firebase { message: String },

    // Configuration errors
    #[error("Invalid config: {message}")]
    Config { message: String },

    // Generic errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AdminError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        AdminError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AdminError::Validation(_) => ErrorCategory::Validation,
            AdminError::MissingToken
            | AdminError::MissingAdminId
            | AdminError::SessionExpired
            | AdminError::AccessDenied { .. } => ErrorCategory::Authentication,
            _ => ErrorCategory::Server,
        }
    }

    /// Whether the backend answered 404
    pub fn is_not_found_response(&self) -> bool {
        matches!(self, AdminError::Api { status: 404, .. })
    }

    /// Validation details, if this is a validation error
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            AdminError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        AdminError::Network {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        AdminError::Internal {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
