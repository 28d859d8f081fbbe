//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found
    NotFound(String),
    /// Invalid input, keyed by the offending field
    Validation { field: String, message: String },
    /// Row already exists (duplicate favorite, cart entry, subscription)
    Conflict(String),
    /// Row expected to exist for removal does not
    NotPresent(String),
    /// A user acting on themselves where that is not allowed
    SelfReference(String),
    /// Missing or invalid credentials
    Unauthorized(String),
    /// Authenticated but not allowed to touch the resource
    Forbidden,
    /// Database/persistence error
    Database(String),
    /// Generic internal error
    Internal(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        DomainError::NotFound(format!("{} not found", what))
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "{}", msg),
            DomainError::Validation { field, message } => {
                write!(f, "Validation error on '{}': {}", field, message)
            }
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::NotPresent(msg) => write!(f, "{}", msg),
            DomainError::SelfReference(msg) => write!(f, "{}", msg),
            DomainError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            DomainError::Forbidden => write!(f, "You do not have permission to perform this action"),
            DomainError::Database(msg) => write!(f, "Database error: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Database(e.to_string())
    }
}

/// True when the error comes from a UNIQUE constraint.
///
/// SQLite reports primary-key and unique violations with different extended
/// codes, so the message is checked as well as the classified error.
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ) || err.to_string().contains("UNIQUE constraint failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_names_field() {
        let err = DomainError::validation("tags", "Add at least one tag");
        assert_eq!(
            err.to_string(),
            "Validation error on 'tags': Add at least one tag"
        );
    }

    #[test]
    fn test_unique_violation_detected_from_message() {
        let err = sea_orm::DbErr::Custom(
            "UNIQUE constraint failed: subscriptions.user_id, subscriptions.following_id"
                .to_string(),
        );
        assert!(is_unique_violation(&err));
        assert!(!is_unique_violation(&sea_orm::DbErr::RecordNotInserted));
    }
}
