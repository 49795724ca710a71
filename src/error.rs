use std::fmt;

use crate::core::UserId;
use crate::identity::validation::Violation;

#[derive(Debug)]
pub enum AppError {
    /// One or more field-level rules failed; carries the ordered violations.
    Validation(Vec<Violation>),
    /// Another user already owns this email (case-insensitive).
    DuplicateEmail(String),
    /// A user attempted to follow itself.
    SelfFollow(UserId),
    /// A write referenced a user id that does not exist.
    UnknownUser(UserId),
    Database(anyhow::Error),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(violations) => {
                let msgs: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
                write!(f, "Validation failed: {}", msgs.join(", "))
            }
            AppError::DuplicateEmail(email) => write!(f, "Email already taken: {}", email),
            AppError::SelfFollow(id) => write!(f, "User {} cannot follow itself", id),
            AppError::UnknownUser(id) => write!(f, "Unknown user: {}", id),
            AppError::Database(err) => write!(f, "Database error: {}", err),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Database(err)
    }
}

impl AppError {
    /// True for failures the caller can surface as field messages.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Database(_) | AppError::Internal(_))
    }

    /// Field-keyed messages for an external layer to render, e.g.
    /// `{"email": ["email is invalid"]}`.
    pub fn to_field_errors(&self) -> serde_json::Value {
        match self {
            AppError::Validation(violations) => {
                let mut fields = serde_json::Map::new();
                for violation in violations {
                    if let Some(msgs) = fields
                        .entry(violation.field.label())
                        .or_insert_with(|| serde_json::Value::Array(Vec::new()))
                        .as_array_mut()
                    {
                        msgs.push(serde_json::Value::String(violation.to_string()));
                    }
                }
                serde_json::Value::Object(fields)
            }
            other => serde_json::json!({ "base": [other.to_string()] }),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::validation::{Field, Violation, ViolationKind};

    #[test]
    fn validation_errors_render_per_field() {
        let err = AppError::Validation(vec![
            Violation {
                field: Field::Name,
                kind: ViolationKind::EmptyField,
            },
            Violation {
                field: Field::Email,
                kind: ViolationKind::InvalidFormat,
            },
        ]);

        let rendered = err.to_field_errors();
        assert_eq!(rendered["name"][0], "name can't be blank");
        assert_eq!(rendered["email"][0], "email is invalid");
    }

    #[test]
    fn other_errors_render_under_base() {
        let err = AppError::DuplicateEmail("user@example.com".to_string());
        let rendered = err.to_field_errors();
        assert_eq!(rendered["base"][0], "Email already taken: user@example.com");
    }
}
