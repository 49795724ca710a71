// Field validation rules, expressed as pure functions returning the
// ordered list of violations. No persistence concerns here; the user store
// runs these before touching storage.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::NewUser;

pub const NAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 40;
pub const POST_CONTENT_MAX_LEN: usize = 140;

/// local@domain with at least one dot-separated domain label after the `@`.
/// Rejects whitespace, bare/leading/trailing/doubled `@`, and dotless
/// domains such as `aa@kjkj`.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Name,
    Email,
    Password,
    PasswordConfirmation,
    Content,
}

impl Field {
    /// Lowercase display name, also the key in rendered field errors.
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Password => "password",
            Field::PasswordConfirmation => "password confirmation",
            Field::Content => "content",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    EmptyField,
    TooLong { max: usize },
    TooShort { min: usize },
    InvalidFormat,
    Mismatch,
}

/// A single failed rule on a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: Field,
    pub kind: ViolationKind,
}

impl Violation {
    fn new(field: Field, kind: ViolationKind) -> Self {
        Self { field, kind }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field.label();
        match self.kind {
            ViolationKind::EmptyField => write!(f, "{} can't be blank", field),
            ViolationKind::TooLong { max } => {
                write!(f, "{} is too long (maximum is {} characters)", field, max)
            }
            ViolationKind::TooShort { min } => {
                write!(f, "{} is too short (minimum is {} characters)", field, min)
            }
            ViolationKind::InvalidFormat => write!(f, "{} is invalid", field),
            ViolationKind::Mismatch => write!(f, "{} doesn't match password", field),
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Validate attributes for a new user. Returns every violation, in field
/// order, so the caller can render all messages at once.
pub fn validate_new_user(attrs: &NewUser) -> Vec<Violation> {
    let mut violations = Vec::new();

    if is_blank(&attrs.name) {
        violations.push(Violation::new(Field::Name, ViolationKind::EmptyField));
    } else if attrs.name.chars().count() > NAME_MAX_LEN {
        violations.push(Violation::new(
            Field::Name,
            ViolationKind::TooLong { max: NAME_MAX_LEN },
        ));
    }

    if is_blank(&attrs.email) {
        violations.push(Violation::new(Field::Email, ViolationKind::EmptyField));
    } else if !EMAIL_PATTERN.is_match(&attrs.email) {
        violations.push(Violation::new(Field::Email, ViolationKind::InvalidFormat));
    }

    violations.extend(validate_password(
        &attrs.password,
        &attrs.password_confirmation,
    ));

    violations
}

fn validate_password(password: &str, confirmation: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    if is_blank(password) {
        violations.push(Violation::new(Field::Password, ViolationKind::EmptyField));
        return violations;
    }
    if is_blank(confirmation) {
        violations.push(Violation::new(
            Field::PasswordConfirmation,
            ViolationKind::EmptyField,
        ));
        return violations;
    }
    if password != confirmation {
        violations.push(Violation::new(
            Field::PasswordConfirmation,
            ViolationKind::Mismatch,
        ));
        return violations;
    }

    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        violations.push(Violation::new(
            Field::Password,
            ViolationKind::TooShort {
                min: PASSWORD_MIN_LEN,
            },
        ));
    } else if len > PASSWORD_MAX_LEN {
        violations.push(Violation::new(
            Field::Password,
            ViolationKind::TooLong {
                max: PASSWORD_MAX_LEN,
            },
        ));
    }

    violations
}

/// Validate micropost content: non-empty, bounded length.
pub fn validate_post_content(content: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    if is_blank(content) {
        violations.push(Violation::new(Field::Content, ViolationKind::EmptyField));
    } else if content.chars().count() > POST_CONTENT_MAX_LEN {
        violations.push(Violation::new(
            Field::Content,
            ViolationKind::TooLong {
                max: POST_CONTENT_MAX_LEN,
            },
        ));
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> NewUser {
        NewUser {
            name: "Example User".to_string(),
            email: "user@example.com".to_string(),
            password: "secret".to_string(),
            password_confirmation: "secret".to_string(),
        }
    }

    #[test]
    fn accepts_valid_attributes() {
        assert!(validate_new_user(&attrs()).is_empty());
    }

    #[test]
    fn rejects_blank_name() {
        let mut a = attrs();
        a.name = "".to_string();
        assert_eq!(
            validate_new_user(&a),
            vec![Violation::new(Field::Name, ViolationKind::EmptyField)]
        );
    }

    #[test]
    fn rejects_name_over_fifty_chars() {
        let mut a = attrs();
        a.name = "x".repeat(51);
        assert_eq!(
            validate_new_user(&a),
            vec![Violation::new(
                Field::Name,
                ViolationKind::TooLong { max: NAME_MAX_LEN }
            )]
        );
    }

    #[test]
    fn accepts_fifty_char_name() {
        let mut a = attrs();
        a.name = "x".repeat(50);
        assert!(validate_new_user(&a).is_empty());
    }

    #[test]
    fn accepts_valid_emails() {
        for email in ["a@b.c", "a_ff@nbn.jgfhj", "a_jhj@hgh.kjhk.com"] {
            let mut a = attrs();
            a.email = email.to_string();
            assert!(validate_new_user(&a).is_empty(), "expected {} valid", email);
        }
    }

    #[test]
    fn rejects_invalid_emails() {
        for email in ["a.com", "@kjk", "@.jhj", "abc.com@", "aa@kjkj"] {
            let mut a = attrs();
            a.email = email.to_string();
            assert_eq!(
                validate_new_user(&a),
                vec![Violation::new(Field::Email, ViolationKind::InvalidFormat)],
                "expected {} invalid",
                email
            );
        }
    }

    #[test]
    fn rejects_blank_email() {
        let mut a = attrs();
        a.email = "".to_string();
        assert_eq!(
            validate_new_user(&a),
            vec![Violation::new(Field::Email, ViolationKind::EmptyField)]
        );
    }

    #[test]
    fn rejects_blank_password() {
        let mut a = attrs();
        a.password = "".to_string();
        a.password_confirmation = "".to_string();
        assert_eq!(
            validate_new_user(&a),
            vec![Violation::new(Field::Password, ViolationKind::EmptyField)]
        );
    }

    #[test]
    fn rejects_mismatched_confirmation() {
        let mut a = attrs();
        a.password_confirmation = "abcd".to_string();
        assert_eq!(
            validate_new_user(&a),
            vec![Violation::new(
                Field::PasswordConfirmation,
                ViolationKind::Mismatch
            )]
        );
    }

    #[test]
    fn rejects_short_password() {
        let mut a = attrs();
        a.password = "x".repeat(5);
        a.password_confirmation = a.password.clone();
        assert_eq!(
            validate_new_user(&a),
            vec![Violation::new(
                Field::Password,
                ViolationKind::TooShort {
                    min: PASSWORD_MIN_LEN
                }
            )]
        );
    }

    #[test]
    fn rejects_long_password() {
        let mut a = attrs();
        a.password = "x".repeat(41);
        a.password_confirmation = a.password.clone();
        assert_eq!(
            validate_new_user(&a),
            vec![Violation::new(
                Field::Password,
                ViolationKind::TooLong {
                    max: PASSWORD_MAX_LEN
                }
            )]
        );
    }

    #[test]
    fn collects_multiple_violations_in_field_order() {
        let a = NewUser {
            name: "".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            password_confirmation: "short".to_string(),
        };
        let violations = validate_new_user(&a);
        assert_eq!(
            violations.iter().map(|v| v.field).collect::<Vec<_>>(),
            vec![Field::Name, Field::Email, Field::Password]
        );
    }

    #[test]
    fn post_content_rules() {
        assert!(validate_post_content("Foo Bar").is_empty());
        assert_eq!(
            validate_post_content("  "),
            vec![Violation::new(Field::Content, ViolationKind::EmptyField)]
        );
        assert_eq!(
            validate_post_content(&"x".repeat(141)),
            vec![Violation::new(
                Field::Content,
                ViolationKind::TooLong {
                    max: POST_CONTENT_MAX_LEN
                }
            )]
        );
    }
}
