//! Field rules that the derive attributes in this crate point at.
//!
//! Password complexity is evaluated as a whole so that a single response can
//! list every requirement the candidate misses, not just the first one.

use std::borrow::Cow;
use std::collections::BTreeMap;

use validator::{ValidationError, ValidationErrors};

use crate::{Gender, Role, Sender};

/// Punctuation accepted as the "special character" of a password.
pub const PASSWORD_SYMBOLS: &str = "*!.@$%^&(){}[]:;<>,?/~_+-=";

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 100;

/// Returns every complexity requirement `password` fails, in a stable order.
pub fn missing_password_requirements(password: &str) -> Vec<String> {
    let mut missing = Vec::new();
    let len = password.chars().count();

    if len < PASSWORD_MIN_LEN {
        missing.push(format!(
            "must be at least {} characters long",
            PASSWORD_MIN_LEN
        ));
    }
    if len > PASSWORD_MAX_LEN {
        missing.push(format!(
            "must be at most {} characters long",
            PASSWORD_MAX_LEN
        ));
    }
    if !password.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        missing.push("must contain only printable ASCII characters".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        missing.push("must contain at least one digit".to_string());
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        missing.push("must contain at least one special character".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        missing.push("must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        missing.push("must contain at least one lowercase letter".to_string());
    }

    missing
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let missing = missing_password_requirements(password);
    if missing.is_empty() {
        return Ok(());
    }

    let mut error = ValidationError::new("password_requirements");
    error.message = Some(Cow::Owned(missing.join(", ")));
    Err(error)
}

pub fn validate_gender(gender: &str) -> Result<(), ValidationError> {
    gender
        .parse::<Gender>()
        .map(|_| ())
        .map_err(|_| with_message("gender", "must be one of male, female, other"))
}

pub fn validate_role(role: &str) -> Result<(), ValidationError> {
    role.parse::<Role>()
        .map(|_| ())
        .map_err(|_| with_message("role", "must be one of user, admin"))
}

pub fn validate_sender(sender: &str) -> Result<(), ValidationError> {
    sender
        .parse::<Sender>()
        .map(|_| ())
        .map_err(|_| with_message("sender", "must be one of USER, GPT"))
}

fn with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Flattens validator output into `field: reason; field: reason`, ordered by
/// field name so responses are deterministic.
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let fields: BTreeMap<_, _> = errors.field_errors().into_iter().collect();

    fields
        .into_iter()
        .map(|(field, errs)| {
            let reasons: Vec<String> = errs.iter().map(describe_error).collect();
            format!("{}: {}", field, reasons.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_error(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    match error.code.as_ref() {
        "length" => {
            let min = error.params.get("min").and_then(|v| v.as_u64());
            let max = error.params.get("max").and_then(|v| v.as_u64());
            match (min, max) {
                (Some(min), Some(max)) => {
                    format!("must be between {} and {} characters long", min, max)
                }
                (Some(min), None) => format!("must be at least {} characters long", min),
                (None, Some(max)) => format!("must be at most {} characters long", max),
                (None, None) => "has an invalid length".to_string(),
            }
        }
        "email" => "must be a valid email address".to_string(),
        code => format!("is invalid ({})", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password_has_no_missing_requirements() {
        assert!(missing_password_requirements("Password1.").is_empty());
        assert!(validate_password("Zz9~abcdef").is_ok());
    }

    #[test]
    fn test_short_password_reports_length_only() {
        let missing = missing_password_requirements("Short1.");
        assert_eq!(missing, vec!["must be at least 8 characters long".to_string()]);
    }

    #[test]
    fn test_password_without_symbol() {
        let missing = missing_password_requirements("Password123");
        assert_eq!(
            missing,
            vec!["must contain at least one special character".to_string()]
        );
    }

    #[test]
    fn test_password_without_digit() {
        let missing = missing_password_requirements("Password.");
        assert_eq!(missing, vec!["must contain at least one digit".to_string()]);
    }

    #[test]
    fn test_all_missing_requirements_are_listed() {
        let err = validate_password("abc").unwrap_err();
        let message = err.message.unwrap();
        assert!(message.contains("at least 8 characters"));
        assert!(message.contains("at least one digit"));
        assert!(message.contains("at least one special character"));
        assert!(message.contains("at least one uppercase letter"));
        assert!(!message.contains("lowercase"));
    }

    #[test]
    fn test_non_ascii_password_rejected() {
        let missing = missing_password_requirements("Pässword1.");
        assert_eq!(
            missing,
            vec!["must contain only printable ASCII characters".to_string()]
        );
    }

    #[test]
    fn test_enumerated_fields() {
        assert!(validate_gender("other").is_ok());
        assert!(validate_gender("Other").is_err());
        assert!(validate_role("admin").is_ok());
        assert!(validate_role("root").is_err());
        assert!(validate_sender("GPT").is_ok());
        assert!(validate_sender("gpt").is_err());
    }
}
