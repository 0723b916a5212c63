//! Input rules for users, thoughts and reactions.

use once_cell::sync::Lazy;
use regex::Regex;

use super::StoreError;

pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Upper bound for thought text and reaction bodies.
pub const MAX_TEXT_LENGTH: usize = 280;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r".+@.+\..+").unwrap());

/// Trimmed, non-empty username.
pub fn username(raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("Username is required".to_string()));
    }
    Ok(trimmed.to_string())
}

pub fn email(raw: &str) -> Result<String, StoreError> {
    if raw.is_empty() {
        return Err(StoreError::Validation("Email is required".to_string()));
    }
    if !EMAIL_PATTERN.is_match(raw) {
        return Err(StoreError::Validation(
            "Must match an email address!".to_string(),
        ));
    }
    Ok(raw.to_string())
}

pub fn password(raw: &str) -> Result<(), StoreError> {
    if raw.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(StoreError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Between 1 and [`MAX_TEXT_LENGTH`] characters. `field` names the input in
/// the error message.
pub fn text(field: &str, raw: &str) -> Result<String, StoreError> {
    let length = raw.chars().count();
    if length == 0 {
        return Err(StoreError::Validation(format!("{} is required", field)));
    }
    if length > MAX_TEXT_LENGTH {
        return Err(StoreError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_TEXT_LENGTH
        )));
    }
    Ok(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_username_is_trimmed() {
        assert_eq!(username("  alice ").unwrap(), "alice");
    }

    #[test]
    fn test_blank_username_rejected() {
        assert!(matches!(username("   "), Err(StoreError::Validation(_))));
    }

    #[rstest]
    #[case("a@x.com", true)]
    #[case("first.last@sub.example.org", true)]
    #[case("a@x", false)]
    #[case("@x.com", false)]
    #[case("ax.com", false)]
    #[case("", false)]
    fn test_email_pattern(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(email(input).is_ok(), ok);
    }

    #[test]
    fn test_password_minimum_length() {
        assert!(password("1234").is_err());
        assert!(password("12345").is_ok());
    }

    #[test]
    fn test_text_bounds() {
        assert!(text("Thought", "").is_err());
        assert!(text("Thought", "x").is_ok());
        assert!(text("Thought", &"x".repeat(MAX_TEXT_LENGTH)).is_ok());
        assert!(text("Thought", &"x".repeat(MAX_TEXT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_text_counts_characters_not_bytes() {
        assert!(text("Reaction", &"é".repeat(MAX_TEXT_LENGTH)).is_ok());
    }
}
