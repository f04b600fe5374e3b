//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted table or user name, in characters.
pub const MAX_NAME_LENGTH: usize = 64;

/// Validates a table or user name: non-blank, at most [`MAX_NAME_LENGTH`] characters, no
/// control characters.
///
/// # Examples
///
/// ```ignore
/// validate_display_name("Friday night") // Ok
/// validate_display_name("   ")          // Err - blank
/// validate_display_name("a\tb")         // Err - control character
/// ```
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }

    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("name_length");
        err.message = Some(
            format!("Name must be at most {MAX_NAME_LENGTH} characters (got {length})").into(),
        );
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("name_format");
        err.message = Some("Name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_name_valid() {
        assert!(validate_display_name("T").is_ok());
        assert!(validate_display_name("Friday night").is_ok());
        assert!(validate_display_name("Hospoda U Lípy").is_ok());
        assert!(validate_display_name(&"x".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_display_name_invalid() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
        assert!(validate_display_name("a\tb").is_err());
        assert!(validate_display_name("a\nb").is_err());
    }
}
