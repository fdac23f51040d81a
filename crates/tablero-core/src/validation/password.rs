//! Password policy for user creation.

use crate::error::AppError;

const MIN_PASSWORD_LENGTH: usize = 10;

/// Enforced before any identity is created: at least 10 characters and at
/// least one uppercase letter.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(AppError::InvalidInput(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_password_rejected() {
        assert!(validate_password("Short1").is_err());
    }

    #[test]
    fn test_missing_uppercase_rejected() {
        assert!(validate_password("alllowercase1").is_err());
    }

    #[test]
    fn test_valid_password_accepted() {
        assert!(validate_password("CorrectHorse9").is_ok());
    }
}
