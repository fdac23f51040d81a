//! Field-level rules shared by request types.

use validator::ValidationError;

/// Rejects empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank_rejects_whitespace_only() {
        assert!(not_blank("Casa en la playa").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank("   \t ").is_err());
    }
}
