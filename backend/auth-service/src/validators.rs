use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// Input validation utilities for auth service

// Hardcoded pattern, compiled once
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^09\d{9}$").expect("hardcoded phone regex is invalid - fix source code")
});

const MIN_PASSWORD_LENGTH: usize = 8;

/// Mobile number: `09` followed by nine digits
pub fn validate_phone_number(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// Validate password strength requirements
/// - Minimum 8 characters
/// - At least one uppercase letter
/// - At least one lowercase letter
/// - At least one digit
pub fn validate_password(password: &str) -> bool {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return false;
    }

    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    has_uppercase && has_lowercase && has_digit
}

/// validator crate compatible custom validator for phone numbers
pub fn validate_phone_number_validator(phone: &str) -> Result<(), ValidationError> {
    if validate_phone_number(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone_number"))
    }
}

/// validator crate compatible custom validator for password strength
pub fn validate_password_validator(password: &str) -> Result<(), ValidationError> {
    if validate_password(password) {
        Ok(())
    } else {
        Err(ValidationError::new("weak_password"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_phone_number() {
        assert!(validate_phone_number("09123456789"));
        assert!(validate_phone_number("09000000000"));
    }

    #[test]
    fn test_invalid_phone_number() {
        assert!(!validate_phone_number("")); // Empty
        assert!(!validate_phone_number("0912345678")); // Too short
        assert!(!validate_phone_number("091234567890")); // Too long
        assert!(!validate_phone_number("08123456789")); // Wrong prefix
        assert!(!validate_phone_number("0912345678a")); // Non-digit
        assert!(!validate_phone_number("+989123456789"));
    }

    #[test]
    fn test_valid_password() {
        assert!(validate_password("SecurePass123"));
        assert!(validate_password("Abcdefg1"));
    }

    #[test]
    fn test_invalid_password() {
        assert!(!validate_password("Abcdef1")); // Too short
        assert!(!validate_password("password123")); // No uppercase
        assert!(!validate_password("PASSWORD123")); // No lowercase
        assert!(!validate_password("SecurePassword")); // No digit
    }

    #[test]
    fn test_validator_adapters() {
        assert!(validate_phone_number_validator("09123456789").is_ok());
        assert_eq!(
            validate_phone_number_validator("123").unwrap_err().code,
            "invalid_phone_number"
        );
        assert_eq!(
            validate_password_validator("weak").unwrap_err().code,
            "weak_password"
        );
    }
}
