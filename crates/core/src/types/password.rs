//! Password policy.
//!
//! The checked rule set for new account passwords. Hashing lives in the API
//! crate; this module only decides whether a plaintext candidate is acceptable.

/// A single violated password rule.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least {0} characters")]
    TooShort(usize),
    #[error("password must not exceed {0} characters")]
    TooLong(usize),
    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("password must contain at least one digit")]
    MissingDigit,
    #[error("password must contain at least one symbol")]
    MissingSymbol,
    #[error("password must not contain spaces")]
    ContainsSpace,
}

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 50;

/// Check a candidate password against the full rule set.
///
/// All violated rules are reported, not just the first, so the caller can
/// surface a complete message to the user.
///
/// # Errors
///
/// Returns every [`PasswordError`] the candidate violates.
pub fn validate_password(password: &str) -> Result<(), Vec<PasswordError>> {
    let mut errors = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(PasswordError::TooShort(MIN_PASSWORD_LENGTH));
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        errors.push(PasswordError::TooLong(MAX_PASSWORD_LENGTH));
    }
    if !password.chars().any(char::is_uppercase) {
        errors.push(PasswordError::MissingUppercase);
    }
    if !password.chars().any(char::is_lowercase) {
        errors.push(PasswordError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(PasswordError::MissingDigit);
    }
    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        errors.push(PasswordError::MissingSymbol);
    }
    if password.chars().any(char::is_whitespace) {
        errors.push(PasswordError::ContainsSpace);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert!(validate_password("Str0ng!pass").is_ok());
    }

    #[test]
    fn test_too_short() {
        let errors = validate_password("A1!a").unwrap_err();
        assert!(errors.contains(&PasswordError::TooShort(MIN_PASSWORD_LENGTH)));
    }

    #[test]
    fn test_too_long() {
        let candidate = format!("A1!{}", "a".repeat(60));
        let errors = validate_password(&candidate).unwrap_err();
        assert!(errors.contains(&PasswordError::TooLong(MAX_PASSWORD_LENGTH)));
    }

    #[test]
    fn test_missing_classes() {
        let errors = validate_password("alllowercase").unwrap_err();
        assert!(errors.contains(&PasswordError::MissingUppercase));
        assert!(errors.contains(&PasswordError::MissingDigit));
        assert!(errors.contains(&PasswordError::MissingSymbol));
    }

    #[test]
    fn test_spaces_rejected() {
        let errors = validate_password("Str0ng! pass").unwrap_err();
        assert!(errors.contains(&PasswordError::ContainsSpace));
    }

    #[test]
    fn test_all_violations_reported() {
        // One candidate can break several rules at once
        let errors = validate_password("short").unwrap_err();
        assert!(errors.len() >= 3);
    }
}
