//! Input validation shared by note and vault use-cases.
//!
//! # Responsibility
//! - Describe every user-input rejection in one error type.
//! - Keep length/emptiness rules next to the records they guard.
//!
//! # Invariants
//! - Validation errors are always recoverable and safe to show in UI.
//! - Messages never echo secret values (passwords, answers).

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum accepted length (in chars) for a vault master password.
pub const MIN_MASTER_PASSWORD_CHARS: usize = 6;

/// Caller supplied disallowed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
    /// Password is empty where one is required.
    EmptyPassword,
    /// Password and its confirmation differ.
    PasswordMismatch,
    /// Master password is shorter than the allowed minimum.
    PasswordTooShort { min_chars: usize },
    /// Security question or answer is blank.
    IncompleteSecurityData,
    /// Vault setup was requested for an already configured vault.
    VaultAlreadyConfigured,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title cannot be empty"),
            Self::EmptyPassword => write!(f, "password cannot be empty"),
            Self::PasswordMismatch => write!(f, "passwords do not match"),
            Self::PasswordTooShort { min_chars } => {
                write!(f, "password must be at least {min_chars} characters")
            }
            Self::IncompleteSecurityData => {
                write!(f, "security question and answer must both be provided")
            }
            Self::VaultAlreadyConfigured => write!(f, "vault is already set up"),
        }
    }
}

impl Error for ValidationError {}

/// Trims and validates a record title.
pub fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Rejects empty per-note passwords.
pub fn require_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    Ok(())
}

/// Checks a master password and its confirmation.
///
/// Mismatch is reported before length so the user fixes the typo first.
pub fn validate_master_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_MASTER_PASSWORD_CHARS {
        return Err(ValidationError::PasswordTooShort {
            min_chars: MIN_MASTER_PASSWORD_CHARS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_title, validate_master_password, ValidationError};

    #[test]
    fn title_is_trimmed_and_blank_rejected() {
        assert_eq!(normalize_title("  Passport ").unwrap(), "Passport");
        assert_eq!(normalize_title(" \n ").unwrap_err(), ValidationError::EmptyTitle);
    }

    #[test]
    fn master_password_rules() {
        assert_eq!(
            validate_master_password("secret1", "secret2").unwrap_err(),
            ValidationError::PasswordMismatch
        );
        assert!(matches!(
            validate_master_password("abc", "abc").unwrap_err(),
            ValidationError::PasswordTooShort { min_chars: 6 }
        ));
        validate_master_password("secret1", "secret1").unwrap();
    }

    #[test]
    fn master_password_length_counts_chars_not_bytes() {
        // Five chars, ten bytes.
        assert!(validate_master_password("ééééé", "ééééé").is_err());
        validate_master_password("éééééé", "éééééé").unwrap();
    }
}
