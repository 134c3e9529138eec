//! Input validation for client and account fields
//!
//! Validated newtypes keep their fields private so the only way to obtain one
//! is through `new()`.

use std::fmt;

// ============================================================================
// Validation Errors
// ============================================================================

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },

    #[error("Invalid length for {field}: expected {min}-{max}, got {actual}")]
    InvalidLength {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Invalid format for {field}: '{value}' (expected: {expected})")]
    InvalidFormat {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl ValidationError {
    /// Field the violation refers to, for field-level error payloads.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Blank { field }
            | ValidationError::InvalidLength { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Blank { field });
    }
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::InvalidLength {
            field,
            min,
            max,
            actual: len,
        });
    }
    Ok(())
}

// ============================================================================
// ClientName
// ============================================================================

/// Trimmed, non-blank person or company name (1-100 chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientName(String);

impl ClientName {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        check_length("name", name, 1, 100)?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ClientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Email
// ============================================================================

/// Lower-cased email address.
///
/// Only the shape `local@domain.tld` is checked; deliverability is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(email: &str) -> Result<Self, ValidationError> {
        let email = email.trim().to_ascii_lowercase();
        check_length("email", &email, 3, 254)?;

        let invalid = || ValidationError::InvalidFormat {
            field: "email",
            value: email.clone(),
            expected: "local@domain",
        };

        let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
        if local.is_empty()
            || domain.contains('@')
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
            || email.chars().any(char::is_whitespace)
        {
            return Err(invalid());
        }

        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// PhoneNumber
// ============================================================================

/// Phone number normalised to an optional leading `+` followed by digits.
///
/// Spaces, dashes and parentheses are stripped before checking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn new(phone: &str) -> Result<Self, ValidationError> {
        let compact: String = phone
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect();
        if compact.is_empty() {
            return Err(ValidationError::Blank { field: "phone" });
        }

        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidFormat {
                field: "phone",
                value: phone.trim().to_string(),
                expected: "digits with optional leading +",
            });
        }
        check_length("phone", digits, 6, 15)?;

        Ok(Self(compact))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional free-text description, trimmed and capped at 255 chars.
pub fn description(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => {
            check_length("description", text, 1, 255)?;
            Ok(Some(text.to_string()))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
