//! Form validation shared by the submit, comment and login views.
//!
//! Validation runs before any request: a form with errors is never sent.

use crate::models::TicketField;
use crate::services::Localizer;
use serde::Serialize;
use std::collections::BTreeMap;

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_MESSAGE_LENGTH: usize = 100_000;
pub const MAX_FIELD_LENGTH: usize = 50;
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Lifecycle of a submit form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum FormStage {
    #[default]
    Editing,
    Sending,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    TooLong { max: usize },
    TooShort { min: usize },
    InvalidEmail,
}

impl FieldError {
    pub fn message_key(self) -> &'static str {
        match self {
            Self::Required => "form.required",
            Self::TooLong { .. } => "form.too-long",
            Self::TooShort { .. } => "form.password-too-short",
            Self::InvalidEmail => "form.invalid-email",
        }
    }
}

pub fn required(value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        Err(FieldError::Required)
    } else {
        Ok(())
    }
}

/// Length is counted in characters, not bytes.
pub fn max_length(value: &str, max: usize) -> Result<(), FieldError> {
    if value.chars().count() > max {
        Err(FieldError::TooLong { max })
    } else {
        Ok(())
    }
}

pub fn validate_title(title: &str) -> Result<(), FieldError> {
    required(title)?;
    max_length(title, MAX_TITLE_LENGTH)
}

pub fn validate_message(message: &str) -> Result<(), FieldError> {
    required(message)?;
    max_length(message, MAX_MESSAGE_LENGTH)
}

/// Optional rich text, e.g. a comment that only carries a state change.
pub fn validate_optional_message(message: &str) -> Result<(), FieldError> {
    max_length(message, MAX_MESSAGE_LENGTH)
}

pub fn validate_field(field: &TicketField, value: &str) -> Result<(), FieldError> {
    if field.required {
        required(value)?;
    }
    max_length(value, MAX_FIELD_LENGTH)
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    required(email)?;
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(FieldError::InvalidEmail)
    }
}

pub fn validate_password(password: &str) -> Result<(), FieldError> {
    required(password)?;
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        Err(FieldError::TooShort {
            min: PASSWORD_MIN_LENGTH,
        })
    } else {
        Ok(())
    }
}

/// `local@domain.tld`: no whitespace or special characters in the local
/// part, dot-separated domain labels, and an alphabetic top-level domain of
/// at least two letters.
pub fn is_valid_email(email: &str) -> bool {
    const FORBIDDEN: &[char] = &['<', '>', '(', ')', '[', ']', '\\', ',', ';', ':', '"', '@'];

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty()
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
        || local.chars().any(|c| c.is_whitespace() || FORBIDDEN.contains(&c))
    {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld = labels[labels.len() - 1];
    labels_ok && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Localized validation errors keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    errors: BTreeMap<String, String>,
}

impl FormErrors {
    /// Record the outcome of one validator.
    pub fn check(&mut self, field: &str, result: Result<(), FieldError>, strings: &Localizer) {
        if let Err(e) = result {
            self.errors
                .insert(field.to_string(), strings.get(e.message_key()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }
}
