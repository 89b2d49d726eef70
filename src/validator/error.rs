//! Validation outcome errors.

use crate::core::FieldError;
use crate::strategy::OrchestrationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle hook that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    BeforeValidation,
    AfterValidation,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::BeforeValidation => write!(f, "before_validation"),
            HookPhase::AfterValidation => write!(f, "after_validation"),
        }
    }
}

/// Every field error of a failed validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.errors
    }

    /// Errors reported for one field.
    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 { "error" } else { "errors" };
        write!(f, "{} validation {}", self.errors.len(), noun)?;
        for (i, error) in self.errors.iter().enumerate() {
            let separator = if i == 0 { ": " } else { "; " };
            write!(f, "{separator}{error}")?;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Why a validation call did not succeed.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid validation request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Invalid(ValidationErrors),

    #[error("orchestration failed: {0}")]
    Orchestration(#[source] OrchestrationError),

    #[error("{phase} hook failed: {message}")]
    Hook { phase: HookPhase, message: String },

    #[error("validation cancelled")]
    Cancelled,
}

impl ValidationError {
    /// Field errors, when validation ran and found some.
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ValidationError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<OrchestrationError> for ValidationError {
    fn from(error: OrchestrationError) -> Self {
        match error {
            OrchestrationError::Cancelled => ValidationError::Cancelled,
            other => ValidationError::Orchestration(other),
        }
    }
}
