//! Rule engine seam.
//!
//! The orchestration layer never interprets rule expressions itself. It
//! hands a field value and an expression to a [`RuleEngine`] and turns the
//! returned [`RuleFailure`]s into field errors. [`BasicRuleEngine`] is the
//! built-in implementation; any other engine can be plugged in through the
//! validator builder.

mod basic;
mod expression;

pub use basic::{BasicRuleEngine, CustomRule, StructCheck};
pub use expression::{parse_expression, Term};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One failed rule term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleFailure {
    /// Field the failure belongs to. Set by struct-level checks; field
    /// checks leave it empty and the caller supplies the field.
    pub field: Option<String>,
    pub tag: String,
    pub param: String,
    pub message: Option<String>,
}

impl RuleFailure {
    pub fn new(tag: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            field: None,
            tag: tag.into(),
            param: param.into(),
            message: None,
        }
    }

    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Errors raised while evaluating an expression.
///
/// These are faults in the rule declaration, not failed checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleEngineError {
    #[error("unknown rule tag '{tag}'")]
    UnknownTag { tag: String },

    #[error("invalid parameter '{param}' for rule '{tag}': {reason}")]
    InvalidParam {
        tag: String,
        param: String,
        reason: String,
    },

    #[error("malformed rule expression '{expression}': {reason}")]
    Malformed { expression: String, reason: String },

    #[error("rule '{tag}' cannot be applied to a {kind} value")]
    Unsupported { tag: String, kind: &'static str },
}

/// Evaluates rule expressions against values.
pub trait RuleEngine: Send + Sync {
    /// Check one value against a comma-separated rule expression.
    fn validate_field(
        &self,
        value: &Value,
        expression: &str,
    ) -> Result<Vec<RuleFailure>, RuleEngineError>;

    /// Whole-record checks for types that declare no rule set.
    ///
    /// Failures should name their field with [`RuleFailure::on_field`].
    fn validate_struct(
        &self,
        type_name: &str,
        value: &Value,
    ) -> Result<Vec<RuleFailure>, RuleEngineError>;
}

/// Short JSON kind name used in diagnostics.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
