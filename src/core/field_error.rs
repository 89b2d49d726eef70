//! Field-level validation errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Largest serialized offending value kept on an error, in bytes.
pub const MAX_VALUE_BYTES: usize = 4096;

/// Longest pre-rendered message kept on an error, in chars.
pub const MAX_MESSAGE_CHARS: usize = 2048;

/// Tag of the synthetic error recorded when a strategy panics.
pub const PANIC_TAG: &str = "panic";

/// Tag of the synthetic error recorded when a strategy returns an error.
pub const STRATEGY_ERROR_TAG: &str = "strategy_error";

/// A single failed check against one field.
///
/// Field errors are immutable values. The offending value and the message
/// are size-capped on construction so that one huge field cannot bloat the
/// error collector.
///
/// # Example
///
/// ```rust
/// use scenegate::core::FieldError;
/// use serde_json::json;
///
/// let error = FieldError::new("User.age", "age", "min")
///     .with_param("18")
///     .with_value(json!(15));
///
/// assert_eq!(error.field, "age");
/// assert_eq!(error.to_string(), "User.age: failed 'min=18' (value: 15)");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path from the validated root, e.g. `User.address.city`
    pub namespace: String,
    /// Logical field name
    pub field: String,
    /// Rule tag that failed
    pub tag: String,
    /// Rule parameter, empty when the rule takes none
    pub param: String,
    /// Offending value, capped at [`MAX_VALUE_BYTES`] serialized bytes
    pub value: Option<Value>,
    /// Optional pre-rendered message, capped at [`MAX_MESSAGE_CHARS`]
    pub message: Option<String>,
}

impl FieldError {
    pub fn new(
        namespace: impl Into<String>,
        field: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            field: field.into(),
            tag: tag.into(),
            param: String::new(),
            value: None,
            message: None,
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    /// Attach the offending value, truncating its serialized form if needed.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(cap_value(value));
        self
    }

    /// Attach a rendered message, truncated to [`MAX_MESSAGE_CHARS`].
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(truncate_chars(message.into(), MAX_MESSAGE_CHARS));
        self
    }

    /// Synthetic error for a strategy that panicked.
    pub fn panic(strategy: &str, detail: impl Into<String>) -> Self {
        FieldError::new(strategy, "", PANIC_TAG)
            .with_param(strategy)
            .with_message(detail)
    }

    /// Synthetic error for a strategy that returned an error.
    pub fn strategy_error(strategy: &str, detail: impl Into<String>) -> Self {
        FieldError::new(strategy, "", STRATEGY_ERROR_TAG)
            .with_param(strategy)
            .with_message(detail)
    }

    /// True for errors produced by a faulty strategy rather than bad data.
    pub fn is_synthetic(&self) -> bool {
        self.tag == PANIC_TAG || self.tag == STRATEGY_ERROR_TAG
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.message {
            return write!(f, "{}: {}", self.namespace, message);
        }
        if self.param.is_empty() {
            write!(f, "{}: failed '{}'", self.namespace, self.tag)?;
        } else {
            write!(f, "{}: failed '{}={}'", self.namespace, self.tag, self.param)?;
        }
        if let Some(value) = &self.value {
            write!(f, " (value: {value})")?;
        }
        Ok(())
    }
}

fn cap_value(value: Value) -> Value {
    let serialized = value.to_string();
    if serialized.len() <= MAX_VALUE_BYTES {
        return value;
    }
    let mut end = MAX_VALUE_BYTES;
    while !serialized.is_char_boundary(end) {
        end -= 1;
    }
    Value::String(format!("{}...", &serialized[..end]))
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}
