//! Core value types for scene-based validation.
//!
//! This module contains the pure building blocks of the engine:
//! - Scene bitmasks and their algebra
//! - Per-scene rule sets
//! - Field errors produced by failed checks
//!
//! Nothing in this module has side effects; every type is an immutable
//! value that can be shared freely between threads.

mod field_error;
mod macros;
mod rule_set;
mod scene;

pub use field_error::{
    FieldError, MAX_MESSAGE_CHARS, MAX_VALUE_BYTES, PANIC_TAG, STRATEGY_ERROR_TAG,
};
pub use rule_set::{FieldRules, RuleSet};
pub use scene::Scene;
