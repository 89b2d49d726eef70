//! Validator configuration.

use super::builder::BuildError;
use crate::collector::{CollectorKind, DEFAULT_MAX_ERRORS};
use crate::context::DEFAULT_MAX_DEPTH;
use crate::strategy::ExecutionMode;
use serde::{Deserialize, Serialize};

/// Default number of idle contexts a validator keeps.
pub const DEFAULT_POOL_CAPACITY: usize = 32;

/// Tunables of a [`Validator`](super::Validator).
///
/// Missing keys fall back to their defaults when deserializing.
///
/// # Example
///
/// ```rust
/// use scenegate::strategy::ExecutionMode;
/// use scenegate::validator::ValidatorConfig;
///
/// let config = ValidatorConfig::from_json(r#"{"max_errors": 5, "execution_mode": "parallel"}"#)
///     .unwrap();
///
/// assert_eq!(config.max_errors, 5);
/// assert_eq!(config.execution_mode, ExecutionMode::Parallel);
/// assert_eq!(config.max_depth, 8);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Error budget per invocation
    pub max_errors: usize,
    /// Nesting limit for nested records
    pub max_depth: usize,
    pub execution_mode: ExecutionMode,
    pub collector: CollectorKind,
    /// Cache merged rules per (type, scene)
    pub cache_merged_rules: bool,
    /// Reuse contexts between invocations
    pub pool_contexts: bool,
    pub pool_capacity: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_errors: DEFAULT_MAX_ERRORS,
            max_depth: DEFAULT_MAX_DEPTH,
            execution_mode: ExecutionMode::default(),
            collector: CollectorKind::default(),
            cache_merged_rules: true,
            pool_contexts: true,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl ValidatorConfig {
    /// Parse and check a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        let config: ValidatorConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Reject values no validator can run with.
    pub fn check(&self) -> Result<(), BuildError> {
        if self.max_errors == 0 {
            return Err(BuildError::InvalidMaxErrors);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ValidatorConfig::default();

        assert_eq!(config.max_errors, 100);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.execution_mode, ExecutionMode::Sequential);
        assert_eq!(config.collector, CollectorKind::List);
        assert!(config.cache_merged_rules);
        assert!(config.pool_contexts);
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(
            ValidatorConfig::from_json("{}").unwrap(),
            ValidatorConfig::default()
        );
    }

    #[test]
    fn rejects_zero_budget() {
        assert!(matches!(
            ValidatorConfig::from_json(r#"{"max_errors": 0}"#),
            Err(BuildError::InvalidMaxErrors)
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            ValidatorConfig::from_json("{max_errors"),
            Err(BuildError::Config(_))
        ));
    }

    #[test]
    fn collector_kind_round_trips_through_json() {
        let config = ValidatorConfig {
            collector: CollectorKind::Grouped,
            ..ValidatorConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();

        assert!(json.contains("\"grouped\""));
        assert_eq!(ValidatorConfig::from_json(&json).unwrap(), config);
    }
}
