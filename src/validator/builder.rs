//! Fluent construction of validators.

use super::config::ValidatorConfig;
use super::Validator;
use crate::collector::CollectorKind;
use crate::engine::{BasicRuleEngine, RuleEngine};
use crate::inspect::TypeInspector;
use crate::strategy::{ExecutionMode, Strategy};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur when building validators and requests.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Validation target not specified. Call .target(record) before .build()")]
    MissingTarget,

    #[error("max_errors must be at least 1")]
    InvalidMaxErrors,

    #[error("Invalid validator configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Builder for [`Validator`].
///
/// The rule and business strategies are always registered; extra
/// strategies are added with [`strategy`](Self::strategy).
///
/// # Example
///
/// ```rust
/// use scenegate::collector::CollectorKind;
/// use scenegate::strategy::{ExecutionMode, StrategyKind};
/// use scenegate::validator::ValidatorBuilder;
///
/// let validator = ValidatorBuilder::new()
///     .max_errors(10)
///     .collector(CollectorKind::Grouped)
///     .execution_mode(ExecutionMode::Parallel)
///     .build()
///     .unwrap();
///
/// assert_eq!(validator.config().max_errors, 10);
/// assert_eq!(
///     validator.orchestrator().kinds(),
///     vec![StrategyKind::Rule, StrategyKind::Business]
/// );
/// ```
pub struct ValidatorBuilder {
    config: ValidatorConfig,
    engine: Option<Arc<dyn RuleEngine>>,
    inspector: Option<Arc<TypeInspector>>,
    strategies: Vec<(Arc<dyn Strategy>, i32)>,
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
            engine: None,
            inspector: None,
            strategies: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_errors(mut self, max_errors: usize) -> Self {
        self.config.max_errors = max_errors;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.config.execution_mode = mode;
        self
    }

    pub fn collector(mut self, kind: CollectorKind) -> Self {
        self.config.collector = kind;
        self
    }

    pub fn cache_merged_rules(mut self, enabled: bool) -> Self {
        self.config.cache_merged_rules = enabled;
        self
    }

    pub fn pool_contexts(mut self, enabled: bool) -> Self {
        self.config.pool_contexts = enabled;
        self
    }

    /// Use a custom rule engine instead of [`BasicRuleEngine`].
    pub fn rule_engine(mut self, engine: Arc<dyn RuleEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Use a private inspector instead of [`TypeInspector::global`].
    pub fn inspector(mut self, inspector: Arc<TypeInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// Register an additional strategy.
    pub fn strategy(mut self, strategy: Arc<dyn Strategy>, priority: i32) -> Self {
        self.strategies.push((strategy, priority));
        self
    }

    /// Build the validator.
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Validator, BuildError> {
        self.config.check()?;
        Ok(self.assemble())
    }

    pub(super) fn assemble(self) -> Validator {
        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(BasicRuleEngine::new()));
        let inspector = self.inspector.unwrap_or_else(TypeInspector::global);

        let mut validator = Validator::from_parts(self.config, engine, inspector);
        for (strategy, priority) in self.strategies {
            validator.orchestrator_mut().register(strategy, priority);
        }
        validator
    }
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
