//! Validation strategies and their orchestration.
//!
//! A [`Strategy`] is one pluggable validation pass over a record. The
//! [`Orchestrator`] runs registered strategies in priority order, either
//! one after the other or concurrently, against a shared context.
//!
//! Two strategies ship with the crate:
//! - [`RuleStrategy`] applies the record's scene-matched rules through a
//!   rule engine
//! - [`BusinessStrategy`] calls the record's own business validation

mod business;
mod orchestrator;
mod rule;

pub use business::BusinessStrategy;
pub use orchestrator::{OrchestrationError, Orchestrator};
pub(crate) use orchestrator::panic_message;
pub use rule::RuleStrategy;

use crate::context::ValidationContext;
use crate::engine::RuleEngineError;
use crate::inspect::Validatable;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default priority of the rule strategy.
pub const RULE_PRIORITY: i32 = 10;

/// Default priority of the business strategy.
pub const BUSINESS_PRIORITY: i32 = 20;

/// Identifies a strategy for unregistration and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Rule,
    Business,
    Custom(&'static str),
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Rule => "rule",
            StrategyKind::Business => "business",
            StrategyKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the orchestrator dispatches strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// In priority order on the caller's thread
    #[default]
    Sequential,
    /// One scoped thread per strategy
    Parallel,
}

/// Fault raised by a strategy.
///
/// Failed checks are not faults; they are field errors in the collector.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("rule engine failed on '{field}': {source}")]
    Engine {
        field: String,
        #[source]
        source: RuleEngineError,
    },

    #[error("{0}")]
    Custom(String),
}

/// One validation pass over a record.
///
/// Implementations report failed checks through `ctx.collector()` and
/// should stop once the collector is full or the context is cancelled.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn validate(&self, target: &dyn Validatable, ctx: &ValidationContext)
        -> Result<(), StrategyError>;
}

/// Strategy backed by a closure.
///
/// # Example
///
/// ```rust
/// use scenegate::core::FieldError;
/// use scenegate::strategy::{FnStrategy, Strategy, StrategyKind};
///
/// let audit = FnStrategy::new("audit", |_target, ctx| {
///     ctx.collector().add(FieldError::new("audit", "", "flagged"));
///     Ok(())
/// });
///
/// assert_eq!(audit.kind(), StrategyKind::Custom("audit"));
/// ```
pub struct FnStrategy<F> {
    name: &'static str,
    check: F,
}

impl<F> FnStrategy<F> {
    pub fn new(name: &'static str, check: F) -> Self
    where
        F: Fn(&dyn Validatable, &ValidationContext) -> Result<(), StrategyError> + Send + Sync,
    {
        Self { name, check }
    }
}

impl<F> Strategy for FnStrategy<F>
where
    F: Fn(&dyn Validatable, &ValidationContext) -> Result<(), StrategyError> + Send + Sync,
{
    fn kind(&self) -> StrategyKind {
        StrategyKind::Custom(self.name)
    }

    fn validate(
        &self,
        target: &dyn Validatable,
        ctx: &ValidationContext,
    ) -> Result<(), StrategyError> {
        (self.check)(target, ctx)
    }
}
