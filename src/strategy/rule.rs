//! Rule-driven field validation.

use super::{Strategy, StrategyError, StrategyKind};
use crate::context::ValidationContext;
use crate::core::FieldError;
use crate::engine::{RuleEngine, RuleFailure};
use crate::inspect::{TypeMetadata, Validatable};
use crate::matcher::SceneMatcher;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Applies a record's scene-matched rules through a [`RuleEngine`].
///
/// Fields are checked in name order. Values are read through the compiled
/// accessor when one exists, otherwise through the serde lookup, where a key
/// missing from the serialized object reads as null. A field neither path
/// can read is skipped. Records without a rule set are handed
/// to [`RuleEngine::validate_struct`] as a whole.
///
/// Include and exclude filters match a field by its rule key, its declared
/// name or its alias.
///
/// Declared nested records are validated afterwards through child
/// contexts, down to the context's maximum depth.
pub struct RuleStrategy {
    engine: Arc<dyn RuleEngine>,
    matcher: Arc<SceneMatcher>,
}

impl RuleStrategy {
    pub fn new(engine: Arc<dyn RuleEngine>, matcher: Arc<SceneMatcher>) -> Self {
        Self { engine, matcher }
    }

    fn validate_record(
        &self,
        target: &dyn Validatable,
        ctx: &ValidationContext,
    ) -> Result<(), StrategyError> {
        let metadata = target.inspect_with(ctx.inspector());

        let keep_going = if metadata.capabilities().rule_provider {
            self.apply_rules(target, &metadata, ctx)?
        } else {
            self.apply_struct_checks(target, &metadata, ctx)?
        };

        if keep_going {
            self.descend(target, &metadata, ctx)?;
        }
        Ok(())
    }

    /// Returns false once the run should stop.
    fn apply_rules(
        &self,
        target: &dyn Validatable,
        metadata: &TypeMetadata,
        ctx: &ValidationContext,
    ) -> Result<bool, StrategyError> {
        let rules = self.matcher.resolve(metadata, ctx.scene());
        let collector = ctx.collector();

        for (field, expression) in rules.iter() {
            if collector.is_full() || ctx.is_cancelled() {
                return Ok(false);
            }
            let accessor = metadata.accessor(field);
            let selected = match accessor {
                Some(accessor) => {
                    let mut names = vec![field.as_str(), accessor.name()];
                    names.extend(accessor.alias());
                    ctx.is_selected_any(&names)
                }
                None => ctx.is_selected(field),
            };
            if !selected {
                continue;
            }

            let value = match accessor {
                Some(accessor) => accessor.get(target.as_any()),
                None => target.lookup_field(field),
            };
            let Some(value) = value else {
                trace!(type_name = metadata.type_name(), field = field.as_str(), "field not readable");
                continue;
            };

            let failures = self
                .engine
                .validate_field(&value, expression)
                .map_err(|source| StrategyError::Engine {
                    field: field.clone(),
                    source,
                })?;

            for failure in failures {
                let error = field_error(ctx, metadata, field, Some(&value), failure);
                if !collector.add(error) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn apply_struct_checks(
        &self,
        target: &dyn Validatable,
        metadata: &TypeMetadata,
        ctx: &ValidationContext,
    ) -> Result<bool, StrategyError> {
        let Some(value) = target.to_value() else {
            return Ok(true);
        };

        let failures = self
            .engine
            .validate_struct(metadata.type_name(), &value)
            .map_err(|source| StrategyError::Engine {
                field: metadata.short_name().to_string(),
                source,
            })?;

        for failure in failures {
            let field = failure.field.clone().unwrap_or_default();
            if !field.is_empty() && !ctx.is_selected(&field) {
                continue;
            }
            let field_value = value.get(&field);
            if !ctx
                .collector()
                .add(field_error(ctx, metadata, &field, field_value, failure))
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn descend(
        &self,
        target: &dyn Validatable,
        metadata: &TypeMetadata,
        ctx: &ValidationContext,
    ) -> Result<(), StrategyError> {
        if !ctx.can_descend() {
            return Ok(());
        }

        for nested in metadata.nested() {
            if ctx.collector().is_full() || ctx.is_cancelled() {
                return Ok(());
            }
            if !ctx.is_selected(nested.name()) {
                continue;
            }
            if let Some(child) = nested.get(target.as_any()) {
                let child_ctx = ctx.child(ctx.path(metadata.short_name(), nested.name()));
                self.validate_record(child, &child_ctx)?;
            }
        }
        Ok(())
    }
}

impl Strategy for RuleStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Rule
    }

    fn validate(
        &self,
        target: &dyn Validatable,
        ctx: &ValidationContext,
    ) -> Result<(), StrategyError> {
        self.validate_record(target, ctx)
    }
}

fn field_error(
    ctx: &ValidationContext,
    metadata: &TypeMetadata,
    field: &str,
    value: Option<&Value>,
    failure: RuleFailure,
) -> FieldError {
    let namespace = if field.is_empty() {
        ctx.namespace()
            .map_or_else(|| metadata.short_name().to_string(), str::to_string)
    } else {
        ctx.path(metadata.short_name(), field)
    };

    let mut error = FieldError::new(namespace, field, failure.tag).with_param(failure.param);
    if let Some(value) = value {
        error = error.with_value(value.clone());
    }
    if let Some(message) = failure.message {
        error = error.with_message(message);
    }
    error
}
