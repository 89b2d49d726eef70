//! Record-defined business validation.

use super::{Strategy, StrategyError, StrategyKind};
use crate::context::ValidationContext;
use crate::inspect::Validatable;

/// Calls [`BusinessValidator::validate_business`] on records that
/// implement it; other records pass untouched.
///
/// [`BusinessValidator::validate_business`]: crate::inspect::BusinessValidator::validate_business
#[derive(Debug, Default, Clone, Copy)]
pub struct BusinessStrategy;

impl BusinessStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for BusinessStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Business
    }

    fn validate(
        &self,
        target: &dyn Validatable,
        ctx: &ValidationContext,
    ) -> Result<(), StrategyError> {
        let metadata = target.inspect_with(ctx.inspector());
        if !metadata.capabilities().business_validator {
            return Ok(());
        }

        if let Some(validator) = target.business_validator() {
            validator.validate_business(ctx.scene(), ctx.collector());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{new_collector, CollectorKind, ErrorCollector};
    use crate::context::ValidationRequest;
    use crate::core::{FieldError, Scene};
    use crate::inspect::{BusinessValidator, Record, TypeInspector};
    use serde::Serialize;
    use std::sync::Arc;

    #[derive(Serialize)]
    struct Booking {
        nights: u32,
        guests: u32,
    }

    impl Record for Booking {
        fn as_business_validator(&self) -> Option<&dyn BusinessValidator> {
            Some(self)
        }
    }

    impl BusinessValidator for Booking {
        fn validate_business(&self, scene: Scene, collector: &dyn ErrorCollector) {
            if scene.has(Scene::CREATE) && self.guests > self.nights * 4 {
                collector.add(
                    FieldError::new("Booking.guests", "guests", "capacity")
                        .with_message("too many guests for the stay"),
                );
            }
        }
    }

    #[derive(Serialize)]
    struct Note {
        text: String,
    }

    impl Record for Note {}

    fn context(target: &dyn Validatable, scene: Scene) -> ValidationContext {
        let mut ctx = ValidationContext::new(
            new_collector(CollectorKind::List, 10),
            Arc::new(TypeInspector::new()),
        );
        ctx.prepare(&ValidationRequest::new(target, scene), 10, 8);
        ctx
    }

    #[test]
    fn runs_business_validation_with_scene() {
        let booking = Booking {
            nights: 1,
            guests: 9,
        };

        let ctx = context(&booking, Scene::CREATE);
        BusinessStrategy::new().validate(&booking, &ctx).unwrap();
        assert_eq!(ctx.collector().count(), 1);
        assert_eq!(ctx.collector().get_all()[0].tag, "capacity");

        let ctx = context(&booking, Scene::UPDATE);
        BusinessStrategy::new().validate(&booking, &ctx).unwrap();
        assert_eq!(ctx.collector().count(), 0);
    }

    #[test]
    fn records_without_capability_pass() {
        let note = Note {
            text: "hello".to_string(),
        };
        let ctx = context(&note, Scene::ALL);

        BusinessStrategy::new().validate(&note, &ctx).unwrap();
        assert!(!ctx.collector().has_errors());
    }
}
