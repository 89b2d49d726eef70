//! Validation results.

use super::error::{ValidationError, ValidationErrors};
use crate::core::{FieldError, Scene};
use chrono::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use uuid::Uuid;

/// Outcome of one [`Validator::validate_request`](super::Validator::validate_request) call.
#[derive(Clone, Debug)]
pub struct ValidationResult {
    pub success: bool,
    pub errors: Vec<FieldError>,
    pub scene: Scene,
    pub invocation_id: Uuid,
    pub duration: Duration,
}

impl ValidationResult {
    pub fn new(errors: Vec<FieldError>, scene: Scene, invocation_id: Uuid, duration: Duration) -> Self {
        Self {
            success: errors.is_empty(),
            errors,
            scene,
            invocation_id,
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Errors reported for one field.
    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }

    /// `Ok(())` when no error was collected.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.success {
            Ok(())
        } else {
            Err(ValidationError::Invalid(ValidationErrors::new(self.errors)))
        }
    }

    /// Accumulate every field error into a stillwater [`Validation`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use scenegate::core::{FieldError, Scene};
    /// use scenegate::validator::ValidationResult;
    /// use stillwater::validation::Validation;
    /// use uuid::Uuid;
    ///
    /// let result = ValidationResult::new(
    ///     vec![FieldError::new("User.age", "age", "min")],
    ///     Scene::CREATE,
    ///     Uuid::new_v4(),
    ///     chrono::Duration::zero(),
    /// );
    ///
    /// match result.into_validation() {
    ///     Validation::Failure(errors) => assert_eq!(errors.len(), 1),
    ///     Validation::Success(_) => unreachable!(),
    /// }
    /// ```
    pub fn into_validation(self) -> Validation<(), NonEmptyVec<FieldError>> {
        let checks: Vec<Validation<(), NonEmptyVec<FieldError>>> =
            self.errors.into_iter().map(Validation::fail).collect();
        Validation::all_vec(checks).map(|_| ())
    }
}
