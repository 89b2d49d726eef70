//! Scenegate: scene-based validation orchestration for business records
//!
//! The same record is usually validated differently depending on what is
//! being done with it: an account needs a password on creation but not on
//! every update. Scenegate keys rule sets by *scene* bitmasks and resolves
//! which rules apply at validation time.
//!
//! # Core Concepts
//!
//! - **Scene**: Bitmask naming the validation situation (create, update, ...)
//! - **Record**: Trait a type implements to declare fields, rules and capabilities
//! - **Inspector**: Builds per-type metadata and compiled field accessors once
//! - **Strategy**: One validation pass; rule and business strategies ship built in
//! - **Collector**: Bounded, thread-safe sink for field errors
//!
//! # Example
//!
//! ```rust
//! use scenegate::core::{RuleSet, Scene};
//! use scenegate::inspect::{Record, Schema};
//! use scenegate::rule_set;
//! use scenegate::validator::Validator;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Account {
//!     email: String,
//!     age: u32,
//! }
//!
//! impl Record for Account {
//!     fn schema(schema: &mut Schema<Self>) {
//!         schema
//!             .field("email", |a: &Account| a.email.clone())
//!             .field("age", |a: &Account| a.age);
//!     }
//!
//!     fn rule_set() -> Option<RuleSet> {
//!         Some(rule_set! {
//!             Scene::CREATE => {
//!                 "email" => "required,email",
//!                 "age" => "min=18",
//!             },
//!             Scene::UPDATE => {
//!                 "email" => "omitempty,email",
//!             },
//!         })
//!     }
//! }
//!
//! let validator = Validator::new();
//! let account = Account {
//!     email: "ada@example.com".to_string(),
//!     age: 16,
//! };
//!
//! let err = validator.validate(&account, Scene::CREATE).unwrap_err();
//! assert_eq!(err.field_errors().unwrap().len(), 1);
//!
//! assert!(validator.validate(&account, Scene::UPDATE).is_ok());
//! ```

pub mod collector;
pub mod context;
pub mod core;
pub mod engine;
pub mod inspect;
pub mod matcher;
pub mod strategy;
pub mod validator;

// Re-export commonly used types
pub use crate::collector::ErrorCollector;
pub use crate::context::{ValidationContext, ValidationRequest};
pub use crate::core::{FieldError, RuleSet, Scene};
pub use crate::inspect::{BusinessValidator, LifecycleHooks, Record, Schema};
pub use crate::validator::{ValidationError, ValidationResult, Validator};
