//! End-to-end validation scenarios through the public API.

use scenegate::collector::{CollectorKind, ErrorCollector};
use scenegate::context::{CancellationToken, ValidationContext, ValidationRequest};
use scenegate::core::{FieldError, RuleSet, Scene, PANIC_TAG};
use scenegate::inspect::{BusinessValidator, Record, Schema, TypeInspector, Validatable};
use scenegate::strategy::{ExecutionMode, FnStrategy, Strategy, StrategyError, StrategyKind};
use scenegate::validator::{ValidationError, Validator};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct Applicant {
    age: u32,
}

impl Record for Applicant {
    fn schema(schema: &mut Schema<Self>) {
        schema.field("age", |a: &Applicant| a.age);
    }

    fn rule_set() -> Option<RuleSet> {
        Some(RuleSet::new().rule(Scene::CREATE, "age", "min=18"))
    }
}

#[derive(Serialize)]
struct Blank;

impl Record for Blank {}

#[derive(Serialize)]
struct Address {
    city: String,
    zip: String,
}

impl Record for Address {
    fn schema(schema: &mut Schema<Self>) {
        schema
            .field("city", |a: &Address| a.city.clone())
            .field("zip", |a: &Address| a.zip.clone());
    }

    fn rule_set() -> Option<RuleSet> {
        Some(
            RuleSet::new()
                .rule(Scene::ALL, "city", "required")
                .rule(Scene::ALL, "zip", "len=5"),
        )
    }
}

#[derive(Serialize)]
struct Customer {
    name: String,
    #[serde(rename = "mail")]
    email: String,
    address: Option<Address>,
    credit: i64,
}

impl Record for Customer {
    fn schema(schema: &mut Schema<Self>) {
        schema
            .field("name", |c: &Customer| c.name.clone())
            .field_as("email", "mail", |c: &Customer| c.email.clone())
            .nested("address", |c| c.address.as_ref());
    }

    fn rule_set() -> Option<RuleSet> {
        Some(
            RuleSet::new()
                .rule(Scene::CREATE | Scene::UPDATE, "name", "required")
                .rule(Scene::CREATE, "email", "required,email"),
        )
    }

    fn as_business_validator(&self) -> Option<&dyn BusinessValidator> {
        Some(self)
    }
}

impl BusinessValidator for Customer {
    fn validate_business(&self, scene: Scene, collector: &dyn ErrorCollector) {
        if scene.has(Scene::CREATE) && self.credit < 0 {
            collector.add(FieldError::new("Customer.credit", "credit", "non_negative"));
        }
    }
}

fn customer() -> Customer {
    Customer {
        name: String::new(),
        email: "not-an-email".to_string(),
        address: Some(Address {
            city: String::new(),
            zip: "123".to_string(),
        }),
        credit: -5,
    }
}

fn builder() -> scenegate::validator::ValidatorBuilder {
    Validator::builder().inspector(Arc::new(TypeInspector::new()))
}

/// Strategy adding one error tagged with its own name.
fn tagging(name: &'static str, field: &'static str) -> Arc<dyn Strategy> {
    Arc::new(FnStrategy::new(
        name,
        move |_target: &dyn Validatable, ctx: &ValidationContext| {
            ctx.collector().add(FieldError::new(name, field, name));
            Ok(())
        },
    ))
}

#[test]
fn min_age_applies_only_under_create() {
    let validator = builder().build().unwrap();
    let minor = Applicant { age: 15 };

    let err = validator.validate(&minor, Scene::CREATE).unwrap_err();
    let errors = err.field_errors().expect("field errors");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].field, "age");
    assert_eq!(errors.as_slice()[0].tag, "min");
    assert_eq!(errors.as_slice()[0].param, "18");

    assert!(validator.validate(&minor, Scene::UPDATE).is_ok());
    assert!(validator.validate(&Applicant { age: 18 }, Scene::CREATE).is_ok());
}

#[test]
fn panicking_strategy_is_contained() {
    let validator = builder()
        .strategy(tagging("first", "early"), 1)
        .strategy(
            Arc::new(FnStrategy::new("explode", |_target: &dyn Validatable, _ctx: &ValidationContext| {
                panic!("boom")
            })),
            5,
        )
        .strategy(tagging("last", "late"), 50)
        .build()
        .unwrap();

    let result = validator
        .validate_request(&ValidationRequest::new(&Blank, Scene::CREATE))
        .unwrap();

    let tags: Vec<&str> = result.errors.iter().map(|e| e.tag.as_str()).collect();
    assert_eq!(tags, vec!["first", PANIC_TAG, "last"]);

    let panic = &result.errors[1];
    assert!(panic.is_synthetic());
    assert_eq!(panic.param, "explode");
    assert!(panic.message.as_deref().unwrap_or_default().contains("boom"));
}

#[test]
fn sequential_mode_follows_priority() {
    let validator = builder()
        .strategy(tagging("b", "second"), 200)
        .strategy(tagging("a", "first"), 100)
        .strategy(tagging("c", "third"), 200)
        .build()
        .unwrap();

    let result = validator
        .validate_request(&ValidationRequest::new(&Blank, Scene::UPDATE))
        .unwrap();

    let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["first", "second", "third"]);
}

#[test]
fn strategy_error_aborts_sequential_run() {
    let validator = builder()
        .strategy(
            Arc::new(FnStrategy::new("broken", |_target: &dyn Validatable, _ctx: &ValidationContext| {
                Err(StrategyError::Custom("backend down".to_string()))
            })),
            1,
        )
        .strategy(tagging("after", "never"), 2)
        .build()
        .unwrap();

    let result = validator.validate(&Blank, Scene::CREATE);
    match result {
        Err(ValidationError::Orchestration(error)) => {
            assert!(error.to_string().contains("broken"));
        }
        other => panic!("expected orchestration failure, got {other:?}"),
    }
}

#[test]
fn strategy_error_does_not_stop_parallel_siblings() {
    let validator = builder()
        .execution_mode(ExecutionMode::Parallel)
        .strategy(
            Arc::new(FnStrategy::new("broken", |_target: &dyn Validatable, _ctx: &ValidationContext| {
                Err(StrategyError::Custom("backend down".to_string()))
            })),
            1,
        )
        .strategy(tagging("sibling", "ran"), 2)
        .build()
        .unwrap();

    let result = validator
        .validate_request(&ValidationRequest::new(&Blank, Scene::CREATE))
        .unwrap();

    assert_eq!(result.error_count(), 2);
    assert_eq!(result.errors_for("ran").count(), 1);
    assert!(result.errors.iter().any(|e| e.is_synthetic()));
}

#[test]
fn parallel_mode_loses_no_errors() {
    const NAMES: [&str; 12] = [
        "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11",
    ];

    let validator = NAMES
        .iter()
        .enumerate()
        .fold(
            builder()
                .execution_mode(ExecutionMode::Parallel)
                .max_errors(NAMES.len()),
            |pipeline, (priority, name)| pipeline.strategy(tagging(name, name), priority as i32),
        )
        .build()
        .unwrap();

    for _ in 0..20 {
        let result = validator
            .validate_request(&ValidationRequest::new(&Blank, Scene::CREATE))
            .unwrap();
        assert_eq!(result.error_count(), NAMES.len());
    }
}

#[test]
fn nested_records_report_full_namespaces() {
    let validator = builder().build().unwrap();

    let err = validator.validate(&customer(), Scene::CREATE).unwrap_err();
    let namespaces: Vec<&str> = err
        .field_errors()
        .expect("field errors")
        .iter()
        .map(|e| e.namespace.as_str())
        .collect();

    assert_eq!(
        namespaces,
        vec![
            "Customer.email",
            "Customer.name",
            "Customer.address.city",
            "Customer.address.zip",
            "Customer.credit",
        ]
    );
}

#[test]
fn absent_nested_record_is_skipped() {
    let validator = builder().build().unwrap();
    let mut record = customer();
    record.address = None;
    record.credit = 0;

    let err = validator.validate(&record, Scene::UPDATE).unwrap_err();
    let errors = err.field_errors().expect("field errors");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].field, "name");
}

#[test]
fn include_and_exclude_narrow_checked_fields() {
    let validator = builder().build().unwrap();
    let record = customer();

    let result = validator
        .validate_request(
            &ValidationRequest::new(&record, Scene::CREATE)
                .with_include(vec!["name".to_string(), "email".to_string()])
                .with_exclude(vec!["email".to_string()]),
        )
        .unwrap();

    assert_eq!(result.errors_for("name").count(), 1);
    assert_eq!(result.errors_for("email").count(), 0);
}

#[test]
fn filters_match_declared_name_or_alias() {
    let validator = builder().build().unwrap();
    let record = customer();

    let by_alias = validator
        .validate_request(&ValidationRequest::new(&record, Scene::CREATE).with_include(vec!["mail".to_string()]))
        .unwrap();
    assert_eq!(by_alias.errors_for("email").count(), 1);
    assert_eq!(by_alias.errors_for("name").count(), 0);

    let excluded = validator
        .validate_request(&ValidationRequest::new(&record, Scene::CREATE).with_exclude(vec!["mail".to_string()]))
        .unwrap();
    assert_eq!(excluded.errors_for("email").count(), 0);
    assert_eq!(excluded.errors_for("name").count(), 1);
}

#[derive(Serialize)]
struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
}

impl Record for Profile {
    fn rule_set() -> Option<RuleSet> {
        Some(RuleSet::new().rule(Scene::CREATE, "nickname", "required"))
    }
}

#[test]
fn required_fails_for_field_serde_leaves_out() {
    let validator = builder().build().unwrap();

    let err = validator
        .validate(&Profile { nickname: None }, Scene::CREATE)
        .unwrap_err();
    let errors = err.field_errors().expect("field errors");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].namespace, "Profile.nickname");

    let named = Profile {
        nickname: Some("ada".to_string()),
    };
    assert!(validator.validate(&named, Scene::CREATE).is_ok());
}

#[test]
fn max_errors_stops_the_pipeline() {
    let validator = builder().max_errors(2).build().unwrap();

    let err = validator.validate(&customer(), Scene::CREATE).unwrap_err();
    assert_eq!(err.field_errors().map(|e| e.len()), Some(2));
}

#[test]
fn grouped_collector_keeps_every_error() {
    let validator = builder().collector(CollectorKind::Grouped).build().unwrap();

    let result = validator
        .validate_request(&ValidationRequest::new(&customer(), Scene::CREATE))
        .unwrap();
    assert_eq!(result.error_count(), 5);
    assert_eq!(result.errors_for("credit").count(), 1);
}

#[test]
fn cancelled_request_runs_nothing() {
    let validator = builder().build().unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let record = customer();
    let result = validator.validate_request(
        &ValidationRequest::new(&record, Scene::CREATE).with_cancellation(token),
    );
    assert!(matches!(result, Err(ValidationError::Cancelled)));
}

#[test]
fn unregistered_business_strategy_is_skipped() {
    let mut validator = builder().build().unwrap();
    assert_eq!(validator.orchestrator_mut().unregister(&StrategyKind::Business), 1);

    let result = validator
        .validate_request(&ValidationRequest::new(&customer(), Scene::CREATE))
        .unwrap();
    assert_eq!(result.errors_for("credit").count(), 0);
    assert_eq!(result.error_count(), 4);
}
