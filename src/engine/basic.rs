//! Built-in rule engine.

use super::expression::{parse_expression, Term};
use super::{value_kind, RuleEngine, RuleEngineError, RuleFailure};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

// Constant patterns; `None` only if a pattern fails to compile.
static EMAIL_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

static URL_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/$.?#][^\s]*$").ok());

static NUMERIC_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[-+]?[0-9]+(\.[0-9]+)?$").ok());

const MAX_ALIAS_DEPTH: usize = 4;

/// User-registered field check: `(value, param) -> passed`.
pub type CustomRule = Arc<dyn Fn(&Value, &str) -> bool + Send + Sync>;

/// User-registered whole-record check.
pub type StructCheck = Arc<dyn Fn(&Value) -> Vec<RuleFailure> + Send + Sync>;

enum Outcome {
    Pass,
    // `omitempty` on an empty value
    Skip,
    Fail(RuleFailure),
}

/// Rule engine understanding a small tag vocabulary.
///
/// | Tag | Meaning |
/// |---|---|
/// | `required` | value is not empty |
/// | `omitempty` | skip remaining terms when the value is empty |
/// | `min`, `max`, `len` | size bounds |
/// | `gt`, `gte`, `lt`, `lte` | strict and inclusive size bounds |
/// | `eq`, `ne` | equality with the parameter |
/// | `oneof` | value is one of the space-separated options |
/// | `email`, `url`, `alphanum`, `numeric` | string formats |
/// | `contains` | substring, or array element |
///
/// Size is the number itself, the char count of a string, or the element
/// count of an array or object. `null` is empty and has size 0.
///
/// Evaluation stops at the first failing term, so each field yields at
/// most one failure.
///
/// # Example
///
/// ```rust
/// use scenegate::engine::{BasicRuleEngine, RuleEngine};
/// use serde_json::json;
///
/// let engine = BasicRuleEngine::new();
/// engine.register_alias("adult", "required,gte=18");
///
/// let failures = engine.validate_field(&json!(16), "adult").unwrap();
/// assert_eq!(failures[0].tag, "adult");
///
/// assert!(engine.validate_field(&json!(30), "adult").unwrap().is_empty());
/// ```
#[derive(Default)]
pub struct BasicRuleEngine {
    aliases: RwLock<HashMap<String, String>>,
    rules: RwLock<HashMap<String, CustomRule>>,
    struct_checks: RwLock<HashMap<String, StructCheck>>,
}

impl BasicRuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as shorthand for `expansion`.
    pub fn register_alias(&self, name: impl Into<String>, expansion: impl Into<String>) {
        self.aliases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), expansion.into());
    }

    /// Register a custom tag. Custom tags shadow built-in tags of the same name.
    pub fn register_rule<F>(&self, tag: impl Into<String>, rule: F)
    where
        F: Fn(&Value, &str) -> bool + Send + Sync + 'static,
    {
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tag.into(), Arc::new(rule));
    }

    /// Register a tag that matches string values against a regex.
    pub fn register_pattern(
        &self,
        tag: impl Into<String>,
        pattern: &str,
    ) -> Result<(), RuleEngineError> {
        let tag = tag.into();
        let regex = Regex::new(pattern).map_err(|e| RuleEngineError::InvalidParam {
            tag: tag.clone(),
            param: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.register_rule(tag, move |value, _| {
            value.as_str().is_some_and(|s| regex.is_match(s))
        });
        Ok(())
    }

    /// Register a whole-record check for records of type `T`.
    pub fn register_struct_check<T, F>(&self, check: F)
    where
        T: ?Sized + 'static,
        F: Fn(&Value) -> Vec<RuleFailure> + Send + Sync + 'static,
    {
        self.struct_checks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(std::any::type_name::<T>().to_string(), Arc::new(check));
    }

    fn alias(&self, tag: &str) -> Option<String> {
        self.aliases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .cloned()
    }

    fn custom_rule(&self, tag: &str) -> Option<CustomRule> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .cloned()
    }

    fn evaluate(
        &self,
        value: &Value,
        terms: &[Term<'_>],
        depth: usize,
    ) -> Result<Outcome, RuleEngineError> {
        for term in terms {
            if let Some(expansion) = self.alias(term.tag) {
                if depth >= MAX_ALIAS_DEPTH {
                    return Err(RuleEngineError::Malformed {
                        expression: expansion,
                        reason: format!("alias '{}' nests too deeply", term.tag),
                    });
                }
                let inner = parse_expression(&expansion)?;
                match self.evaluate(value, &inner, depth + 1)? {
                    Outcome::Pass => continue,
                    Outcome::Skip => return Ok(Outcome::Skip),
                    Outcome::Fail(failure) => {
                        return Ok(Outcome::Fail(
                            RuleFailure::new(term.tag, term.param_or_empty()).with_message(
                                format!("failed '{}' of alias '{}'", failure.tag, term.tag),
                            ),
                        ))
                    }
                }
            }

            if term.tag == "omitempty" {
                if is_empty(value) {
                    return Ok(Outcome::Skip);
                }
                continue;
            }

            if !self.check(term, value)? {
                return Ok(Outcome::Fail(RuleFailure::new(
                    term.tag,
                    term.param_or_empty(),
                )));
            }
        }
        Ok(Outcome::Pass)
    }

    fn check(&self, term: &Term<'_>, value: &Value) -> Result<bool, RuleEngineError> {
        if let Some(rule) = self.custom_rule(term.tag) {
            return Ok(rule(value, term.param_or_empty()));
        }
        builtin(term, value).unwrap_or_else(|| {
            Err(RuleEngineError::UnknownTag {
                tag: term.tag.to_string(),
            })
        })
    }
}

impl RuleEngine for BasicRuleEngine {
    fn validate_field(
        &self,
        value: &Value,
        expression: &str,
    ) -> Result<Vec<RuleFailure>, RuleEngineError> {
        let terms = parse_expression(expression)?;
        match self.evaluate(value, &terms, 0)? {
            Outcome::Fail(failure) => Ok(vec![failure]),
            Outcome::Pass | Outcome::Skip => Ok(Vec::new()),
        }
    }

    fn validate_struct(
        &self,
        type_name: &str,
        value: &Value,
    ) -> Result<Vec<RuleFailure>, RuleEngineError> {
        let check = self
            .struct_checks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_name)
            .cloned();
        Ok(check.map(|check| check(value)).unwrap_or_default())
    }
}

impl fmt::Debug for BasicRuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aliases = self.aliases.read().unwrap_or_else(PoisonError::into_inner);
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("BasicRuleEngine")
            .field("aliases", &aliases.keys().collect::<Vec<_>>())
            .field("rules", &rules.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Evaluate a built-in tag; `None` for tags this engine does not know.
fn builtin(term: &Term<'_>, value: &Value) -> Option<Result<bool, RuleEngineError>> {
    let tag = term.tag;
    let result = match tag {
        "required" => Ok(!is_empty(value)),
        "min" => compare_size(term, value, |size, bound| size >= bound),
        "max" => compare_size(term, value, |size, bound| size <= bound),
        "len" => compare_size(term, value, |size, bound| size == bound),
        "gt" => compare_size(term, value, |size, bound| size > bound),
        "gte" => compare_size(term, value, |size, bound| size >= bound),
        "lt" => compare_size(term, value, |size, bound| size < bound),
        "lte" => compare_size(term, value, |size, bound| size <= bound),
        "eq" => equals(term, value),
        "ne" => equals(term, value).map(|equal| !equal),
        "oneof" => one_of(term, value),
        "email" => string_check(term, value, |s| matches_pattern(&EMAIL_REGEX, s)),
        "url" => string_check(term, value, |s| matches_pattern(&URL_REGEX, s)),
        "alphanum" => string_check(term, value, |s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
        }),
        "numeric" => match value {
            Value::Number(_) => Ok(true),
            _ => string_check(term, value, |s| matches_pattern(&NUMERIC_REGEX, s)),
        },
        "contains" => contains(term, value),
        _ => return None,
    };
    Some(result)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn size(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        Value::Object(map) => Some(map.len() as f64),
        Value::Bool(_) => None,
    }
}

fn number_param(term: &Term<'_>) -> Result<f64, RuleEngineError> {
    let invalid = |reason: &str| RuleEngineError::InvalidParam {
        tag: term.tag.to_string(),
        param: term.param_or_empty().to_string(),
        reason: reason.to_string(),
    };
    let param = term.param.ok_or_else(|| invalid("missing parameter"))?;
    param.parse::<f64>().map_err(|_| invalid("expected a number"))
}

fn compare_size(
    term: &Term<'_>,
    value: &Value,
    compare: impl Fn(f64, f64) -> bool,
) -> Result<bool, RuleEngineError> {
    let bound = number_param(term)?;
    let size = size(value).ok_or_else(|| unsupported(term, value))?;
    Ok(compare(size, bound))
}

fn equals(term: &Term<'_>, value: &Value) -> Result<bool, RuleEngineError> {
    let param = term.param_or_empty();
    match value {
        Value::String(s) => Ok(s == param),
        Value::Null => Ok(param.is_empty()),
        Value::Bool(b) => param
            .parse::<bool>()
            .map(|p| p == *b)
            .map_err(|_| RuleEngineError::InvalidParam {
                tag: term.tag.to_string(),
                param: param.to_string(),
                reason: "expected true or false".to_string(),
            }),
        Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            let bound = number_param(term)?;
            let size = size(value).ok_or_else(|| unsupported(term, value))?;
            Ok(size == bound)
        }
    }
}

fn one_of(term: &Term<'_>, value: &Value) -> Result<bool, RuleEngineError> {
    let mut options = term.param_or_empty().split_whitespace();
    match value {
        Value::String(s) => Ok(options.any(|option| option == s)),
        Value::Number(n) => {
            let rendered = n.to_string();
            Ok(options.any(|option| option == rendered))
        }
        Value::Null => Ok(false),
        _ => Err(unsupported(term, value)),
    }
}

fn contains(term: &Term<'_>, value: &Value) -> Result<bool, RuleEngineError> {
    let needle = term.param_or_empty();
    match value {
        Value::String(s) => Ok(s.contains(needle)),
        Value::Array(items) => Ok(items.iter().any(|item| match item {
            Value::String(s) => s == needle,
            other => other.to_string() == needle,
        })),
        Value::Null => Ok(false),
        _ => Err(unsupported(term, value)),
    }
}

fn string_check(
    term: &Term<'_>,
    value: &Value,
    check: impl Fn(&str) -> bool,
) -> Result<bool, RuleEngineError> {
    match value {
        Value::String(s) => Ok(check(s)),
        Value::Null => Ok(false),
        _ => Err(unsupported(term, value)),
    }
}

fn matches_pattern(regex: &Option<Regex>, s: &str) -> bool {
    regex.as_ref().is_some_and(|regex| regex.is_match(s))
}

fn unsupported(term: &Term<'_>, value: &Value) -> RuleEngineError {
    RuleEngineError::Unsupported {
        tag: term.tag.to_string(),
        kind: value_kind(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failures(value: Value, expression: &str) -> Vec<String> {
        BasicRuleEngine::new()
            .validate_field(&value, expression)
            .unwrap()
            .into_iter()
            .map(|f| f.tag)
            .collect()
    }

    fn passes(value: Value, expression: &str) -> bool {
        failures(value, expression).is_empty()
    }

    #[test]
    fn required_rejects_empty_values() {
        assert!(!passes(json!(null), "required"));
        assert!(!passes(json!(""), "required"));
        assert!(!passes(json!([]), "required"));
        assert!(passes(json!(0), "required"));
        assert!(passes(json!(false), "required"));
        assert!(passes(json!("x"), "required"));
    }

    #[test]
    fn size_bounds_use_numbers_chars_and_lengths() {
        assert!(!passes(json!(16), "min=18"));
        assert!(passes(json!(18), "min=18"));
        assert!(passes(json!("héllo"), "len=5"));
        assert!(!passes(json!([1, 2, 3]), "max=2"));
        assert!(passes(json!({"a": 1}), "lte=1"));
        assert!(!passes(json!(null), "min=1"));
        assert!(passes(json!(5), "gt=4,lt=6"));
        assert!(!passes(json!(5), "gte=6"));
    }

    #[test]
    fn first_failing_term_is_reported() {
        assert_eq!(failures(json!(""), "required,min=3"), vec!["required"]);
        assert_eq!(failures(json!("ab"), "required,min=3,max=1"), vec!["min"]);
    }

    #[test]
    fn failure_carries_param() {
        let failures = BasicRuleEngine::new()
            .validate_field(&json!(3), "min=18")
            .unwrap();
        assert_eq!(failures[0].param, "18");
        assert!(failures[0].field.is_none());
    }

    #[test]
    fn omitempty_skips_remaining_terms() {
        assert!(passes(json!(null), "omitempty,email"));
        assert!(passes(json!(""), "omitempty,min=3"));
        assert!(!passes(json!("ab"), "omitempty,min=3"));
    }

    #[test]
    fn equality_and_options() {
        assert!(passes(json!("admin"), "eq=admin"));
        assert!(passes(json!("user"), "ne=admin"));
        assert!(passes(json!(true), "eq=true"));
        assert!(passes(json!(3), "eq=3"));
        assert!(passes(json!("green"), "oneof=red green blue"));
        assert!(!passes(json!("pink"), "oneof=red green blue"));
        assert!(passes(json!(2), "oneof=1 2 3"));
    }

    #[test]
    fn string_formats() {
        assert!(passes(json!("ada@example.com"), "email"));
        assert!(!passes(json!("not-an-email"), "email"));
        assert!(passes(json!("https://example.com/a"), "url"));
        assert!(!passes(json!("example.com"), "url"));
        assert!(passes(json!("abc123"), "alphanum"));
        assert!(!passes(json!("abc-123"), "alphanum"));
        assert!(passes(json!("-12.5"), "numeric"));
        assert!(passes(json!(12), "numeric"));
        assert!(!passes(json!("12a"), "numeric"));
    }

    #[test]
    fn contains_checks_strings_and_arrays() {
        assert!(passes(json!("hello world"), "contains=world"));
        assert!(passes(json!(["a", "b"]), "contains=b"));
        assert!(!passes(json!(["a", "b"]), "contains=c"));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let result = BasicRuleEngine::new().validate_field(&json!(1), "bogus");
        assert_eq!(
            result,
            Err(RuleEngineError::UnknownTag {
                tag: "bogus".to_string()
            })
        );
    }

    #[test]
    fn bad_param_is_an_error() {
        let engine = BasicRuleEngine::new();
        assert!(matches!(
            engine.validate_field(&json!(1), "min=abc"),
            Err(RuleEngineError::InvalidParam { .. })
        ));
        assert!(matches!(
            engine.validate_field(&json!(1), "min"),
            Err(RuleEngineError::InvalidParam { .. })
        ));
        assert!(matches!(
            engine.validate_field(&json!(true), "email"),
            Err(RuleEngineError::Unsupported { .. })
        ));
    }

    #[test]
    fn custom_rule_receives_param() {
        let engine = BasicRuleEngine::new();
        engine.register_rule("prefix", |value, param| {
            value.as_str().is_some_and(|s| s.starts_with(param))
        });

        assert!(engine
            .validate_field(&json!("SKU-1"), "prefix=SKU")
            .unwrap()
            .is_empty());
        assert_eq!(
            engine.validate_field(&json!("X-1"), "prefix=SKU").unwrap()[0].tag,
            "prefix"
        );
    }

    #[test]
    fn pattern_rule_compiles_regex() {
        let engine = BasicRuleEngine::new();
        engine.register_pattern("hexcolor", r"^#[0-9a-fA-F]{6}$").unwrap();

        assert!(engine
            .validate_field(&json!("#a0b1c2"), "hexcolor")
            .unwrap()
            .is_empty());
        assert!(!engine
            .validate_field(&json!("red"), "hexcolor")
            .unwrap()
            .is_empty());
        assert!(engine.register_pattern("broken", "(").is_err());
    }

    #[test]
    fn self_referencing_alias_is_rejected() {
        let engine = BasicRuleEngine::new();
        engine.register_alias("loop", "loop");

        assert!(matches!(
            engine.validate_field(&json!(1), "loop"),
            Err(RuleEngineError::Malformed { .. })
        ));
    }

    #[test]
    fn struct_checks_are_keyed_by_type() {
        struct Order;

        let engine = BasicRuleEngine::new();
        engine.register_struct_check::<Order, _>(|value| {
            if value["total"].as_u64() == Some(0) {
                vec![RuleFailure::new("gt", "0").on_field("total")]
            } else {
                Vec::new()
            }
        });

        let name = std::any::type_name::<Order>();
        let failures = engine.validate_struct(name, &json!({"total": 0})).unwrap();
        assert_eq!(failures[0].field.as_deref(), Some("total"));
        assert!(engine
            .validate_struct("other::Type", &json!({"total": 0}))
            .unwrap()
            .is_empty());
    }
}
