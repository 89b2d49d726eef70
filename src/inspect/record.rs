//! Record capabilities and field declarations.
//!
//! Every type validated by the engine implements [`Record`]. The trait is
//! the single place where a type states what it offers:
//! - a [`Schema`] of readable fields (the accessor table source)
//! - an optional [`RuleSet`]
//! - optional [`BusinessValidator`] and [`LifecycleHooks`] capabilities
//!
//! The engine only ever handles records through the object-safe
//! [`Validatable`] view, which is implemented for every `Record`.

use crate::collector::ErrorCollector;
use crate::context::ValidationContext;
use crate::core::{RuleSet, Scene};
use crate::inspect::inspector::{TypeInspector, TypeMetadata};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// Error returned by a lifecycle hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased value reader for one declared field.
pub(crate) type ValueGetter = Arc<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;

/// Type-erased reader for one nested record.
pub(crate) type NestedGetter =
    Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Validatable> + Send + Sync>;

/// Business-level checks a record runs against itself.
///
/// Used for cross-field rules and checks that need more than a single
/// field value. Implementations add their own [`FieldError`]s to the
/// collector and should stop once [`ErrorCollector::add`] returns false.
///
/// [`FieldError`]: crate::core::FieldError
pub trait BusinessValidator {
    fn validate_business(&self, scene: Scene, collector: &dyn ErrorCollector);
}

/// Hooks run around a top-level validation call.
///
/// An error from either hook aborts the call with
/// [`ValidationError::Hook`](crate::validator::ValidationError::Hook).
pub trait LifecycleHooks {
    fn before_validation(&self, _ctx: &ValidationContext) -> Result<(), HookError> {
        Ok(())
    }

    fn after_validation(&self, _ctx: &ValidationContext) -> Result<(), HookError> {
        Ok(())
    }
}

/// A record type the engine can validate.
///
/// Capability methods are resolved once per type by the
/// [`TypeInspector`] and cached; they must therefore answer the same way
/// for every instance of the type.
///
/// # Example
///
/// ```rust
/// use scenegate::core::{RuleSet, Scene};
/// use scenegate::inspect::{Record, Schema};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User {
///     name: String,
///     #[serde(rename = "user_age")]
///     age: u32,
/// }
///
/// impl Record for User {
///     fn schema(schema: &mut Schema<Self>) {
///         schema
///             .field("name", |u: &User| u.name.clone())
///             .field_as("age", "user_age", |u: &User| u.age);
///     }
///
///     fn rule_set() -> Option<RuleSet> {
///         Some(RuleSet::new().rule(Scene::CREATE, "age", "min=18"))
///     }
/// }
/// ```
pub trait Record: Serialize + Send + Sync + Sized + 'static {
    /// Declare the fields that compiled accessors can read.
    ///
    /// Fields left undeclared are still reachable through the slower
    /// serde-based lookup.
    fn schema(_schema: &mut Schema<Self>) {}

    /// Scene-keyed rules for this type, if it provides any.
    fn rule_set() -> Option<RuleSet> {
        None
    }

    fn as_business_validator(&self) -> Option<&dyn BusinessValidator> {
        None
    }

    fn as_lifecycle_hooks(&self) -> Option<&dyn LifecycleHooks> {
        None
    }
}

pub(crate) struct FieldDecl {
    pub(crate) name: String,
    pub(crate) alias: Option<String>,
    pub(crate) index: usize,
    pub(crate) get: ValueGetter,
}

pub(crate) struct NestedDecl {
    pub(crate) name: String,
    pub(crate) alias: Option<String>,
    pub(crate) index: usize,
    pub(crate) get: NestedGetter,
    pub(crate) value: ValueGetter,
}

/// Declared readable fields of a record type.
///
/// Accessors must return owned values; they are serialized to
/// [`serde_json::Value`] when a rule needs them.
pub struct Schema<T> {
    pub(crate) fields: Vec<FieldDecl>,
    pub(crate) nested: Vec<NestedDecl>,
    next_index: usize,
    _record: PhantomData<fn(&T)>,
}

impl<T: Record> Schema<T> {
    pub(crate) fn new() -> Self {
        Self {
            fields: Vec::new(),
            nested: Vec::new(),
            next_index: 0,
            _record: PhantomData,
        }
    }

    /// Declare a field readable under its logical name.
    pub fn field<V, F>(&mut self, name: &str, accessor: F) -> &mut Self
    where
        V: Serialize,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.push_field(name, None, accessor)
    }

    /// Declare a field readable under its logical name and a serialization alias.
    pub fn field_as<V, F>(&mut self, name: &str, alias: &str, accessor: F) -> &mut Self
    where
        V: Serialize,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.push_field(name, Some(alias), accessor)
    }

    /// Declare a nested record the rule strategy descends into.
    ///
    /// The nested field is also readable as a value: an absent child reads
    /// as `null`.
    pub fn nested<U, F>(&mut self, name: &str, accessor: F) -> &mut Self
    where
        U: Record,
        F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        self.push_nested(name, None, accessor)
    }

    /// Declare a nested record with a serialization alias.
    pub fn nested_as<U, F>(&mut self, name: &str, alias: &str, accessor: F) -> &mut Self
    where
        U: Record,
        F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        self.push_nested(name, Some(alias), accessor)
    }

    fn push_field<V, F>(&mut self, name: &str, alias: Option<&str>, accessor: F) -> &mut Self
    where
        V: Serialize,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let get: ValueGetter = Arc::new(move |any: &dyn Any| {
            any.downcast_ref::<T>()
                .and_then(|record| serde_json::to_value(accessor(record)).ok())
        });
        let index = self.take_index();
        self.fields.push(FieldDecl {
            name: name.to_string(),
            alias: alias.map(str::to_string),
            index,
            get,
        });
        self
    }

    fn push_nested<U, F>(&mut self, name: &str, alias: Option<&str>, accessor: F) -> &mut Self
    where
        U: Record,
        F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        let accessor = Arc::new(accessor);

        let child = Arc::clone(&accessor);
        let get = nested_getter(move |any| {
            any.downcast_ref::<T>()
                .and_then(|record| child(record))
                .map(|u| u as &dyn Validatable)
        });

        let value: ValueGetter = Arc::new(move |any: &dyn Any| {
            any.downcast_ref::<T>().map(|record| {
                accessor(record)
                    .and_then(|u| serde_json::to_value(u).ok())
                    .unwrap_or(Value::Null)
            })
        });

        let index = self.take_index();
        self.nested.push(NestedDecl {
            name: name.to_string(),
            alias: alias.map(str::to_string),
            index,
            get,
            value,
        });
        self
    }

    fn take_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Number of declared fields, nested records included.
    pub fn len(&self) -> usize {
        self.fields.len() + self.nested.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn nested_getter<F>(f: F) -> NestedGetter
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Validatable> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Object-safe view of a [`Record`] used throughout the engine.
pub trait Validatable: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Full Rust type name.
    fn type_name(&self) -> &'static str;

    /// Resolve (and cache) this record's type metadata.
    fn inspect_with(&self, inspector: &TypeInspector) -> Arc<TypeMetadata>;

    /// Whole record as a JSON value.
    fn to_value(&self) -> Option<Value>;

    /// Read a field by its serialized name.
    ///
    /// Serializes the whole record, so it is much slower than a compiled
    /// accessor. Used only when no accessor was compiled for the field.
    /// A key the serialized object leaves out (a skipped `None`, say) reads
    /// as `Value::Null`; `None` means the record is not an object at all.
    fn lookup_field(&self, name: &str) -> Option<Value> {
        match self.to_value()? {
            Value::Object(mut map) => Some(map.remove(name).unwrap_or(Value::Null)),
            _ => None,
        }
    }

    fn business_validator(&self) -> Option<&dyn BusinessValidator>;

    fn lifecycle_hooks(&self) -> Option<&dyn LifecycleHooks>;
}

impl<T: Record> Validatable for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn inspect_with(&self, inspector: &TypeInspector) -> Arc<TypeMetadata> {
        inspector.inspect(self)
    }

    fn to_value(&self) -> Option<Value> {
        serde_json::to_value(self).ok()
    }

    fn business_validator(&self) -> Option<&dyn BusinessValidator> {
        self.as_business_validator()
    }

    fn lifecycle_hooks(&self) -> Option<&dyn LifecycleHooks> {
        self.as_lifecycle_hooks()
    }
}
