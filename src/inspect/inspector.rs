//! Type inspection and the per-type metadata cache.

use super::record::{NestedGetter, Record, Schema, Validatable, ValueGetter};
use crate::core::RuleSet;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

static GLOBAL: Lazy<Arc<TypeInspector>> = Lazy::new(|| Arc::new(TypeInspector::new()));

/// Optional capabilities a record type implements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub rule_provider: bool,
    pub business_validator: bool,
    pub lifecycle_hooks: bool,
}

/// Precompiled reader for one declared field.
///
/// Captures the field's declaration index and a type-erased closure; no
/// name lookup happens when reading.
#[derive(Clone)]
pub struct FieldAccessor {
    name: String,
    alias: Option<String>,
    index: usize,
    get: ValueGetter,
}

impl FieldAccessor {
    /// Read the field from `record`.
    ///
    /// Returns `None` when `record` is not an instance of the owning type.
    pub fn get(&self, record: &dyn Any) -> Option<Value> {
        (self.get)(record)
    }

    /// Declared (non-alias) field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("index", &self.index)
            .finish()
    }
}

/// Precompiled reader for a nested record.
#[derive(Clone)]
pub struct NestedAccessor {
    name: String,
    get: NestedGetter,
}

impl NestedAccessor {
    pub fn get<'a>(&self, record: &'a dyn Any) -> Option<&'a dyn Validatable> {
        (self.get)(record)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for NestedAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedAccessor")
            .field("name", &self.name)
            .finish()
    }
}

/// Cached, immutable description of one record type.
#[derive(Debug)]
pub struct TypeMetadata {
    type_id: TypeId,
    type_name: &'static str,
    short_name: String,
    capabilities: Capabilities,
    rule_set: Option<RuleSet>,
    accessors: HashMap<String, FieldAccessor>,
    nested: Vec<NestedAccessor>,
    dead_fields: Vec<String>,
}

impl TypeMetadata {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Last path segment of the type name, used as the namespace root.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn rule_set(&self) -> Option<&RuleSet> {
        self.rule_set.as_ref()
    }

    /// Compiled accessor for a field, by declared name or alias.
    pub fn accessor(&self, field: &str) -> Option<&FieldAccessor> {
        self.accessors.get(field)
    }

    /// Number of names (declared and alias) with a compiled accessor.
    pub fn accessor_count(&self) -> usize {
        self.accessors.len()
    }

    /// Nested records in declaration order.
    pub fn nested(&self) -> &[NestedAccessor] {
        &self.nested
    }

    /// Rule fields that matched no declared field or alias.
    pub fn dead_fields(&self) -> &[String] {
        &self.dead_fields
    }
}

/// Reflects over record types once and caches the result.
///
/// The cache is read-mostly: lookups take a shared read lock so any number
/// of threads can hit it concurrently, and the write lock is only taken to
/// insert a freshly built entry. Two threads racing on the first encounter
/// of a type may both build metadata; the first insert wins and every
/// caller observes that same `Arc`.
///
/// # Example
///
/// ```rust
/// use scenegate::inspect::{Record, TypeInspector};
/// use serde::Serialize;
/// use std::sync::Arc;
///
/// #[derive(Serialize)]
/// struct Order {
///     total: u64,
/// }
///
/// impl Record for Order {}
///
/// let inspector = TypeInspector::new();
/// let first = inspector.inspect(&Order { total: 1 });
/// let second = inspector.inspect(&Order { total: 2 });
///
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug, Default)]
pub struct TypeInspector {
    cache: RwLock<HashMap<TypeId, Arc<TypeMetadata>>>,
}

impl TypeInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide shared inspector.
    pub fn global() -> Arc<TypeInspector> {
        Arc::clone(&GLOBAL)
    }

    /// Resolve metadata for `record`'s type, building it on first encounter.
    pub fn inspect<T: Record>(&self, record: &T) -> Arc<TypeMetadata> {
        let type_id = TypeId::of::<T>();

        let cached = self.get(type_id);
        if let Some(metadata) = cached {
            return metadata;
        }

        let built = Arc::new(build_metadata(record));
        debug!(
            type_name = built.type_name,
            accessors = built.accessors.len(),
            dead_fields = built.dead_fields.len(),
            "type metadata built"
        );

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(type_id).or_insert(built))
    }

    /// Inspect an optional type-erased record.
    ///
    /// Returns `None` when there is no record to inspect.
    pub fn inspect_dyn(&self, record: Option<&dyn Validatable>) -> Option<Arc<TypeMetadata>> {
        record.map(|r| r.inspect_with(self))
    }

    /// Cached metadata for a type, without building it.
    pub fn get(&self, type_id: TypeId) -> Option<Arc<TypeMetadata>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn build_metadata<T: Record>(record: &T) -> TypeMetadata {
    let mut schema = Schema::<T>::new();
    T::schema(&mut schema);
    let rule_set = T::rule_set();

    let capabilities = Capabilities {
        rule_provider: rule_set.is_some(),
        business_validator: record.as_business_validator().is_some(),
        lifecycle_hooks: record.as_lifecycle_hooks().is_some(),
    };

    let type_name = std::any::type_name::<T>();
    let mut accessors = HashMap::new();
    let mut dead_fields = Vec::new();

    if let Some(rules) = &rule_set {
        for field in rules.referenced_fields() {
            match compile_accessor(&schema, field) {
                Some(accessor) => {
                    if let Some(alias) = &accessor.alias {
                        accessors.insert(alias.clone(), accessor.clone());
                    }
                    accessors.insert(accessor.name.clone(), accessor);
                }
                None => {
                    debug!(type_name, field, "rule references an undeclared field");
                    dead_fields.push(field.to_string());
                }
            }
        }
    }

    let nested = schema
        .nested
        .iter()
        .map(|decl| NestedAccessor {
            name: decl.name.clone(),
            get: Arc::clone(&decl.get),
        })
        .collect();

    TypeMetadata {
        type_id: TypeId::of::<T>(),
        type_name,
        short_name: short_type_name(type_name).to_string(),
        capabilities,
        rule_set,
        accessors,
        nested,
        dead_fields,
    }
}

/// Resolve `field` against the schema, exact names before aliases.
fn compile_accessor<T: Record>(schema: &Schema<T>, field: &str) -> Option<FieldAccessor> {
    let declared = schema
        .fields
        .iter()
        .map(|d| (&d.name, &d.alias, d.index, &d.get))
        .chain(
            schema
                .nested
                .iter()
                .map(|d| (&d.name, &d.alias, d.index, &d.value)),
        );

    let mut by_alias = None;
    for (name, alias, index, get) in declared {
        let accessor = || FieldAccessor {
            name: name.clone(),
            alias: alias.clone(),
            index,
            get: Arc::clone(get),
        };
        if name == field {
            return Some(accessor());
        }
        if by_alias.is_none() && alias.as_deref() == Some(field) {
            by_alias = Some(accessor());
        }
    }
    by_alias
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
