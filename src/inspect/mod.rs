//! Record inspection.
//!
//! The inspector turns a record type into cached [`TypeMetadata`]:
//! which capabilities the type implements, its rule set, and a table of
//! precompiled field accessors keyed by field name and alias. The table is
//! built once per type and reused by every validation call.

mod inspector;
mod record;

pub use inspector::{Capabilities, FieldAccessor, NestedAccessor, TypeInspector, TypeMetadata};
pub use record::{BusinessValidator, HookError, LifecycleHooks, Record, Schema, Validatable};
