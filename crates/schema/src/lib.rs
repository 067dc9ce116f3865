//! Composed supergraph schema model consumed by the fusegraph planner.
//!
//! The schema this crate produces is already the result of composition: every
//! type carries its owning service and key field sets, every field its
//! resolving service and `@requires`/`@provides`/`@external` annotations.
//! Composition itself happens upstream; here we only parse the annotated SDL
//! and check it for internal consistency.

mod composed_schema;
mod error;
mod type_ext;
mod value_ext;

pub use composed_schema::{
    ComposedSchema,
    KeyFields,
    MetaField,
    MetaInputValue,
    MetaType,
    TypeKind,
};
pub use error::{SchemaError, SchemaIssue};
pub use type_ext::TypeExt;
pub use value_ext::ValueExt;
