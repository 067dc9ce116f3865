use parser::types::{BaseType, Type};

/// Convenience accessors for wrapped GraphQL types.
pub trait TypeExt {
    /// The named type once all list and non-null wrappers are removed.
    fn concrete_typename(&self) -> &str;

    /// Whether the outermost wrapper (ignoring non-null) is a list.
    fn is_list(&self) -> bool;
}

impl TypeExt for Type {
    fn concrete_typename(&self) -> &str {
        match &self.base {
            BaseType::Named(name) => name.as_str(),
            BaseType::List(ty) => ty.concrete_typename(),
        }
    }

    fn is_list(&self) -> bool {
        matches!(self.base, BaseType::List(_))
    }
}
