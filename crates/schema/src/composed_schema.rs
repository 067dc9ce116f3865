use std::ops::Deref;

use indexmap::{IndexMap, IndexSet};
use parser::{
    types::{
        self,
        DocumentOperations,
        EnumType,
        InputObjectType,
        InterfaceType,
        ObjectType,
        Selection,
        SelectionSet,
        ServiceDocument,
        Type,
        TypeDefinition,
        TypeSystemDefinition,
        UnionType,
    },
    Positioned,
};
use value::{ConstValue, Name};

use crate::{error::SchemaIssue, type_ext::TypeExt, SchemaError};

/// Kind of a type in the composed schema.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

/// An ordered, possibly nested set of field names, as written in the `fields`
/// argument of `@key`, `@requires` and `@provides`.
#[derive(Debug, Eq, PartialEq)]
pub struct KeyFields(IndexMap<Name, KeyFields>);

impl Deref for KeyFields {
    type Target = IndexMap<Name, KeyFields>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A field of a composite type, annotated with federation metadata.
#[derive(Debug, Eq, PartialEq)]
pub struct MetaField {
    pub name: Name,
    pub arguments: IndexMap<Name, MetaInputValue>,
    pub ty: Type,

    /// Service that resolves this field, when it differs from the owner of the
    /// enclosing type.
    pub service: Option<String>,
    /// Sibling fields that must be fetched from the parent's owner and passed
    /// along with the entity representation before this field can resolve.
    pub requires: Option<KeyFields>,
    /// Fields on the return type that this field's service returns inline,
    /// sparing the planner a hop for them.
    pub provides: Option<KeyFields>,
    /// The field is declared here for reference only; another service owns it.
    pub external: bool,
}

#[derive(Debug, Eq, PartialEq)]
pub struct MetaInputValue {
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<ConstValue>,
}

/// A type of the composed schema together with its federation metadata.
#[derive(Debug, Eq, PartialEq)]
pub struct MetaType {
    pub name: Name,
    pub kind: TypeKind,
    /// Service that owns the type; `None` for value types shared by all
    /// services.
    pub owner: Option<String>,
    /// Key field sets per declaring service, in declaration order.
    pub keys: IndexMap<String, Vec<KeyFields>>,

    pub implements: IndexSet<Name>,
    pub fields: IndexMap<Name, MetaField>,
    pub possible_types: IndexSet<Name>,
    pub enum_values: IndexSet<Name>,
    pub input_fields: IndexMap<Name, MetaInputValue>,
}

impl MetaType {
    #[inline]
    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields.get(name)
    }

    /// A type is an entity when at least one service declared a key for it.
    #[inline]
    pub fn is_entity(&self) -> bool {
        !self.keys.is_empty()
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(self.kind, TypeKind::Object | TypeKind::Interface | TypeKind::Union)
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Union)
    }

    #[inline]
    pub fn is_possible_type(&self, type_name: &str) -> bool {
        match self.kind {
            TypeKind::Interface | TypeKind::Union => self.possible_types.contains(type_name),
            TypeKind::Object => self.name == type_name,
            _ => false,
        }
    }

    /// Whether `field_name` appears in any key field set of this type.
    pub fn is_key_field(&self, field_name: &str) -> bool {
        self.keys
            .values()
            .flatten()
            .any(|key| key.contains_key(field_name))
    }

    /// Key field sets declared by `service`, in declaration order.
    pub fn keys_for_service(&self, service: &str) -> &[KeyFields] {
        self.keys.get(service).map(Vec::as_slice).unwrap_or_default()
    }
}

/// A composed supergraph schema.
///
/// The document this is parsed from already carries the result of
/// composition: `@owner(service:)` and `@key(fields:, service:)` on types,
/// `@resolve(service:)`, `@requires(fields:)`, `@provides(fields:)` and
/// `@external` on fields.
#[derive(Debug, Default)]
pub struct ComposedSchema {
    pub query_type: Option<Name>,
    pub mutation_type: Option<Name>,
    pub subscription_type: Option<Name>,
    pub types: IndexMap<Name, MetaType>,
}

impl ComposedSchema {
    pub fn parse(document: &str) -> Result<ComposedSchema, SchemaError> {
        Self::new(parser::parse_schema(document)?)
    }

    pub fn new(document: ServiceDocument) -> Result<ComposedSchema, SchemaError> {
        let mut schema = ComposedSchema::default();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema_definition) => {
                    schema.query_type = schema_definition.node.query.map(|name| name.node);
                    schema.mutation_type = schema_definition.node.mutation.map(|name| name.node);
                    schema.subscription_type = schema_definition.node.subscription.map(|name| name.node);
                }
                TypeSystemDefinition::Type(type_definition) => {
                    let meta_type = convert_type_definition(type_definition.node);
                    schema.types.insert(meta_type.name.clone(), meta_type);
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        finish_schema(&mut schema);

        let issues = validate_schema(&schema);
        if !issues.is_empty() {
            return Err(SchemaError::Validation(issues));
        }

        Ok(schema)
    }

    #[inline]
    pub fn query_type(&self) -> &str {
        self.query_type.as_ref().map(Name::as_str).unwrap_or("Query")
    }

    #[inline]
    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type
            .as_ref()
            .map(Name::as_str)
            .or_else(|| self.types.contains_key("Mutation").then_some("Mutation"))
    }

    #[inline]
    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type
            .as_ref()
            .map(Name::as_str)
            .or_else(|| self.types.contains_key("Subscription").then_some("Subscription"))
    }

    /// The type behind all list and non-null wrappers of `ty`.
    #[inline]
    pub fn concrete_type(&self, ty: &Type) -> Option<&MetaType> {
        self.types.get(ty.concrete_typename())
    }

    #[inline]
    pub fn type_by_name(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    /// Whether a root type field is a root-level meta field.
    pub fn is_meta_field(name: &str) -> bool {
        name == "__typename" || name == "__schema" || name == "__type"
    }
}

fn get_argument_str<'a>(
    arguments: &'a [(Positioned<Name>, Positioned<ConstValue>)],
    name: &str,
) -> Option<&'a str> {
    arguments.iter().find_map(|(arg_name, value)| {
        if arg_name.node.as_str() == name {
            match &value.node {
                ConstValue::String(s) => Some(s.as_str()),
                _ => None,
            }
        } else {
            None
        }
    })
}

fn parse_field_set(fields: &str) -> Option<KeyFields> {
    parser::parse_query(format!("{{{}}}", fields))
        .ok()
        .and_then(|document| match document.operations {
            DocumentOperations::Single(op) => Some(convert_key_fields(op.node.selection_set.node)),
            DocumentOperations::Multiple(_) => None,
        })
}

fn convert_key_fields(selection_set: SelectionSet) -> KeyFields {
    KeyFields(
        selection_set
            .items
            .into_iter()
            .filter_map(|selection| {
                if let Selection::Field(field) = selection.node {
                    Some((field.node.name.node, convert_key_fields(field.node.selection_set.node)))
                } else {
                    None
                }
            })
            .collect(),
    )
}

fn convert_type_definition(definition: TypeDefinition) -> MetaType {
    let mut meta_type = MetaType {
        name: definition.name.node.clone(),
        kind: TypeKind::Scalar,
        owner: None,
        keys: Default::default(),
        implements: Default::default(),
        fields: Default::default(),
        possible_types: Default::default(),
        enum_values: Default::default(),
        input_fields: Default::default(),
    };

    match definition.kind {
        types::TypeKind::Scalar => meta_type.kind = TypeKind::Scalar,
        types::TypeKind::Object(ObjectType { implements, fields }) => {
            meta_type.kind = TypeKind::Object;
            meta_type.implements = implements.into_iter().map(|name| name.node).collect();
            meta_type.fields = fields
                .into_iter()
                .map(|field| (field.node.name.node.clone(), convert_field_definition(field.node)))
                .collect();
        }
        types::TypeKind::Interface(InterfaceType { implements, fields }) => {
            meta_type.kind = TypeKind::Interface;
            meta_type.implements = implements.into_iter().map(|name| name.node).collect();
            meta_type.fields = fields
                .into_iter()
                .map(|field| (field.node.name.node.clone(), convert_field_definition(field.node)))
                .collect();
        }
        types::TypeKind::Union(UnionType { members }) => {
            meta_type.kind = TypeKind::Union;
            meta_type.possible_types = members.into_iter().map(|name| name.node).collect();
        }
        types::TypeKind::Enum(EnumType { values }) => {
            meta_type.kind = TypeKind::Enum;
            meta_type.enum_values = values.into_iter().map(|value| value.node.value.node).collect();
        }
        types::TypeKind::InputObject(InputObjectType { fields }) => {
            meta_type.kind = TypeKind::InputObject;
            meta_type.input_fields = fields
                .into_iter()
                .map(|field| (field.node.name.node.clone(), convert_input_value_definition(field.node)))
                .collect();
        }
    }

    for directive in definition.directives {
        match directive.node.name.node.as_str() {
            "owner" => {
                if let Some(service) = get_argument_str(&directive.node.arguments, "service") {
                    meta_type.owner = Some(service.to_string());
                }
            }
            "key" => {
                if let Some((fields, service)) = get_argument_str(&directive.node.arguments, "fields")
                    .zip(get_argument_str(&directive.node.arguments, "service"))
                {
                    if let Some(key_fields) = parse_field_set(fields) {
                        meta_type.keys.entry(service.to_string()).or_default().push(key_fields);
                    }
                }
            }
            _ => {}
        }
    }

    meta_type
}

fn convert_field_definition(definition: types::FieldDefinition) -> MetaField {
    let mut meta_field = MetaField {
        name: definition.name.node,
        arguments: definition
            .arguments
            .into_iter()
            .map(|arg| (arg.node.name.node.clone(), convert_input_value_definition(arg.node)))
            .collect(),
        ty: definition.ty.node,
        service: None,
        requires: None,
        provides: None,
        external: false,
    };

    for directive in definition.directives {
        match directive.node.name.node.as_str() {
            "resolve" => {
                if let Some(service) = get_argument_str(&directive.node.arguments, "service") {
                    meta_field.service = Some(service.to_string());
                }
            }
            "requires" => {
                if let Some(fields) = get_argument_str(&directive.node.arguments, "fields") {
                    meta_field.requires = parse_field_set(fields);
                }
            }
            "provides" => {
                if let Some(fields) = get_argument_str(&directive.node.arguments, "fields") {
                    meta_field.provides = parse_field_set(fields);
                }
            }
            "external" => meta_field.external = true,
            _ => {}
        }
    }

    meta_field
}

fn convert_input_value_definition(definition: types::InputValueDefinition) -> MetaInputValue {
    MetaInputValue {
        name: definition.name.node,
        ty: definition.ty.node,
        default_value: definition.default_value.map(|value| value.node),
    }
}

fn finish_schema(schema: &mut ComposedSchema) {
    for definition in parser::parse_schema(include_str!("builtin.graphql"))
        .expect("builtin schema must parse")
        .definitions
    {
        if let TypeSystemDefinition::Type(type_definition) = definition {
            let meta_type = convert_type_definition(type_definition.node);
            schema.types.insert(meta_type.name.clone(), meta_type);
        }
    }

    let query_type = schema.query_type().to_string();
    if let Some(query_type) = schema.types.get_mut(query_type.as_str()) {
        let name = Name::new("__type");
        query_type.fields.insert(name.clone(), MetaField {
            name,
            arguments: {
                let mut arguments = IndexMap::new();
                let name = Name::new("name");
                arguments.insert(name.clone(), MetaInputValue {
                    name,
                    ty: Type::new("String!").unwrap(),
                    default_value: None,
                });
                arguments
            },
            ty: Type::new("__Type").unwrap(),
            service: None,
            requires: None,
            provides: None,
            external: false,
        });

        let name = Name::new("__schema");
        query_type.fields.insert(name.clone(), MetaField {
            name,
            arguments: Default::default(),
            ty: Type::new("__Schema!").unwrap(),
            service: None,
            requires: None,
            provides: None,
            external: false,
        });
    }

    let mut possible_types: IndexMap<Name, IndexSet<Name>> = Default::default();
    for ty in schema.types.values() {
        if ty.kind == TypeKind::Object {
            for implement in &ty.implements {
                possible_types
                    .entry(implement.clone())
                    .or_default()
                    .insert(ty.name.clone());
            }
        }
    }
    for (name, types) in possible_types {
        if let Some(ty) = schema.types.get_mut(&name) {
            ty.possible_types.extend(types);
        }
    }
}

fn validate_schema(schema: &ComposedSchema) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();

    let root_types = [
        Some(schema.query_type()),
        schema.mutation_type(),
        schema.subscription_type(),
    ];

    for ty in schema.types.values() {
        if ty.name.starts_with("__") {
            continue;
        }

        let is_root = root_types.iter().flatten().any(|name| *name == ty.name.as_str());

        if !ty.keys.is_empty() && !matches!(ty.kind, TypeKind::Object | TypeKind::Interface) {
            issues.push(SchemaIssue::InvalidKeyLocation {
                kind: match ty.kind {
                    TypeKind::Scalar => "scalar",
                    TypeKind::Union => "union",
                    TypeKind::Enum => "enum",
                    TypeKind::InputObject => "input object",
                    _ => unreachable!(),
                },
                type_name: ty.name.to_string(),
            });
        }

        for keys in ty.keys.values().flatten() {
            check_field_set(schema, ty, keys, "key", &mut issues);
        }

        for field in ty.fields.values() {
            if field.name.starts_with("__") {
                continue;
            }

            if is_root && field.service.is_none() {
                issues.push(SchemaIssue::MissingOwner {
                    type_name: ty.name.to_string(),
                    field_name: field.name.to_string(),
                });
            }

            if field.external && ty.owner.is_none() {
                issues.push(SchemaIssue::ExternalWithoutOwner {
                    type_name: ty.name.to_string(),
                    field_name: field.name.to_string(),
                });
            }

            if !is_root
                && ty.is_entity()
                && !field.external
                && field.service.is_none()
                && ty.owner.is_none()
                && !ty.is_key_field(&field.name)
            {
                issues.push(SchemaIssue::MissingOwner {
                    type_name: ty.name.to_string(),
                    field_name: field.name.to_string(),
                });
            }

            if let Some(requires) = &field.requires {
                check_field_set(schema, ty, requires, "requires", &mut issues);
            }
            if let Some(provides) = &field.provides {
                if let Some(return_type) = schema.concrete_type(&field.ty) {
                    check_field_set(schema, return_type, provides, "provides", &mut issues);
                }
            }
        }
    }

    issues
}

fn check_field_set(
    schema: &ComposedSchema,
    ty: &MetaType,
    fields: &KeyFields,
    directive: &'static str,
    issues: &mut Vec<SchemaIssue>,
) {
    for (name, children) in fields.iter() {
        match ty.field_by_name(name) {
            Some(field) => {
                if !children.is_empty() {
                    if let Some(field_type) = schema.concrete_type(&field.ty) {
                        check_field_set(schema, field_type, children, directive, issues);
                    }
                }
            }
            None => issues.push(SchemaIssue::UnknownFieldInFieldSet {
                directive,
                type_name: ty.name.to_string(),
                field_name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_keys_keep_declaration_order() {
        let schema = ComposedSchema::parse(
            r#"
            schema { query: Query }
            type Query {
                user(id: ID!): User @resolve(service: "accounts")
            }
            type User
                @owner(service: "accounts")
                @key(fields: "id", service: "accounts")
                @key(fields: "email", service: "accounts")
                @key(fields: "id", service: "reviews")
            {
                id: ID!
                email: String!
            }
            "#,
        )
        .unwrap();

        let user = schema.type_by_name("User").unwrap();
        let accounts_keys = user.keys_for_service("accounts");
        assert_eq!(accounts_keys.len(), 2);
        assert!(accounts_keys[0].contains_key("id"));
        assert!(accounts_keys[1].contains_key("email"));
        assert!(user.is_key_field("email"));
        assert!(user.is_entity());
    }

    #[test]
    fn unknown_key_field_is_reported() {
        let err = ComposedSchema::parse(
            r#"
            schema { query: Query }
            type Query {
                user: User @resolve(service: "accounts")
            }
            type User @owner(service: "accounts") @key(fields: "uuid", service: "accounts") {
                id: ID!
            }
            "#,
        )
        .unwrap_err();

        match err {
            SchemaError::Validation(issues) => assert_eq!(issues, vec![SchemaIssue::UnknownFieldInFieldSet {
                directive: "key",
                type_name: "User".to_string(),
                field_name: "uuid".to_string(),
            }]),
            _ => panic!("expected a validation error"),
        }
    }
}
