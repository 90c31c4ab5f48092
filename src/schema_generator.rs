use crate::ast::TypeExpr;
use crate::type_resolver::{parse_field, FieldDef, TypeDeclaration, TypeKind, TypeResolver};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

/// Prefix of every schema reference.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Schema generator - converts Go types to OpenAPI schemas
///
/// Named types are generated once into a shared schema table and referenced by their clean
/// name everywhere else. A type is marked in progress before its fields are generated, so a
/// type that refers to itself produces a `$ref` instead of recursing forever.
pub struct SchemaGenerator {
    /// Index of model declarations
    type_resolver: TypeResolver,
    /// Generated named schemas by clean type name
    schemas: BTreeMap<String, Schema>,
    /// Types whose schema is being generated
    in_progress: HashSet<String>,
    /// Types already looked up without success
    missing: HashSet<String>,
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "int64", "uuid", "date-time")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    /// Required field names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Enum values for enum types
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    /// Value schema for map types
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,
}

impl Schema {
    /// A schema with only a `type`.
    pub fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    /// A primitive schema with a format.
    pub fn formatted(schema_type: &str, format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
            ..Self::typed(schema_type)
        }
    }

    /// An open object without declared properties.
    pub fn object() -> Self {
        Self::typed("object")
    }

    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed("array")
        }
    }

    /// A `$ref` to the named schema.
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", SCHEMA_REF_PREFIX, name)),
            ..Self::default()
        }
    }

    /// An object with the given properties, all required.
    pub fn object_with(properties: Vec<(&str, Schema)>) -> Self {
        let required = properties.iter().map(|(name, _)| name.to_string()).collect();
        Self {
            properties: Some(
                properties
                    .into_iter()
                    .map(|(name, schema)| (name.to_string(), schema))
                    .collect(),
            ),
            required: Some(required),
            ..Self::object()
        }
    }

    /// The standard error body: `{ "error": string }`.
    pub fn error_object() -> Self {
        Self {
            properties: Some(BTreeMap::from([(
                "error".to_string(),
                Schema::typed("string"),
            )])),
            ..Self::object()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Name of the referenced schema, if this is a `$ref`.
    pub fn ref_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.strip_prefix(SCHEMA_REF_PREFIX))
    }

    /// Adds the names of every schema referenced from this one, at any depth.
    pub fn collect_refs(&self, refs: &mut BTreeSet<String>) {
        if let Some(name) = self.ref_name() {
            refs.insert(name.to_string());
        }
        if let Some(properties) = &self.properties {
            for property in properties.values() {
                property.collect_refs(refs);
            }
        }
        if let Some(items) = &self.items {
            items.collect_refs(refs);
        }
        if let Some(values) = &self.additional_properties {
            values.collect_refs(refs);
        }
    }
}

impl SchemaGenerator {
    /// Create a new SchemaGenerator with a TypeResolver
    pub fn new(type_resolver: TypeResolver) -> Self {
        debug!("Initializing SchemaGenerator");
        Self {
            type_resolver,
            schemas: BTreeMap::new(),
            in_progress: HashSet::new(),
            missing: HashSet::new(),
        }
    }

    /// Generates the schema for a type written as Go source text, e.g. `*[]orders_models.Order`.
    pub fn generate_schema(&mut self, type_name: &str) -> Schema {
        self.generate_type_schema(&TypeExpr::parse(type_name), None)
    }

    /// Generates the schema for a type expression.
    ///
    /// `context_dir` is the directory of the declaration the type appears in; bare names are
    /// looked up there first.
    pub fn generate_type_schema(&mut self, ty: &TypeExpr, context_dir: Option<&Path>) -> Schema {
        match ty {
            TypeExpr::Named(name) => match builtin_schema(name) {
                Some(schema) => schema,
                None => self.generate_named_schema(None, name, context_dir),
            },
            TypeExpr::Qualified { package, name } => {
                match builtin_schema(&format!("{}.{}", package, name)) {
                    Some(schema) => schema,
                    None => self.generate_named_schema(Some(package), name, context_dir),
                }
            }
            TypeExpr::Pointer(inner) => self.generate_type_schema(inner, context_dir),
            TypeExpr::Slice(inner) | TypeExpr::Array { elem: inner, .. } => {
                Schema::array(self.generate_type_schema(inner, context_dir))
            }
            TypeExpr::Map { value, .. } => Schema {
                additional_properties: Some(Box::new(
                    self.generate_type_schema(value, context_dir),
                )),
                ..Schema::object()
            },
            // Only the type argument is modelled; the generic wrapper is dropped.
            TypeExpr::Generic { base, args } => match args.first() {
                Some(arg) => self.generate_type_schema(strip_decoration(arg), context_dir),
                None => self.generate_type_schema(base, context_dir),
            },
            TypeExpr::Struct(fields) => {
                let fields: Vec<FieldDef> = fields.iter().filter_map(parse_field).collect();
                self.generate_struct_schema(&fields, context_dir)
            }
            TypeExpr::Interface | TypeExpr::Func | TypeExpr::Chan(_) | TypeExpr::Other(_) => {
                Schema::object()
            }
        }
    }

    /// Schema for a declared type: a `$ref` to its table entry, or an open object if no
    /// declaration exists.
    fn generate_named_schema(
        &mut self,
        package: Option<&str>,
        name: &str,
        context_dir: Option<&Path>,
    ) -> Schema {
        if self.schemas.contains_key(name) || self.in_progress.contains(name) {
            return Schema::reference(name);
        }
        if self.missing.contains(name) {
            return Schema::object();
        }

        let Some(declaration) = self.type_resolver.find(package, name, context_dir).cloned() else {
            warn!(
                "Type {} not found under models root, using generic object",
                match package {
                    Some(package) => format!("{}.{}", package, name),
                    None => name.to_string(),
                }
            );
            self.missing.insert(name.to_string());
            return Schema::object();
        };

        debug!("Generating schema for {}.{}", declaration.package, name);
        self.in_progress.insert(name.to_string());
        let schema = self.generate_declaration_schema(&declaration);
        self.in_progress.remove(name);
        self.schemas.insert(name.to_string(), schema);

        Schema::reference(name)
    }

    fn generate_declaration_schema(&mut self, declaration: &TypeDeclaration) -> Schema {
        let dir = Some(declaration.dir.as_path());
        let mut schema = match &declaration.kind {
            TypeKind::Struct(def) => self.generate_struct_schema(&def.fields, dir),
            TypeKind::Enum(def) => Schema {
                enum_values: (!def.values.is_empty()).then(|| def.values.clone()),
                ..Schema::typed(underlying_openapi_type(&def.underlying))
                    .with_description(&format!("Enum type: {}", declaration.name))
            },
            TypeKind::Alias(TypeExpr::Qualified { package, name }) => {
                builtin_schema(&format!("{}.{}", package, name))
                    .unwrap_or_else(|| Schema::typed(underlying_openapi_type(name)))
            }
            TypeKind::Alias(aliased) => self.generate_type_schema(aliased, dir),
        };

        if schema.description.is_none() && schema.reference.is_none() {
            schema.description = declaration.description.clone();
        }
        schema
    }

    fn generate_struct_schema(
        &mut self,
        fields: &[FieldDef],
        context_dir: Option<&Path>,
    ) -> Schema {
        let mut properties = BTreeMap::new();
        let mut required = Vec::new();

        for field in fields {
            let mut property = self.generate_type_schema(&field.ty, context_dir);
            if property.reference.is_none() {
                if let Some(description) = &field.description {
                    property.description = Some(description.clone());
                }
            }
            if field.required {
                required.push(field.json_name.clone());
            }
            properties.insert(field.json_name.clone(), property);
        }

        Schema {
            properties: Some(properties),
            required: (!required.is_empty()).then_some(required),
            ..Schema::object()
        }
    }

    /// Whether a model declaration named `name` exists.
    pub fn has_type(&self, name: &str) -> bool {
        self.type_resolver.contains(name)
    }

    /// Get all generated schemas
    pub fn get_schemas(&self) -> &BTreeMap<String, Schema> {
        &self.schemas
    }

    pub fn into_schemas(self) -> BTreeMap<String, Schema> {
        self.schemas
    }
}

/// Innermost named type of a decorated type expression.
fn strip_decoration(ty: &TypeExpr) -> &TypeExpr {
    match ty {
        TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) => strip_decoration(inner),
        TypeExpr::Array { elem, .. } => strip_decoration(elem),
        TypeExpr::Generic { args, .. } if !args.is_empty() => strip_decoration(&args[0]),
        other => other,
    }
}

/// Schemas for Go built-ins and a few well-known library types.
pub fn builtin_schema(name: &str) -> Option<Schema> {
    let schema = match name {
        "string" => Schema::typed("string"),
        "int" | "int8" | "int16" | "int32" | "int64" | "rune" => {
            Schema::formatted("integer", "int64")
        }
        "uint" | "uint8" | "uint16" | "uint32" | "uint64" | "byte" | "uintptr" => {
            Schema::formatted("integer", "uint64")
        }
        "float32" => Schema::formatted("number", "float"),
        "float64" => Schema::formatted("number", "double"),
        "bool" => Schema::typed("boolean"),
        "object" | "any" | "interface{}" => Schema::object(),
        "time.Time" | "Time" => Schema::formatted("string", "date-time"),
        "uid.UID" | "UID" | "uuid.UUID" => Schema::formatted("string", "uuid"),
        _ => return None,
    };
    Some(schema)
}

/// OpenAPI type for the underlying type of an enum or foreign alias.
fn underlying_openapi_type(underlying: &str) -> &'static str {
    let base = underlying.rsplit('.').next().unwrap_or(underlying);
    if base.starts_with("int") || base.starts_with("uint") {
        "integer"
    } else if base.starts_with("float") {
        "number"
    } else if base == "bool" {
        "boolean"
    } else {
        "string"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{GoParser, ParsedFile};
    use pretty_assertions::assert_eq;

    /// Helper function to create a SchemaGenerator from in-memory model files
    fn create_generator(files: &[(&str, &str)]) -> SchemaGenerator {
        let parsed: Vec<ParsedFile> = files
            .iter()
            .map(|(path, code)| GoParser::parse_source(Path::new(path), code).unwrap())
            .collect();
        SchemaGenerator::new(TypeResolver::from_files(Path::new("/models"), &parsed))
    }

    const ORDER_MODELS: &str = r#"
package orders_models

// Order is a customer order.
type Order struct {
    ID       uid.UID             `json:"id"`
    Customer *Customer           `json:"customer"`
    Items    []Item              `json:"items" validate:"required"`
    Tags     map[string]Item     `json:"tags,omitempty"`
    Status   StatusEnum          `json:"status"`
    Created  time.Time           `json:"created_at"`
    Parent   *Order              `json:"parent,omitempty"`
    Children []Order             `json:"children,omitempty"`
}

type Customer struct {
    // Display name
    Name string `json:"name"`
}

type Item struct {
    SKU   string  `json:"sku"`
    Price float64 `json:"price"`
}

type StatusEnum string

const (
    StatusOpen   StatusEnum = "open"
    StatusClosed StatusEnum = "closed"
)

type Note string

type State = state_machine.State
"#;

    #[test]
    fn test_builtin_types() {
        let mut generator = create_generator(&[]);
        assert_eq!(generator.generate_schema("string"), Schema::typed("string"));
        assert_eq!(
            generator.generate_schema("int32"),
            Schema::formatted("integer", "int64")
        );
        assert_eq!(
            generator.generate_schema("uint16"),
            Schema::formatted("integer", "uint64")
        );
        assert_eq!(
            generator.generate_schema("float32"),
            Schema::formatted("number", "float")
        );
        assert_eq!(
            generator.generate_schema("float64"),
            Schema::formatted("number", "double")
        );
        assert_eq!(generator.generate_schema("bool"), Schema::typed("boolean"));
        assert_eq!(
            generator.generate_schema("time.Time"),
            Schema::formatted("string", "date-time")
        );
        assert_eq!(
            generator.generate_schema("uid.UID"),
            Schema::formatted("string", "uuid")
        );
        assert!(generator.get_schemas().is_empty());
    }

    #[test]
    fn test_struct_schema_generation() {
        let mut generator = create_generator(&[("/models/orders/order.go", ORDER_MODELS)]);
        let schema = generator.generate_schema("*orders_models.Order");
        assert_eq!(schema, Schema::reference("Order"));

        let order = &generator.get_schemas()["Order"];
        assert_eq!(order.schema_type.as_deref(), Some("object"));
        assert_eq!(order.description.as_deref(), Some("Order is a customer order."));
        assert_eq!(
            order.required.as_ref().unwrap(),
            &vec!["id", "customer", "items", "status", "created_at"]
        );

        let properties = order.properties.as_ref().unwrap();
        assert_eq!(properties["id"], Schema::formatted("string", "uuid"));
        assert_eq!(properties["customer"], Schema::reference("Customer"));
        assert_eq!(properties["items"], Schema::array(Schema::reference("Item")));
        assert_eq!(
            properties["tags"].additional_properties.as_deref(),
            Some(&Schema::reference("Item"))
        );
        assert_eq!(properties["status"], Schema::reference("StatusEnum"));
        assert_eq!(
            properties["created_at"],
            Schema::formatted("string", "date-time")
        );

        let customer = &generator.get_schemas()["Customer"];
        assert_eq!(
            customer.properties.as_ref().unwrap()["name"].description.as_deref(),
            Some("Display name")
        );
    }

    #[test]
    fn test_self_reference_produces_ref() {
        let mut generator = create_generator(&[("/models/orders/order.go", ORDER_MODELS)]);
        generator.generate_schema("Order");

        let properties = generator.get_schemas()["Order"].properties.clone().unwrap();
        assert_eq!(properties["parent"], Schema::reference("Order"));
        assert_eq!(properties["children"], Schema::array(Schema::reference("Order")));
    }

    #[test]
    fn test_mutual_reference() {
        let mut generator = create_generator(&[(
            "/models/tree/node.go",
            r#"
package tree_models

type Node struct {
    Edges []Edge `json:"edges"`
}

type Edge struct {
    Target *Node `json:"target"`
}
"#,
        )]);
        assert_eq!(generator.generate_schema("Node"), Schema::reference("Node"));
        let edge = &generator.get_schemas()["Edge"];
        assert_eq!(
            edge.properties.as_ref().unwrap()["target"],
            Schema::reference("Node")
        );
    }

    #[test]
    fn test_enum_schema_generation() {
        let mut generator = create_generator(&[("/models/orders/order.go", ORDER_MODELS)]);
        generator.generate_schema("orders_models.StatusEnum");

        let status = &generator.get_schemas()["StatusEnum"];
        assert_eq!(status.schema_type.as_deref(), Some("string"));
        assert_eq!(status.description.as_deref(), Some("Enum type: StatusEnum"));
        assert_eq!(
            status.enum_values,
            Some(vec![
                serde_json::Value::from("open"),
                serde_json::Value::from("closed")
            ])
        );
    }

    #[test]
    fn test_aliases_are_transparent() {
        let mut generator = create_generator(&[("/models/orders/order.go", ORDER_MODELS)]);
        generator.generate_schema("Note");
        generator.generate_schema("State");

        assert_eq!(generator.get_schemas()["Note"], Schema::typed("string"));
        assert_eq!(generator.get_schemas()["State"], Schema::typed("string"));
    }

    #[test]
    fn test_inline_struct_fields_follow_tag_rules() {
        let mut generator = create_generator(&[(
            "/models/pages/page.go",
            r#"
package pages_models

type Page struct {
    Meta struct {
        // Page cursor
        Cursor string `json:"cursor,omitempty" validate:"required"`
        Hint   string `json:"hint,omitempty"`
        Size   int    `json:",omitempty"`
        Debug  bool   `json:"-"`
    } `json:"meta"`
}
"#,
        )]);
        generator.generate_schema("Page");

        let page = &generator.get_schemas()["Page"];
        assert_eq!(page.required, Some(vec!["meta".to_string()]));
        let meta = &page.properties.as_ref().unwrap()["meta"];
        assert_eq!(meta.required, Some(vec!["cursor".to_string()]));

        let properties = meta.properties.as_ref().unwrap();
        assert_eq!(
            properties.keys().collect::<Vec<_>>(),
            vec!["cursor", "hint"]
        );
        assert_eq!(
            properties["cursor"],
            Schema::typed("string").with_description("Page cursor")
        );
    }

    #[test]
    fn test_unknown_type_fallback() {
        let mut generator = create_generator(&[("/models/orders/order.go", ORDER_MODELS)]);
        let schema = generator.generate_schema("billing_models.Invoice");

        assert_eq!(schema, Schema::object());
        assert!(schema.properties.is_none());
        assert!(generator.get_schemas().is_empty());
        // A second lookup degrades the same way.
        assert_eq!(generator.generate_schema("Invoice"), Schema::object());
    }

    #[test]
    fn test_schema_caching() {
        let mut generator = create_generator(&[("/models/orders/order.go", ORDER_MODELS)]);
        let first = generator.generate_schema("Item");
        let count = generator.get_schemas().len();
        let second = generator.generate_schema("orders_models.Item");

        assert_eq!(first, second);
        assert_eq!(generator.get_schemas().len(), count);
    }

    #[test]
    fn test_generic_wrapper_uses_inner_type() {
        let mut generator = create_generator(&[("/models/orders/order.go", ORDER_MODELS)]);
        let schema = generator.generate_schema("utils.PaginatedResult[[]orders_models.Item]");
        assert_eq!(schema, Schema::reference("Item"));
        assert!(generator.get_schemas().contains_key("Item"));
    }

    #[test]
    fn test_slice_of_models() {
        let mut generator = create_generator(&[("/models/orders/order.go", ORDER_MODELS)]);
        assert_eq!(
            generator.generate_schema("[]*orders_models.Item"),
            Schema::array(Schema::reference("Item"))
        );
    }

    #[test]
    fn test_collect_refs() {
        let schema = Schema::object_with(vec![
            ("data", Schema::array(Schema::reference("Item"))),
            ("owner", Schema::reference("Customer")),
        ]);
        let mut refs = BTreeSet::new();
        schema.collect_refs(&mut refs);
        assert_eq!(
            refs.into_iter().collect::<Vec<_>>(),
            vec!["Customer", "Item"]
        );
    }

    #[test]
    fn test_schema_serialization_skips_empty_fields() {
        let json = serde_json::to_value(Schema::reference("Order")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"$ref": "#/components/schemas/Order"})
        );
        let json = serde_json::to_value(Schema::error_object()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "object",
                "properties": {"error": {"type": "string"}}
            })
        );
    }
}
