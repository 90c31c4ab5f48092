use crate::enhancer::{
    EndpointSpec, ParameterLocation, BEARER_SCHEME, JSON_CONTENT_TYPE, PERMISSIONS_SCHEME,
};
use crate::extractor::{to_openapi_path, HttpMethod};
use crate::schema_generator::{Schema, SchemaGenerator};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// OpenAPI document version written by the builder.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// OpenAPI document builder
///
/// Endpoints are added one at a time;
/// [`finalize_security_schemes`](Self::finalize_security_schemes) runs once after the last
/// endpoint, and [`build`](Self::build) consumes the builder together
/// with the schema table the endpoints were resolved against.
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    servers: Vec<Server>,
    /// Paths collection (OpenAPI path -> PathItem)
    paths: BTreeMap<String, PathItem>,
    /// Tags in registration order
    tags: Vec<Tag>,
    security_schemes: BTreeMap<String, SecurityScheme>,
    /// Permission scopes seen on any endpoint
    collected_scopes: BTreeSet<String>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// API version
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        }
    }

    /// Operations defined on this path, in verb order.
    pub fn operations(&self) -> Vec<(HttpMethod, &Operation)> {
        [
            (HttpMethod::Get, &self.get),
            (HttpMethod::Post, &self.post),
            (HttpMethod::Put, &self.put),
            (HttpMethod::Delete, &self.delete),
            (HttpMethod::Patch, &self.patch),
            (HttpMethod::Head, &self.head),
            (HttpMethod::Options, &self.options),
        ]
        .into_iter()
        .filter_map(|(method, operation)| operation.as_ref().map(|op| (method, op)))
        .collect()
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    /// Parameters (path, query)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses by status code
    pub responses: BTreeMap<String, Response>,
    /// One map per alternative requirement: scheme name -> scopes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<BTreeMap<String, Vec<String>>>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, query)
    #[serde(rename = "in")]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub schema: Schema,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Schema>,
    #[serde(rename = "securitySchemes", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flows: Option<OAuthFlows>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthFlows {
    #[serde(rename = "authorizationCode")]
    pub authorization_code: OAuthFlow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthFlow {
    #[serde(rename = "authorizationUrl", default, skip_serializing_if = "String::is_empty")]
    pub authorization_url: String,
    #[serde(rename = "tokenUrl", default, skip_serializing_if = "String::is_empty")]
    pub token_url: String,
    /// Scope -> description
    pub scopes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// API paths
    pub paths: BTreeMap<String, PathItem>,
    pub components: Components,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl OpenApiDocument {
    /// Number of operations across all paths.
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations().len()).sum()
    }
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info {
                title: "API".to_string(),
                description: None,
                version: "1.0.0".to_string(),
            },
            servers: Vec::new(),
            paths: BTreeMap::new(),
            tags: Vec::new(),
            security_schemes: BTreeMap::from([(
                BEARER_SCHEME.to_string(),
                SecurityScheme {
                    scheme_type: "http".to_string(),
                    description: Some("JWT Bearer token authentication".to_string()),
                    scheme: Some("bearer".to_string()),
                    bearer_format: Some("JWT".to_string()),
                    flows: None,
                },
            )]),
            collected_scopes: BTreeSet::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(
        mut self,
        title: String,
        version: String,
        description: Option<String>,
    ) -> Self {
        self.info = Info {
            title,
            description,
            version,
        };
        self
    }

    pub fn with_servers(mut self, urls: &[String]) -> Self {
        self.servers = urls.iter().map(|url| Server { url: url.clone() }).collect();
        self
    }

    /// Adds one endpoint as an operation on its path.
    ///
    /// Each verb has its own slot in the path item, so endpoints sharing a path never
    /// overwrite each other unless they also share the verb.
    pub fn add_endpoint(&mut self, endpoint: &EndpointSpec) {
        let path = to_openapi_path(&endpoint.path);
        debug!("Adding endpoint: {} {}", endpoint.method, path);

        let operation = Self::create_operation(endpoint);
        *self.paths.entry(path).or_default().slot(endpoint.method) = Some(operation);

        for tag in &endpoint.tags {
            if !self.tags.iter().any(|existing| &existing.name == tag) {
                self.tags.push(Tag {
                    name: tag.clone(),
                    description: Some(format!("{} related endpoints", tag)),
                });
            }
        }

        for requirement in &endpoint.security {
            self.collected_scopes
                .extend(requirement.scopes.iter().cloned());
        }
    }

    fn create_operation(endpoint: &EndpointSpec) -> Operation {
        let parameters = endpoint
            .parameters
            .iter()
            .map(|param| Parameter {
                name: param.name.clone(),
                location: match param.location {
                    ParameterLocation::Path => "path".to_string(),
                    ParameterLocation::Query => "query".to_string(),
                },
                description: Some(param.description.clone()),
                required: param.required,
                schema: param.schema.clone(),
            })
            .collect();

        let request_body = endpoint.request_body.as_ref().map(|body| RequestBody {
            description: Some(body.description.clone()),
            required: body.required,
            content: BTreeMap::from([(
                body.content_type.clone(),
                MediaType {
                    schema: body.schema.clone(),
                },
            )]),
        });

        let mut responses: BTreeMap<String, Response> = endpoint
            .responses
            .iter()
            .map(|(status, response)| {
                let content = match (&response.content_type, &response.schema) {
                    (Some(content_type), Some(schema)) => Some(BTreeMap::from([(
                        content_type.clone(),
                        MediaType {
                            schema: wrap_response_schema(schema, status),
                        },
                    )])),
                    _ => None,
                };
                (
                    status.clone(),
                    Response {
                        description: response.description.clone(),
                        content,
                    },
                )
            })
            .collect();

        responses.entry("400".to_string()).or_insert_with(|| Response {
            description: "Bad Request".to_string(),
            content: Some(BTreeMap::from([(
                JSON_CONTENT_TYPE.to_string(),
                MediaType {
                    schema: Schema::error_object(),
                },
            )])),
        });

        let security = endpoint
            .security
            .iter()
            .map(|requirement| {
                BTreeMap::from([(requirement.name.clone(), requirement.scopes.clone())])
            })
            .collect();

        Operation {
            tags: endpoint.tags.clone(),
            summary: endpoint.summary.clone(),
            description: endpoint.description.clone(),
            operation_id: operation_id(endpoint.method, &endpoint.handler),
            parameters,
            request_body,
            responses,
            security,
        }
    }

    /// Adds the `permissions` OAuth2 scheme carrying every scope collected so far.
    ///
    /// Without collected scopes only the bearer scheme remains.
    pub fn finalize_security_schemes(&mut self, authorize_url: &str, token_url: &str) {
        if self.collected_scopes.is_empty() {
            return;
        }

        let scopes = self
            .collected_scopes
            .iter()
            .map(|scope| (scope.clone(), format!("Permission: {}", scope)))
            .collect();
        self.security_schemes.insert(
            PERMISSIONS_SCHEME.to_string(),
            SecurityScheme {
                scheme_type: "oauth2".to_string(),
                description: Some(
                    "OAuth2 with permission scopes extracted from middleware".to_string(),
                ),
                scheme: None,
                bearer_format: None,
                flows: Some(OAuthFlows {
                    authorization_code: OAuthFlow {
                        authorization_url: authorize_url.to_string(),
                        token_url: token_url.to_string(),
                        scopes,
                    },
                }),
            },
        );
    }

    /// Build the final OpenAPI document
    ///
    /// Every `$ref` in the result points at a component schema; names the schema table never
    /// resolved are filled with an open object.
    pub fn build(self, schema_gen: SchemaGenerator) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        let mut schemas = schema_gen.into_schemas();
        let mut refs = BTreeSet::new();
        for item in self.paths.values() {
            for (_, operation) in item.operations() {
                collect_operation_refs(operation, &mut refs);
            }
        }
        for schema in schemas.values() {
            schema.collect_refs(&mut refs);
        }
        for name in refs {
            if !schemas.contains_key(&name) {
                debug!("Filling unresolved schema {} with a generic object", name);
                schemas.insert(name, Schema::object());
            }
        }

        let document = OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            servers: self.servers,
            paths: self.paths,
            components: Components {
                schemas,
                security_schemes: self.security_schemes,
            },
            tags: self.tags,
        };
        info!(
            "Built OpenAPI document: {} paths, {} operations, {} schemas",
            document.paths.len(),
            document.operation_count(),
            document.components.schemas.len()
        );
        document
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `{ "data": schema }` for success statuses; 4xx and 5xx bodies are left as they are.
pub fn wrap_response_schema(schema: &Schema, status: &str) -> Schema {
    if status.starts_with('4') || status.starts_with('5') {
        return schema.clone();
    }
    Schema {
        properties: Some(BTreeMap::from([("data".to_string(), schema.clone())])),
        ..Schema::object()
    }
}

/// `post_CreateOrder` for handler `CreateOrder`; a `Controller` suffix is dropped.
pub fn operation_id(method: HttpMethod, handler: &str) -> String {
    let handler = handler.trim_start_matches('*');
    let handler = handler.strip_suffix("Controller").unwrap_or(handler);
    format!("{}_{}", method.as_str().to_lowercase(), handler)
}

fn collect_operation_refs(operation: &Operation, refs: &mut BTreeSet<String>) {
    for param in &operation.parameters {
        param.schema.collect_refs(refs);
    }
    let bodies = operation
        .request_body
        .iter()
        .flat_map(|body| body.content.values());
    let responses = operation
        .responses
        .values()
        .filter_map(|response| response.content.as_ref())
        .flat_map(|content| content.values());
    for media in bodies.chain(responses) {
        media.schema.collect_refs(refs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhancer::{ParameterSpec, RequestBodySpec, ResponseSpec, SecurityRequirement};
    use crate::parser::GoParser;
    use crate::type_resolver::TypeResolver;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn endpoint(method: HttpMethod, path: &str, handler: &str) -> EndpointSpec {
        EndpointSpec {
            path: path.to_string(),
            method,
            handler: handler.to_string(),
            microservice: "ms_orders".to_string(),
            summary: None,
            description: None,
            tags: vec!["Orders".to_string()],
            parameters: vec![],
            request_body: None,
            responses: BTreeMap::from([("200".to_string(), ResponseSpec::default_success())]),
            security: vec![],
        }
    }

    fn empty_generator() -> SchemaGenerator {
        SchemaGenerator::new(TypeResolver::from_files(Path::new("/models"), &[]))
    }

    #[test]
    fn test_new_builder() {
        let builder = OpenApiBuilder::new();

        assert_eq!(builder.info.title, "API");
        assert_eq!(builder.info.version, "1.0.0");
        assert!(builder.paths.is_empty());
        assert!(builder.security_schemes.contains_key(BEARER_SCHEME));
    }

    #[test]
    fn test_with_info() {
        let builder = OpenApiBuilder::new().with_info(
            "My API".to_string(),
            "2.0.0".to_string(),
            Some("Custom description".to_string()),
        );

        assert_eq!(builder.info.title, "My API");
        assert_eq!(builder.info.version, "2.0.0");
        assert_eq!(builder.info.description, Some("Custom description".to_string()));
    }

    #[test]
    fn test_verbs_share_a_path_item() {
        let mut builder = OpenApiBuilder::new();
        builder.add_endpoint(&endpoint(HttpMethod::Get, "/orders/:id", "GetOrder"));
        builder.add_endpoint(&endpoint(HttpMethod::Delete, "/orders/:id", "DeleteOrder"));

        assert_eq!(builder.paths.len(), 1);
        let item = &builder.paths["/orders/{id}"];
        assert_eq!(item.get.as_ref().unwrap().operation_id, "get_GetOrder");
        assert_eq!(item.delete.as_ref().unwrap().operation_id, "delete_DeleteOrder");
        assert!(item.post.is_none());
        assert_eq!(item.operations().len(), 2);
    }

    #[test]
    fn test_response_wrapping() {
        let mut spec = endpoint(HttpMethod::Post, "/orders", "CreateOrder");
        spec.responses = BTreeMap::from([
            (
                "201".to_string(),
                ResponseSpec {
                    description: "Successful response".to_string(),
                    content_type: Some(JSON_CONTENT_TYPE.to_string()),
                    schema: Some(Schema::reference("Order")),
                },
            ),
            (
                "400".to_string(),
                ResponseSpec {
                    description: "Error response".to_string(),
                    content_type: Some(JSON_CONTENT_TYPE.to_string()),
                    schema: Some(Schema::error_object()),
                },
            ),
            (
                "204".to_string(),
                ResponseSpec {
                    description: "No content".to_string(),
                    content_type: None,
                    schema: None,
                },
            ),
        ]);

        let mut builder = OpenApiBuilder::new();
        builder.add_endpoint(&spec);
        let operation = builder.paths["/orders"].post.clone().unwrap();

        let created = &operation.responses["201"].content.as_ref().unwrap()[JSON_CONTENT_TYPE];
        assert_eq!(
            serde_json::to_value(&created.schema).unwrap(),
            serde_json::json!({
                "type": "object",
                "properties": {"data": {"$ref": "#/components/schemas/Order"}}
            })
        );
        let failed = &operation.responses["400"].content.as_ref().unwrap()[JSON_CONTENT_TYPE];
        assert_eq!(failed.schema, Schema::error_object());
        assert_eq!(operation.responses["400"].description, "Error response");
        assert!(operation.responses["204"].content.is_none());
    }

    #[test]
    fn test_default_bad_request_response() {
        let mut builder = OpenApiBuilder::new();
        builder.add_endpoint(&endpoint(HttpMethod::Get, "/orders", "ListOrders"));
        let operation = builder.paths["/orders"].get.clone().unwrap();

        assert_eq!(operation.responses["400"].description, "Bad Request");
        let ok = &operation.responses["200"].content.as_ref().unwrap()[JSON_CONTENT_TYPE];
        assert_eq!(ok.schema, wrap_response_schema(&Schema::object(), "200"));
    }

    #[test]
    fn test_operation_fields() {
        let mut spec = endpoint(HttpMethod::Put, "/orders/:id", "UpdateOrderController");
        spec.summary = Some("Update an order".to_string());
        spec.parameters = vec![ParameterSpec {
            name: "id".to_string(),
            location: ParameterLocation::Path,
            required: true,
            description: "Path parameter: id".to_string(),
            schema: Schema::formatted("string", "uuid"),
        }];
        spec.request_body = Some(RequestBodySpec {
            description: "Request body".to_string(),
            required: true,
            content_type: JSON_CONTENT_TYPE.to_string(),
            schema: Schema::reference("UpdateOrderRequest"),
        });
        spec.security = vec![SecurityRequirement {
            name: PERMISSIONS_SCHEME.to_string(),
            scopes: vec!["orders:write".to_string()],
        }];

        let mut builder = OpenApiBuilder::new();
        builder.add_endpoint(&spec);
        let operation = builder.paths["/orders/{id}"].put.clone().unwrap();

        assert_eq!(operation.operation_id, "put_UpdateOrder");
        assert_eq!(operation.summary.as_deref(), Some("Update an order"));
        assert_eq!(operation.parameters[0].location, "path");
        assert_eq!(
            operation.security,
            vec![BTreeMap::from([(
                PERMISSIONS_SCHEME.to_string(),
                vec!["orders:write".to_string()]
            )])]
        );
    }

    #[test]
    fn test_tags_registered_once_in_order() {
        let mut builder = OpenApiBuilder::new();
        let mut users = endpoint(HttpMethod::Get, "/users", "ListUsers");
        users.tags = vec!["Users".to_string()];
        builder.add_endpoint(&users);
        builder.add_endpoint(&endpoint(HttpMethod::Get, "/orders", "ListOrders"));
        builder.add_endpoint(&endpoint(HttpMethod::Post, "/orders", "CreateOrder"));

        let names: Vec<&str> = builder.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Users", "Orders"]);
        assert_eq!(
            builder.tags[1].description.as_deref(),
            Some("Orders related endpoints")
        );
    }

    #[test]
    fn test_security_schemes_without_scopes() {
        let mut builder = OpenApiBuilder::new();
        let mut spec = endpoint(HttpMethod::Get, "/me", "Me");
        spec.security = vec![SecurityRequirement {
            name: BEARER_SCHEME.to_string(),
            scopes: vec![],
        }];
        builder.add_endpoint(&spec);
        builder.finalize_security_schemes("https://auth/authorize", "https://auth/token");

        let document = builder.build(empty_generator());
        let schemes: Vec<&str> = document
            .components
            .security_schemes
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(schemes, vec![BEARER_SCHEME]);
    }

    #[test]
    fn test_security_schemes_collect_scopes() {
        let mut builder = OpenApiBuilder::new();
        for (path, scope) in [
            ("/a", "orders:read"),
            ("/b", "orders:write"),
            ("/c", "orders:read"),
        ] {
            let mut spec = endpoint(HttpMethod::Get, path, "Handler");
            spec.security = vec![SecurityRequirement {
                name: PERMISSIONS_SCHEME.to_string(),
                scopes: vec![scope.to_string()],
            }];
            builder.add_endpoint(&spec);
        }
        builder.finalize_security_schemes("https://auth/authorize", "https://auth/token");

        let document = builder.build(empty_generator());
        let permissions = &document.components.security_schemes[PERMISSIONS_SCHEME];
        assert_eq!(permissions.scheme_type, "oauth2");
        let flow = &permissions.flows.as_ref().unwrap().authorization_code;
        assert_eq!(flow.authorization_url, "https://auth/authorize");
        assert_eq!(flow.token_url, "https://auth/token");
        assert_eq!(
            flow.scopes,
            BTreeMap::from([
                ("orders:read".to_string(), "Permission: orders:read".to_string()),
                ("orders:write".to_string(), "Permission: orders:write".to_string()),
            ])
        );
    }

    #[test]
    fn test_build_fills_dangling_refs() {
        let mut spec = endpoint(HttpMethod::Get, "/orders", "ListOrders");
        spec.responses.insert(
            "200".to_string(),
            ResponseSpec {
                description: "Successful response".to_string(),
                content_type: Some(JSON_CONTENT_TYPE.to_string()),
                schema: Some(Schema::array(Schema::reference("Ghost"))),
            },
        );
        let mut builder = OpenApiBuilder::new();
        builder.add_endpoint(&spec);

        let document = builder.build(empty_generator());
        assert_eq!(document.components.schemas["Ghost"], Schema::object());
    }

    #[test]
    fn test_build_includes_generated_schemas() {
        let models = GoParser::parse_source(
            Path::new("/models/orders/order.go"),
            "package orders_models\n\ntype Order struct {\n    Lines []Line `json:\"lines\"`\n}\n\ntype Line struct {\n    SKU string `json:\"sku\"`\n}\n",
        )
        .unwrap();
        let mut generator =
            SchemaGenerator::new(TypeResolver::from_files(Path::new("/models"), &[models]));
        let schema = generator.generate_schema("*orders_models.Order");

        let mut spec = endpoint(HttpMethod::Get, "/orders/:id", "GetOrder");
        spec.responses.insert(
            "200".to_string(),
            ResponseSpec {
                description: "Successful response".to_string(),
                content_type: Some(JSON_CONTENT_TYPE.to_string()),
                schema: Some(schema),
            },
        );
        let mut builder =
            OpenApiBuilder::new().with_servers(&["https://api.example.com".to_string()]);
        builder.add_endpoint(&spec);
        let document = builder.build(generator);

        assert_eq!(document.openapi, "3.0.0");
        assert_eq!(document.servers[0].url, "https://api.example.com");
        let names: Vec<&str> = document.components.schemas.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Line", "Order"]);
        assert_eq!(document.operation_count(), 1);
    }

    #[test]
    fn test_operation_id() {
        assert_eq!(operation_id(HttpMethod::Post, "CreateOrder"), "post_CreateOrder");
        assert_eq!(operation_id(HttpMethod::Get, "*OrdersController"), "get_Orders");
    }
}
