//! Endpoint enhancement.
//!
//! Turns a [`RawEndpoint`] into an [`EndpointSpec`] by reading the handler's doc comment and
//! body: path parameters, request body, responses and the security requirement implied by the
//! middleware chain. Handler analysis is best effort; an endpoint whose handler cannot be
//! located still produces a spec with its path, tags, security and a default response.

use crate::ast::{self, Expr, FuncDecl, Stmt, Visit};
use crate::business_layer::BusinessLayerRegistry;
use crate::extractor::{path_parameter_names, HttpMethod, RawEndpoint};
use crate::schema_generator::{Schema, SchemaGenerator};
use crate::symbols::SymbolTable;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Security scheme name for endpoints that only require a bearer token.
pub const BEARER_SCHEME: &str = "bearerAuth";
/// Security scheme name for endpoints guarded by permission scopes.
pub const PERMISSIONS_SCHEME: &str = "permissions";

/// Constant references used as permission arguments, with their literal values.
const KNOWN_PERMISSION_CONSTANTS: &[(&str, &str)] =
    &[("session_manager_models.SuperadminRoleFeature", "superadmin")];

/// Middleware calls whose arguments are permission scopes. The flag marks calls taking
/// several comma-separated scopes.
const PERMISSION_PATTERNS: &[(&str, bool)] = &[
    ("hasPermission(", false),
    ("AllFeaturesOf(", true),
    ("AnyFeaturesOf(", true),
    ("RequirePermissions(", true),
    ("RequireAnyPermission(", true),
];

/// A fully described endpoint, ready for the document assembler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSpec {
    /// Path in router syntax, e.g. `/v1/orders/:id`
    pub path: String,
    pub method: HttpMethod,
    pub handler: String,
    pub microservice: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<ParameterSpec>,
    pub request_body: Option<RequestBodySpec>,
    /// Responses by status code
    pub responses: BTreeMap<String, ResponseSpec>,
    pub security: Vec<SecurityRequirement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: String,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBodySpec {
    pub description: String,
    pub required: bool,
    pub content_type: String,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSpec {
    pub description: String,
    /// `None` for responses without a body
    pub content_type: Option<String>,
    pub schema: Option<Schema>,
}

impl ResponseSpec {
    fn json(description: &str, schema: Schema) -> Self {
        Self {
            description: description.to_string(),
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            schema: Some(schema),
        }
    }

    /// The fallback `200` response with an open object body.
    pub fn default_success() -> Self {
        Self::json("Successful response", Schema::object())
    }
}

/// One security scheme requirement with its scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityRequirement {
    pub name: String,
    pub scopes: Vec<String>,
}

/// Type inference strategies, in the order they are tried.
///
/// Each strategy either names a type for an expression or declines, letting the next one try.
/// [`InferenceStrategy::GenericObject`] never declines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceStrategy {
    /// Composite literal type, or the recorded type of a local variable
    DeclaredType,
    /// First non-error result of a business-layer method reached through a controller field
    BusinessLayer,
    /// `CreateX` -> `XResponse` and similar, accepted only when the model index declares it
    NamingConvention,
    /// The name of the called function or method
    CalleeName,
    /// An open object
    GenericObject,
}

impl InferenceStrategy {
    pub const ORDER: [InferenceStrategy; 5] = [
        InferenceStrategy::DeclaredType,
        InferenceStrategy::BusinessLayer,
        InferenceStrategy::NamingConvention,
        InferenceStrategy::CalleeName,
        InferenceStrategy::GenericObject,
    ];
}

/// Result of type inference for one expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredType {
    pub strategy: InferenceStrategy,
    /// Go type text; `None` for [`InferenceStrategy::GenericObject`]
    pub type_name: Option<String>,
}

/// Endpoint enhancer for the handlers of one directory.
pub struct EndpointEnhancer<'a> {
    symbols: &'a SymbolTable,
    registry: &'a BusinessLayerRegistry,
}

impl<'a> EndpointEnhancer<'a> {
    pub fn new(symbols: &'a SymbolTable, registry: &'a BusinessLayerRegistry) -> Self {
        Self { symbols, registry }
    }

    /// Builds the full description of `endpoint`.
    ///
    /// Request and response types are resolved through `schemas`, which collects every named
    /// model schema the endpoint refers to.
    pub fn enhance(&self, endpoint: &RawEndpoint, schemas: &mut SchemaGenerator) -> EndpointSpec {
        let mut spec = EndpointSpec {
            path: endpoint.path.clone(),
            method: endpoint.method,
            handler: endpoint.handler.clone(),
            microservice: endpoint.microservice.clone(),
            summary: None,
            description: None,
            tags: vec![tag_for_path(&endpoint.path, &endpoint.microservice)],
            parameters: Vec::new(),
            request_body: None,
            responses: BTreeMap::new(),
            security: extract_security(&endpoint.middleware),
        };

        let handler = if endpoint.is_inline() {
            None
        } else {
            self.symbols.function(&endpoint.handler)
        };
        match handler {
            Some(func) => self.analyze_handler(func, &mut spec, schemas),
            None if endpoint.is_inline() => {
                debug!(
                    "Inline handler for {} {}, skipping body analysis",
                    spec.method, spec.path
                );
            }
            None => warn!(
                "Handler function {} not found for {} {}",
                endpoint.handler, spec.method, spec.path
            ),
        }

        for name in path_parameter_names(&endpoint.path) {
            add_parameter(&mut spec.parameters, path_parameter(&name, Schema::typed("string")));
        }
        if spec.responses.is_empty() {
            spec.responses
                .insert("200".to_string(), ResponseSpec::default_success());
        }
        spec
    }

    fn analyze_handler(
        &self,
        func: &FuncDecl,
        spec: &mut EndpointSpec,
        schemas: &mut SchemaGenerator,
    ) {
        if let Some((summary, rest)) = func.doc.split_first() {
            spec.summary = Some(summary.clone());
            if !rest.is_empty() {
                spec.description = Some(rest.join("\n"));
            }
        }

        let Some(body) = &func.body else {
            return;
        };
        let receiver = func.receiver_type().unwrap_or_default();

        let mut collector = VariableTypeCollector {
            enhancer: self,
            receiver,
            schemas,
            var_types: HashMap::new(),
        };
        ast::walk_block(&mut collector, body);
        let var_types = collector.var_types;

        let mut analyzer = CallAnalyzer {
            enhancer: self,
            receiver,
            schemas,
            var_types: &var_types,
            spec,
        };
        ast::walk_block(&mut analyzer, body);
    }

    /// Infers the Go type of `expr`, trying each strategy in [`InferenceStrategy::ORDER`].
    pub fn infer_type(
        &self,
        expr: &Expr,
        receiver: &str,
        var_types: &HashMap<String, String>,
        schemas: &SchemaGenerator,
    ) -> InferredType {
        for strategy in InferenceStrategy::ORDER {
            if let Some(type_name) = self.try_strategy(strategy, expr, receiver, var_types, schemas)
            {
                return InferredType {
                    strategy,
                    type_name: Some(type_name),
                };
            }
        }
        InferredType {
            strategy: InferenceStrategy::GenericObject,
            type_name: None,
        }
    }

    /// Applies a single inference strategy to `expr`.
    pub fn try_strategy(
        &self,
        strategy: InferenceStrategy,
        expr: &Expr,
        receiver: &str,
        var_types: &HashMap<String, String>,
        schemas: &SchemaGenerator,
    ) -> Option<String> {
        let expr = strip_address_of(expr);
        match strategy {
            InferenceStrategy::DeclaredType => match expr {
                Expr::Composite { ty: Some(ty), .. } => Some(self.symbols.canonical_type(ty)),
                Expr::Ident(name) => var_types.get(name).cloned(),
                _ => None,
            },
            InferenceStrategy::BusinessLayer => {
                let (field, method) = field_method_call(expr)?;
                let field_type = self.symbols.field_type(receiver, field)?;
                let found = self.registry.lookup_method_by_field_type(field_type, method)?;
                debug!("Business layer return type: {}.{}() -> {}", field, method, found);
                Some(found.to_string())
            }
            InferenceStrategy::NamingConvention => {
                let Expr::Call { func, .. } = expr else {
                    return None;
                };
                let Expr::Selector { field: method, .. } = func.as_ref() else {
                    return None;
                };
                naming_convention_candidates(method)
                    .into_iter()
                    .find(|candidate| schemas.has_type(candidate))
            }
            InferenceStrategy::CalleeName => expr.callee_name().map(str::to_string),
            InferenceStrategy::GenericObject => None,
        }
    }
}

/// First pass: records a type for every local variable the handler declares.
struct VariableTypeCollector<'e, 'a> {
    enhancer: &'e EndpointEnhancer<'a>,
    receiver: &'e str,
    schemas: &'e SchemaGenerator,
    var_types: HashMap<String, String>,
}

impl VariableTypeCollector<'_, '_> {
    fn record(&mut self, name: &str, value: &Expr) {
        if name == "_" {
            return;
        }
        let inferred = self
            .enhancer
            .infer_type(value, self.receiver, &self.var_types, self.schemas);
        if let Some(type_name) = inferred.type_name {
            debug!("Variable {} inferred as {} ({:?})", name, type_name, inferred.strategy);
            self.var_types.insert(name.to_string(), type_name);
        }
    }
}

impl Visit for VariableTypeCollector<'_, '_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Var(specs) => {
                for spec in specs {
                    for (idx, name) in spec.names.iter().enumerate() {
                        match (&spec.ty, spec.values.get(idx)) {
                            (Some(ty), _) => {
                                let rendered = self.enhancer.symbols.canonical_type(ty);
                                self.var_types.insert(name.clone(), rendered);
                            }
                            (None, Some(value)) => self.record(name, value),
                            (None, None) => {}
                        }
                    }
                }
            }
            // `result, err := call()` binds the call's type to the first non-error name.
            Stmt::Define { lhs, rhs } if rhs.len() == 1 && matches!(rhs[0], Expr::Call { .. }) => {
                if let Some(name) = lhs
                    .iter()
                    .filter_map(Expr::as_ident)
                    .find(|name| *name != "err" && *name != "_")
                {
                    self.record(name, &rhs[0]);
                }
            }
            Stmt::Define { lhs, rhs } => {
                for (target, value) in lhs.iter().zip(rhs) {
                    if let Some(name) = target.as_ident() {
                        self.record(name, value);
                    }
                }
            }
            _ => {}
        }
        ast::walk_stmt(self, stmt);
    }
}

/// Second pass: recognizes the calls that describe parameters, bodies and responses.
struct CallAnalyzer<'e, 'a> {
    enhancer: &'e EndpointEnhancer<'a>,
    receiver: &'e str,
    schemas: &'e mut SchemaGenerator,
    var_types: &'e HashMap<String, String>,
    spec: &'e mut EndpointSpec,
}

impl CallAnalyzer<'_, '_> {
    fn analyze_call(&mut self, method: &str, args: &[Expr]) {
        match method {
            "Params" | "ParamsUID" | "ParamsUint64" | "ParamsInt" => {
                let index = if method == "Params" { 0 } else { 1 };
                if let Some(name) = args.get(index).and_then(Expr::string_literal) {
                    add_parameter(
                        &mut self.spec.parameters,
                        path_parameter(&name, param_schema(method)),
                    );
                }
            }
            "DeserializeFromFn" | "BodyParser" => {
                let index = if method == "BodyParser" { 0 } else { 1 };
                let Some(Expr::Unary { op, operand }) = args.get(index) else {
                    return;
                };
                if op != "&" {
                    return;
                }
                let type_name = match operand.as_ref() {
                    Expr::Composite { ty: Some(ty), .. } => {
                        Some(self.enhancer.symbols.canonical_type(ty))
                    }
                    Expr::Ident(name) => self.var_types.get(name).cloned(),
                    _ => None,
                };
                let schema = match type_name {
                    Some(type_name) => self.schemas.generate_schema(&type_name),
                    None => Schema::object(),
                };
                self.spec.request_body = Some(RequestBodySpec {
                    description: "Request body".to_string(),
                    required: true,
                    content_type: JSON_CONTENT_TYPE.to_string(),
                    schema,
                });
            }
            "Response" => self.analyze_response(args),
            "ParseQueryParameters" => add_parameter(
                &mut self.spec.parameters,
                ParameterSpec {
                    name: "query".to_string(),
                    location: ParameterLocation::Query,
                    required: false,
                    description: "Query parameters for filtering, sorting, and pagination"
                        .to_string(),
                    schema: Schema::object(),
                },
            ),
            "APIError" => {
                self.spec
                    .responses
                    .entry("400".to_string())
                    .or_insert_with(|| {
                        ResponseSpec::json("Bad request or error response", Schema::error_object())
                    });
            }
            _ => {}
        }
    }

    /// `Response(ctx)`, `Response(ctx, status)`, `Response(ctx, payload)` and
    /// `Response(ctx, status, payload)`.
    fn analyze_response(&mut self, args: &[Expr]) {
        let (status, payload) = match args {
            [] | [_] => {
                self.spec.responses.insert(
                    "204".to_string(),
                    ResponseSpec {
                        description: "No content".to_string(),
                        content_type: None,
                        schema: None,
                    },
                );
                return;
            }
            [_, status] if status.int_literal().is_some() => {
                let status = status.int_literal().unwrap_or("200").to_string();
                self.spec.responses.insert(
                    status,
                    ResponseSpec::json(
                        "Successful response",
                        Schema::typed("string").with_description("Returns \"Ok\""),
                    ),
                );
                return;
            }
            [_, status, payload, ..] if status.int_literal().is_some() => {
                (status.int_literal().unwrap_or("200").to_string(), payload)
            }
            [_, payload, ..] => ("200".to_string(), payload),
        };

        if is_error_payload(payload) {
            self.spec
                .responses
                .insert(status, ResponseSpec::json("Error response", Schema::error_object()));
            return;
        }

        let inferred = self
            .enhancer
            .infer_type(payload, self.receiver, self.var_types, self.schemas);
        let schema = match &inferred.type_name {
            Some(type_name) => self.schemas.generate_schema(type_name),
            None => Schema::object(),
        };
        debug!(
            "Response {} of {} inferred via {:?}",
            status, self.spec.handler, inferred.strategy
        );
        self.spec
            .responses
            .insert(status, ResponseSpec::json("Successful response", schema));
    }
}

impl Visit for CallAnalyzer<'_, '_> {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Call { func, args } = expr {
            if let Expr::Selector { field, .. } = func.as_ref() {
                self.analyze_call(field, args);
            }
        }
        ast::walk_expr(self, expr);
    }
}

/// `receiver.field.Method(..)` -> `(field, Method)`.
fn field_method_call(expr: &Expr) -> Option<(&str, &str)> {
    let Expr::Call { func, .. } = expr else {
        return None;
    };
    let Expr::Selector { operand, field: method } = func.as_ref() else {
        return None;
    };
    let Expr::Selector { field, .. } = operand.as_ref() else {
        return None;
    };
    Some((field, method))
}

fn strip_address_of(expr: &Expr) -> &Expr {
    match expr {
        Expr::Unary { op, operand } if op == "&" => strip_address_of(operand),
        Expr::Paren(inner) => strip_address_of(inner),
        other => other,
    }
}

/// Candidate response type names for a business method, most likely first.
pub fn naming_convention_candidates(method: &str) -> Vec<String> {
    let (entity, suffixes): (&str, &[&str]) = if let Some(entity) = method
        .strip_prefix("Create")
        .or_else(|| method.strip_prefix("Update"))
        .or_else(|| method.strip_prefix("Get"))
    {
        (entity, &["Response", "View", ""])
    } else if let Some(entity) = method.strip_prefix("List") {
        (entity, &["ListResponse", "List", "Response"])
    } else {
        (method, &["Response", ""])
    };

    suffixes
        .iter()
        .map(|suffix| format!("{}{}", entity, suffix))
        .filter(|candidate| !candidate.is_empty())
        .collect()
}

/// Identifiers holding errors: `err`, `validationErr`, `notFoundError`.
fn is_error_payload(expr: &Expr) -> bool {
    match expr.as_ident() {
        Some(name) => name == "err" || name.ends_with("Err") || name.ends_with("Error"),
        None => false,
    }
}

fn param_schema(method: &str) -> Schema {
    match method {
        "ParamsUID" => Schema::formatted("string", "uuid"),
        "ParamsUint64" => Schema::formatted("integer", "uint64"),
        "ParamsInt" => Schema::formatted("integer", "int64"),
        _ => Schema::typed("string"),
    }
}

fn path_parameter(name: &str, schema: Schema) -> ParameterSpec {
    ParameterSpec {
        name: name.to_string(),
        location: ParameterLocation::Path,
        required: true,
        description: format!("Path parameter: {}", name),
        schema,
    }
}

/// Adds `param` unless one with the same name and location is already present.
fn add_parameter(parameters: &mut Vec<ParameterSpec>, param: ParameterSpec) {
    let exists = parameters
        .iter()
        .any(|p| p.name == param.name && p.location == param.location);
    if !exists {
        parameters.push(param);
    }
}

/// Derives the security requirement implied by a middleware chain.
///
/// A `NotAuthenticated` entry makes the endpoint anonymous whatever else the chain contains.
pub fn extract_security(middleware: &[String]) -> Vec<SecurityRequirement> {
    if middleware.iter().any(|mw| mw.contains("NotAuthenticated")) {
        return Vec::new();
    }

    let authenticated = middleware.iter().any(|mw| mw.contains("Authenticated"));
    let mut scopes: Vec<String> = Vec::new();
    for scope in middleware.iter().flat_map(|mw| extract_permissions(mw)) {
        if !scopes.contains(&scope) {
            scopes.push(scope);
        }
    }

    if !authenticated {
        return Vec::new();
    }
    if scopes.is_empty() {
        vec![SecurityRequirement {
            name: BEARER_SCHEME.to_string(),
            scopes: Vec::new(),
        }]
    } else {
        vec![SecurityRequirement {
            name: PERMISSIONS_SCHEME.to_string(),
            scopes,
        }]
    }
}

/// Permission scopes passed to the recognized permission middleware calls in `middleware`.
pub fn extract_permissions(middleware: &str) -> Vec<String> {
    let mut permissions = Vec::new();

    for (prefix, multi_value) in PERMISSION_PATTERNS {
        let Some(idx) = middleware.find(prefix) else {
            continue;
        };
        let start = idx + prefix.len();
        let Some(args) = balanced_arguments(&middleware[start..]) else {
            continue;
        };

        if *multi_value {
            permissions.extend(args.split(',').filter_map(clean_permission_arg));
        } else {
            permissions.extend(clean_permission_arg(args));
        }
    }

    permissions
}

/// Text up to the parenthesis closing an already opened one.
fn balanced_arguments(text: &str) -> Option<&str> {
    let mut depth = 1usize;
    for (idx, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

fn clean_permission_arg(arg: &str) -> Option<String> {
    let arg = arg.trim();
    let arg = arg
        .strip_prefix('"')
        .and_then(|a| a.strip_suffix('"'))
        .or_else(|| arg.strip_prefix('\'').and_then(|a| a.strip_suffix('\'')))
        .unwrap_or(arg);
    if arg.is_empty() {
        return None;
    }

    let resolved = KNOWN_PERMISSION_CONSTANTS
        .iter()
        .find(|(constant, _)| *constant == arg)
        .map(|(_, value)| *value)
        .unwrap_or(arg);
    Some(resolved.to_string())
}

/// Tag for an endpoint: its first static path segment, title-cased, or the microservice name.
pub fn tag_for_path(path: &str, microservice: &str) -> String {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    if first.is_empty() || first.starts_with(':') {
        return microservice.to_string();
    }
    format_tag_name(first)
}

/// `user-profiles` -> `User Profiles`.
pub fn format_tag_name(segment: &str) -> String {
    segment
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{GoParser, ParsedFile};
    use crate::type_resolver::TypeResolver;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const CONTROLLER: &str = r#"
package ms_orders

import (
    obl "github.com/acme/shop/internal/domain/orders/orders_business_layer"
    "github.com/acme/shop/pkg/models/orders_models"
)

type ordersController struct {
    ordersBL *obl.OrdersBusinessLayer
}

// Create an order
// Validates the cart first.
// Then charges the customer.
func (c *ordersController) CreateOrder(ctx *fiber.Ctx) error {
    var req orders_models.CreateOrderRequest
    if err := serializer.DeserializeFromFn(ctx.BodyParser, &req); err != nil {
        return http.APIError(ctx, err)
    }
    order, err := c.ordersBL.CreateOrder(ctx.Context(), &req)
    if err != nil {
        return http.Response(ctx, 400, err)
    }
    return http.Response(ctx, 201, order)
}

func (c *ordersController) GetOrder(ctx *fiber.Ctx) error {
    id, err := http.ParamsUID(ctx, "id")
    if err != nil {
        return http.APIError(ctx, err)
    }
    order, err := c.ordersBL.GetOrder(ctx.Context(), id)
    if err != nil {
        return http.APIError(ctx, err)
    }
    return http.Response(ctx, order)
}

func (c *ordersController) ListOrders(ctx *fiber.Ctx) error {
    params := http.ParseQueryParameters(ctx)
    result, err := c.ordersBL.Search(ctx.Context(), params)
    if err != nil {
        return http.APIError(ctx, err)
    }
    return http.Response(ctx, result)
}

func (c *ordersController) DeleteOrder(ctx *fiber.Ctx) error {
    line, _ := http.ParamsInt(ctx, "line")
    _ = line
    return http.Response(ctx)
}

func (c *ordersController) Ping(ctx *fiber.Ctx) error {
    return http.Response(ctx, 200)
}

func (c *ordersController) Summary(ctx *fiber.Ctx) error {
    summary := orders_models.OrderSummary{}
    return http.Response(ctx, http.StatusOK, &summary)
}
"#;

    const BUSINESS_LAYER: &str = r#"
package orders_business_layer

type OrdersBusinessLayer struct{}

func (bl *OrdersBusinessLayer) CreateOrder(ctx context.Context, req *orders_models.CreateOrderRequest) (*orders_models.Order, error) {
    return nil, nil
}

func (bl *OrdersBusinessLayer) GetOrder(ctx context.Context, id uid.UID) (*orders_models.Order, error) {
    return nil, nil
}
"#;

    const MODELS: &str = r#"
package orders_models

type CreateOrderRequest struct {
    Items []string `json:"items"`
}

type Order struct {
    ID string `json:"id"`
}

type SearchResponse struct {
    Total int `json:"total"`
}

type OrderSummary struct {
    Count int `json:"count"`
}
"#;

    struct Fixture {
        symbols: SymbolTable,
        registry: BusinessLayerRegistry,
        schemas: SchemaGenerator,
    }

    fn parsed(path: &str, source: &str) -> ParsedFile {
        GoParser::parse_source(Path::new(path), source).unwrap()
    }

    fn fixture() -> Fixture {
        let symbols = SymbolTable::from_files(&[parsed("/ms/controller.go", CONTROLLER)]);
        let mut registry = BusinessLayerRegistry::default();
        registry.add_package(&[parsed("/domain/orders_business_layer/bl.go", BUSINESS_LAYER)]);
        let resolver = TypeResolver::from_files(
            Path::new("/models"),
            &[parsed("/models/orders/orders.go", MODELS)],
        );
        Fixture {
            symbols,
            registry,
            schemas: SchemaGenerator::new(resolver),
        }
    }

    fn raw(method: HttpMethod, path: &str, handler: &str, middleware: &[&str]) -> RawEndpoint {
        RawEndpoint {
            path: path.to_string(),
            method,
            handler: handler.to_string(),
            microservice: "ms_orders".to_string(),
            middleware: middleware.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn enhance(fixture: &mut Fixture, endpoint: &RawEndpoint) -> EndpointSpec {
        let enhancer = EndpointEnhancer::new(&fixture.symbols, &fixture.registry);
        enhancer.enhance(endpoint, &mut fixture.schemas)
    }

    #[test]
    fn test_request_body_and_business_layer_response() {
        let mut fixture = fixture();
        let spec = enhance(
            &mut fixture,
            &raw(HttpMethod::Post, "/orders", "CreateOrder", &["gates.IsAuthenticated"]),
        );

        assert_eq!(spec.summary.as_deref(), Some("Create an order"));
        assert_eq!(
            spec.description.as_deref(),
            Some("Validates the cart first.\nThen charges the customer.")
        );
        assert_eq!(spec.tags, vec!["Orders"]);
        assert_eq!(
            spec.request_body.as_ref().unwrap().schema,
            Schema::reference("CreateOrderRequest")
        );
        assert_eq!(
            spec.responses["201"].schema,
            Some(Schema::reference("Order"))
        );
        assert_eq!(spec.responses["400"].description, "Error response");
        assert_eq!(spec.responses["400"].schema, Some(Schema::error_object()));
        assert!(fixture.schemas.get_schemas().contains_key("Order"));
        assert!(fixture.schemas.get_schemas().contains_key("CreateOrderRequest"));
    }

    #[test]
    fn test_typed_path_parameter_not_duplicated() {
        let mut fixture = fixture();
        let spec = enhance(&mut fixture, &raw(HttpMethod::Get, "/orders/:id", "GetOrder", &[]));

        assert_eq!(spec.parameters.len(), 1);
        assert_eq!(spec.parameters[0].name, "id");
        assert_eq!(spec.parameters[0].location, ParameterLocation::Path);
        assert_eq!(spec.parameters[0].schema, Schema::formatted("string", "uuid"));
        assert_eq!(spec.responses["200"].schema, Some(Schema::reference("Order")));
        assert_eq!(
            spec.responses["400"].description,
            "Bad request or error response"
        );
    }

    #[test]
    fn test_query_parameters_and_naming_convention() {
        let mut fixture = fixture();
        let spec = enhance(&mut fixture, &raw(HttpMethod::Get, "/orders", "ListOrders", &[]));

        assert_eq!(spec.parameters.len(), 1);
        assert_eq!(spec.parameters[0].name, "query");
        assert_eq!(spec.parameters[0].location, ParameterLocation::Query);
        assert!(!spec.parameters[0].required);
        assert_eq!(
            spec.responses["200"].schema,
            Some(Schema::reference("SearchResponse"))
        );
    }

    #[test]
    fn test_empty_and_status_only_responses() {
        let mut fixture = fixture();
        let deleted = enhance(
            &mut fixture,
            &raw(HttpMethod::Delete, "/orders/:id/lines/:line", "DeleteOrder", &[]),
        );
        assert_eq!(deleted.responses.len(), 1);
        assert_eq!(deleted.responses["204"].content_type, None);
        let names: Vec<&str> = deleted.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["line", "id"]);
        assert_eq!(deleted.parameters[0].schema, Schema::formatted("integer", "int64"));

        let ping = enhance(&mut fixture, &raw(HttpMethod::Get, "/ping", "Ping", &[]));
        assert_eq!(
            ping.responses["200"].schema,
            Some(Schema::typed("string").with_description("Returns \"Ok\""))
        );
    }

    #[test]
    fn test_non_literal_status_uses_payload_position() {
        let mut fixture = fixture();
        let spec = enhance(&mut fixture, &raw(HttpMethod::Get, "/summary", "Summary", &[]));
        // `http.StatusOK` is not a literal, so the second argument is the payload.
        assert_eq!(spec.responses.len(), 1);
        assert_eq!(spec.responses["200"].schema, Some(Schema::object()));
    }

    #[test]
    fn test_missing_handler_degrades() {
        let mut fixture = fixture();
        let spec = enhance(
            &mut fixture,
            &raw(
                HttpMethod::Put,
                "/:tenant/orders/:id",
                "UpdateOrder",
                &["gates.IsAuthenticated", "gates.hasPermission(\"orders:write\")"],
            ),
        );

        assert_eq!(spec.tags, vec!["ms_orders"]);
        assert_eq!(spec.summary, None);
        assert_eq!(spec.parameters.len(), 2);
        assert_eq!(spec.responses["200"], ResponseSpec::default_success());
        assert_eq!(
            spec.security,
            vec![SecurityRequirement {
                name: PERMISSIONS_SCHEME.to_string(),
                scopes: vec!["orders:write".to_string()],
            }]
        );
    }

    #[test]
    fn test_inline_handler_degrades() {
        let mut fixture = fixture();
        let spec = enhance(&mut fixture, &raw(HttpMethod::Get, "/health", "<inline>", &[]));
        assert_eq!(spec.responses.len(), 1);
        assert!(spec.security.is_empty());
        assert_eq!(spec.tags, vec!["Health"]);
    }

    #[test]
    fn test_inference_strategy_order() {
        let fixture = fixture();
        let enhancer = EndpointEnhancer::new(&fixture.symbols, &fixture.registry);
        let var_types = HashMap::from([("req".to_string(), "orders_models.Order".to_string())]);
        let call = |operand: Expr, method: &str| Expr::Call {
            func: Box::new(Expr::Selector {
                operand: Box::new(operand),
                field: method.to_string(),
            }),
            args: vec![],
        };
        let bl_field = Expr::Selector {
            operand: Box::new(Expr::Ident("c".to_string())),
            field: "ordersBL".to_string(),
        };

        let declared = enhancer.infer_type(
            &Expr::Unary {
                op: "&".to_string(),
                operand: Box::new(Expr::Ident("req".to_string())),
            },
            "ordersController",
            &var_types,
            &fixture.schemas,
        );
        assert_eq!(declared.strategy, InferenceStrategy::DeclaredType);

        let business = enhancer.infer_type(
            &call(bl_field.clone(), "GetOrder"),
            "ordersController",
            &var_types,
            &fixture.schemas,
        );
        assert_eq!(business.strategy, InferenceStrategy::BusinessLayer);
        assert_eq!(business.type_name.as_deref(), Some("*orders_models.Order"));

        let naming = enhancer.infer_type(
            &call(bl_field.clone(), "Search"),
            "ordersController",
            &var_types,
            &fixture.schemas,
        );
        assert_eq!(naming.strategy, InferenceStrategy::NamingConvention);
        assert_eq!(naming.type_name.as_deref(), Some("SearchResponse"));

        let callee = enhancer.infer_type(
            &call(bl_field, "Archive"),
            "ordersController",
            &var_types,
            &fixture.schemas,
        );
        assert_eq!(callee.strategy, InferenceStrategy::CalleeName);
        assert_eq!(callee.type_name.as_deref(), Some("Archive"));

        let generic = enhancer.infer_type(
            &Expr::Ident("unknown".to_string()),
            "ordersController",
            &var_types,
            &fixture.schemas,
        );
        assert_eq!(generic.strategy, InferenceStrategy::GenericObject);
        assert_eq!(generic.type_name, None);
    }

    #[test]
    fn test_naming_convention_candidates() {
        assert_eq!(
            naming_convention_candidates("CreateDeal"),
            vec!["DealResponse", "DealView", "Deal"]
        );
        assert_eq!(
            naming_convention_candidates("ListDeals"),
            vec!["DealsListResponse", "DealsList", "DealsResponse"]
        );
        assert_eq!(
            naming_convention_candidates("Archive"),
            vec!["ArchiveResponse", "Archive"]
        );
    }

    #[test]
    fn test_security_anonymous_short_circuit() {
        let middleware = vec![
            "gates.IsAuthenticated".to_string(),
            "gates.hasPermission(\"orders:read\")".to_string(),
            "gates.NotAuthenticated".to_string(),
        ];
        assert!(extract_security(&middleware).is_empty());
    }

    #[test]
    fn test_security_scope_escalation() {
        let bearer = extract_security(&["gates.IsAuthenticated".to_string()]);
        assert_eq!(
            bearer,
            vec![SecurityRequirement {
                name: BEARER_SCHEME.to_string(),
                scopes: vec![],
            }]
        );

        let scoped = extract_security(&[
            "gates.IsAuthenticated".to_string(),
            "gates.AnyFeaturesOf(\"orders:read\", session_manager_models.SuperadminRoleFeature)"
                .to_string(),
        ]);
        assert_eq!(
            scoped,
            vec![SecurityRequirement {
                name: PERMISSIONS_SCHEME.to_string(),
                scopes: vec!["orders:read".to_string(), "superadmin".to_string()],
            }]
        );

        assert!(extract_security(&["cors.New()".to_string()]).is_empty());
    }

    #[test]
    fn test_extract_permissions_nested_parens() {
        assert_eq!(
            extract_permissions("gates.RequirePermissions(perm(\"a\"), 'b')"),
            vec!["perm(\"a\")", "b"]
        );
        assert!(extract_permissions("gates.hasPermission(").is_empty());
    }

    #[test]
    fn test_format_tag_name() {
        assert_eq!(format_tag_name("orders"), "Orders");
        assert_eq!(format_tag_name("user-profiles"), "User Profiles");
        assert_eq!(format_tag_name("BACK_office"), "Back Office");
        assert_eq!(tag_for_path("/", "ms_orders"), "ms_orders");
        assert_eq!(tag_for_path("/onboarding/step1", "ms_orders"), "Onboarding");
    }
}
