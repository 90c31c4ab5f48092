use crate::ast::{self, Expr, LitKind, Stmt, Visit};
use crate::extractor::{normalize_path, HttpMethod, RawEndpoint, RouteExtractor, INLINE_HANDLER};
use crate::parser::ParsedFile;
use log::debug;
use std::collections::HashMap;

/// Route extractor for Fiber-style routers.
///
/// Recognizes `x.Group(path, middleware...)` assignments and `x.Get(path, middleware...,
/// handler)` style registrations for every HTTP verb.
pub struct FiberExtractor;

impl RouteExtractor for FiberExtractor {
    fn extract_routes(&self, file: &ParsedFile, microservice: &str) -> Vec<RawEndpoint> {
        let mut visitor = RouteGraphVisitor::new(microservice);
        ast::walk_file(&mut visitor, &file.ast);
        debug!(
            "Found {} endpoints and {} groups in {}",
            visitor.endpoints.len(),
            visitor.groups.len(),
            file.path.display()
        );
        visitor.endpoints
    }
}

/// A variable bound to a router group.
#[derive(Debug, Clone, PartialEq)]
struct RouteGroup {
    full_path: String,
    middleware: Vec<String>,
}

/// Walks a file in source order, tracking groups and symbolic variable names.
struct RouteGraphVisitor<'a> {
    microservice: &'a str,
    groups: HashMap<String, RouteGroup>,
    variables: HashMap<String, String>,
    endpoints: Vec<RawEndpoint>,
}

impl<'a> RouteGraphVisitor<'a> {
    fn new(microservice: &'a str) -> Self {
        Self {
            microservice,
            groups: HashMap::new(),
            variables: HashMap::new(),
            endpoints: Vec::new(),
        }
    }

    fn handle_assignment(&mut self, var: &str, value: &Expr) {
        match value {
            Expr::Call { func, args } => {
                let Expr::Selector { operand, field } = func.as_ref() else {
                    return;
                };
                if field == "Group" && !args.is_empty() {
                    self.register_group(var, operand, args);
                } else {
                    self.variables.insert(var.to_string(), func.dotted());
                }
            }
            Expr::Selector { .. } => {
                self.variables.insert(var.to_string(), value.dotted());
            }
            _ => {}
        }
    }

    fn register_group(&mut self, var: &str, parent: &Expr, args: &[Expr]) {
        let own_path = args[0].string_literal().unwrap_or_default();
        let parent = parent.as_ident().and_then(|name| self.groups.get(name));

        let (full_path, mut middleware) = match parent {
            Some(parent) => (
                normalize_path(&parent.full_path, &own_path),
                parent.middleware.clone(),
            ),
            None => (normalize_path("", &own_path), Vec::new()),
        };
        middleware.extend(args[1..].iter().map(|arg| self.render_middleware(arg)));

        debug!("Group {} -> {} {:?}", var, full_path, middleware);
        self.groups.insert(
            var.to_string(),
            RouteGroup {
                full_path,
                middleware,
            },
        );
    }

    fn handle_route(&mut self, receiver: &Expr, method: HttpMethod, args: &[Expr]) {
        if args.len() < 2 {
            return;
        }

        // The handler is the last argument that looks like a function reference.
        let Some((handler_idx, handler)) = (1..args.len())
            .rev()
            .find_map(|idx| handler_name(&args[idx]).map(|name| (idx, name)))
        else {
            return;
        };

        let path = args[0].string_literal().unwrap_or_default();
        let group = receiver.as_ident().and_then(|name| self.groups.get(name));
        let (prefix, mut middleware) = match group {
            Some(group) => (group.full_path.clone(), group.middleware.clone()),
            None => (String::new(), Vec::new()),
        };
        middleware.extend(
            args[1..handler_idx]
                .iter()
                .map(|arg| self.render_middleware(arg)),
        );

        let path = if path.is_empty() { "/".to_string() } else { path };
        self.endpoints.push(RawEndpoint {
            path: normalize_path(&prefix, &path),
            method,
            handler,
            microservice: self.microservice.to_string(),
            middleware,
        });
    }

    /// Readable name of a middleware argument.
    fn render_middleware(&self, expr: &Expr) -> String {
        match expr {
            Expr::Ident(name) => self
                .variables
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.clone()),
            Expr::Call { func, args } => {
                let callee = match func.as_ref() {
                    Expr::Ident(name) => name.clone(),
                    other => other.dotted(),
                };
                let args: Vec<String> = args.iter().map(render_argument).collect();
                format!("{}({})", callee, args.join(", "))
            }
            Expr::Selector { .. } => expr.dotted(),
            Expr::FuncLit(_) => INLINE_HANDLER.to_string(),
            _ => "?".to_string(),
        }
    }
}

impl Visit for RouteGraphVisitor<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let Stmt::Define { lhs, rhs } | Stmt::Assign { lhs, rhs } = stmt {
            if let ([target], [value]) = (lhs.as_slice(), rhs.as_slice()) {
                if let Some(var) = target.as_ident() {
                    self.handle_assignment(var, value);
                }
            }
        }
        ast::walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Call { func, args } = expr {
            if let Expr::Selector { operand, field } = func.as_ref() {
                if let Some(method) = HttpMethod::from_verb(field) {
                    self.handle_route(operand, method, args);
                }
            }
        }
        ast::walk_expr(self, expr);
    }
}

/// Handler name for arguments that look like a function reference.
fn handler_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(name) => Some(name.clone()),
        Expr::Selector { field, .. } => Some(field.clone()),
        Expr::Call { .. } => expr.callee_name().map(str::to_string),
        Expr::FuncLit(_) => Some(INLINE_HANDLER.to_string()),
        Expr::Paren(inner) => handler_name(inner),
        _ => None,
    }
}

fn render_argument(expr: &Expr) -> String {
    match expr {
        Expr::BasicLit(lit) if lit.kind != LitKind::Imaginary => lit.value.clone(),
        Expr::Ident(name) => name.clone(),
        Expr::Selector { .. } => expr.dotted(),
        _ => "?".to_string(),
    }
}
