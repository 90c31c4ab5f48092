//! Route extraction from Go controller source.
//!
//! A route extractor walks one parsed file and returns every HTTP endpoint registered in it,
//! with the full path, the handler reference and the middleware chain in effect. Extractors
//! are pure functions of the syntax tree; handler bodies are analysed later by the
//! [`enhancer`](crate::enhancer).
//!
//! # Supported Frameworks
//!
//! - **Fiber** and Fiber-like routers: See [`fiber::FiberExtractor`]
//!
//! # Example
//!
//! ```no_run
//! use openapi_from_go::extractor::{RouteExtractor, fiber::FiberExtractor};
//! use openapi_from_go::parser::GoParser;
//! use std::path::Path;
//!
//! let parsed = GoParser::parse_file(Path::new("internal/ms/ms_orders/http.go")).unwrap();
//! let endpoints = FiberExtractor.extract_routes(&parsed, "ms_orders");
//! println!("Found {} endpoints", endpoints.len());
//! ```

pub mod fiber;

use crate::parser::ParsedFile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel handler name for anonymous function literals.
pub const INLINE_HANDLER: &str = "<inline>";

/// Trait for extracting endpoints from a parsed Go file.
pub trait RouteExtractor {
    /// Extracts every endpoint registered in `file`, in source order.
    ///
    /// `microservice` is recorded on each endpoint as its origin.
    fn extract_routes(&self, file: &ParsedFile, microservice: &str) -> Vec<RawEndpoint>;
}

/// One HTTP verb registration found in route setup code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEndpoint {
    /// Full path in router syntax, e.g. `/v1/orders/:id`
    pub path: String,
    pub method: HttpMethod,
    /// Handler function or method name, or [`INLINE_HANDLER`]
    pub handler: String,
    pub microservice: String,
    /// Inherited group middleware followed by the endpoint's own
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middleware: Vec<String>,
}

impl RawEndpoint {
    /// Whether the handler is an anonymous function literal.
    pub fn is_inline(&self) -> bool {
        self.handler == INLINE_HANDLER
    }

    /// The path with `:name` segments rewritten to `{name}`.
    pub fn openapi_path(&self) -> String {
        to_openapi_path(&self.path)
    }
}

/// HTTP methods a router can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Maps a router method name such as `Post` to its verb.
    pub fn from_verb(name: &str) -> Option<Self> {
        match name {
            "Get" => Some(HttpMethod::Get),
            "Post" => Some(HttpMethod::Post),
            "Put" => Some(HttpMethod::Put),
            "Delete" => Some(HttpMethod::Delete),
            "Patch" => Some(HttpMethod::Patch),
            "Head" => Some(HttpMethod::Head),
            "Options" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Joins a group prefix and a path suffix.
///
/// The prefix loses a trailing slash and the suffix gains a leading one. An empty pair yields
/// `/`, and a bare `/` suffix resolves to the prefix itself.
pub fn normalize_path(prefix: &str, path: &str) -> String {
    if prefix.is_empty() && path.is_empty() {
        return "/".to_string();
    }
    if prefix.is_empty() {
        return with_leading_slash(path);
    }
    if path.is_empty() || path == "/" {
        return with_leading_slash(prefix);
    }

    let prefix = prefix.trim_end_matches('/');
    let path = with_leading_slash(path);
    if prefix.is_empty() {
        path
    } else {
        format!("{}{}", prefix, path)
    }
}

fn with_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Rewrites `:name` path segments (and optional `:name?`) to `{name}`.
pub fn to_openapi_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name.trim_end_matches('?')),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Names of the `:name` segments of a router path, in order.
pub fn path_parameter_names(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix(':'))
        .map(|name| name.trim_end_matches('?').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
