//! Go OpenAPI Generator - OpenAPI documentation from Go Fiber controllers.
//!
//! This library statically analyzes the source of a Go microservice project and produces an
//! endpoint inventory and an OpenAPI 3.0 document. Nothing is compiled or executed: route
//! registrations, handler bodies, business-layer signatures and model declarations are read
//! from syntax trees.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Finds microservice, controller, business-layer and model files
//! 2. [`parser`] - Parses Go source with tree-sitter into the owned [`ast`]
//! 3. [`extractor`] - Builds the route graph and emits raw endpoints
//! 4. [`symbols`] - Per-directory functions, import aliases and struct fields
//! 5. [`business_layer`] - Return types of business-layer methods
//! 6. [`enhancer`] - Infers parameters, bodies, responses and security for each endpoint
//! 7. [`type_resolver`] / [`schema_generator`] - Turns Go types into OpenAPI schemas
//! 8. [`openapi_builder`] - Assembles the document
//! 9. [`serializer`] - YAML, JSON and table output
//!
//! [`generator`] wires these together and [`config`] supplies the directory conventions.
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_go::config::GeneratorConfig;
//! use openapi_from_go::generator::{generate_document, DocumentOptions};
//! use openapi_from_go::serializer::serialize_yaml;
//! use std::path::Path;
//!
//! let root = Path::new("./backend");
//! let config = GeneratorConfig::load(root).unwrap();
//! let document = generate_document(root, &config, &DocumentOptions::default());
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```

pub mod ast;
pub mod business_layer;
pub mod cli;
pub mod config;
pub mod enhancer;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod openapi_builder;
pub mod parser;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod symbols;
pub mod type_resolver;
