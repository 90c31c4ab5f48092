//! Pipeline entry points.
//!
//! [`extract_endpoints`] produces the raw endpoint inventory, [`generate_document`] runs the
//! whole analysis and returns the assembled OpenAPI document. Both tolerate bad input files:
//! unparsable sources are skipped with a warning and the run continues.

use crate::business_layer::BusinessLayerRegistry;
use crate::config::GeneratorConfig;
use crate::enhancer::EndpointEnhancer;
use crate::extractor::fiber::FiberExtractor;
use crate::extractor::{RawEndpoint, RouteExtractor};
use crate::openapi_builder::{OpenApiBuilder, OpenApiDocument};
use crate::parser::GoParser;
use crate::scanner::{FileScanner, Microservice, ScanFilter};
use crate::schema_generator::SchemaGenerator;
use crate::symbols::SymbolTable;
use crate::type_resolver::TypeResolver;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Document-level settings for [`generate_document`].
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOptions {
    /// Explicit title; derived from the configuration or the `filters` when absent
    pub title: Option<String>,
    pub version: String,
    pub description: Option<String>,
    /// Substring filters on microservice directory names
    pub filters: Vec<String>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            title: None,
            version: "1.0.0".to_string(),
            description: None,
            filters: Vec::new(),
        }
    }
}

impl DocumentOptions {
    /// The title written into `info.title`.
    ///
    /// An explicit title wins. Otherwise a single microservice filter names the document after
    /// that service, and the configured title is used as the last resort.
    pub fn effective_title(&self, config: &GeneratorConfig) -> String {
        if let Some(title) = self.title.as_ref().filter(|t| **t != config.openapi_title) {
            return title.clone();
        }
        match self.filters.as_slice() {
            [single] => format_microservice_title(single, &config.microservice_prefix),
            _ => self
                .title
                .clone()
                .unwrap_or_else(|| config.openapi_title.clone()),
        }
    }
}

/// Turns a microservice directory name into a document title.
///
/// ```
/// use openapi_from_go::generator::format_microservice_title;
///
/// assert_eq!(format_microservice_title("ms_orders_service", "ms_"), "Orders Service API");
/// ```
pub fn format_microservice_title(name: &str, prefix: &str) -> String {
    let trimmed = name.strip_prefix(prefix).unwrap_or(name);
    let words: Vec<String> = trimmed
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        "API".to_string()
    } else {
        format!("{} API", words.join(" "))
    }
}

/// Extracts the raw endpoint inventory of every selected microservice under `root`.
///
/// Endpoints are sorted by microservice and then path; registrations with equal keys keep
/// their source order.
pub fn extract_endpoints(
    root: &Path,
    config: &GeneratorConfig,
    filters: &[String],
) -> Vec<RawEndpoint> {
    let mut endpoints = Vec::new();
    for service in selected_microservices(root, config, filters) {
        for (_, service_endpoints) in controller_endpoints(&service) {
            endpoints.extend(service_endpoints);
        }
    }

    endpoints.sort_by(|a, b| {
        a.microservice
            .cmp(&b.microservice)
            .then_with(|| a.path.cmp(&b.path))
    });
    info!("Extracted {} endpoints", endpoints.len());
    endpoints
}

/// Runs the full analysis and assembles the OpenAPI document.
pub fn generate_document(
    root: &Path,
    config: &GeneratorConfig,
    options: &DocumentOptions,
) -> OpenApiDocument {
    info!("Step 1: Scanning business layers...");
    let registry = match BusinessLayerRegistry::scan(
        &config.domain_root(root),
        &config.business_layer_suffix,
    ) {
        Ok(registry) => registry,
        Err(e) => {
            warn!("Business layer scan failed, continuing without it: {}", e);
            BusinessLayerRegistry::default()
        }
    };

    info!("Step 2: Indexing model types...");
    let type_resolver = TypeResolver::build(&config.models_root(root));
    let mut schema_gen = SchemaGenerator::new(type_resolver);

    info!("Step 3: Analyzing controllers...");
    let mut builder = OpenApiBuilder::new()
        .with_info(
            options.effective_title(config),
            options.version.clone(),
            options.description.clone(),
        )
        .with_servers(&config.openapi_servers);

    let mut symbol_tables: HashMap<PathBuf, SymbolTable> = HashMap::new();
    let mut endpoint_count = 0;
    for service in selected_microservices(root, config, &options.filters) {
        for (file, endpoints) in controller_endpoints(&service) {
            let dir = file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| service.path.clone());
            let symbols = symbol_tables
                .entry(dir)
                .or_insert_with_key(|dir| SymbolTable::collect(dir));
            let enhancer = EndpointEnhancer::new(symbols, &registry);

            for endpoint in &endpoints {
                debug!("Adding endpoint: {} {}", endpoint.method, endpoint.path);
                let spec = enhancer.enhance(endpoint, &mut schema_gen);
                builder.add_endpoint(&spec);
                endpoint_count += 1;
            }
        }
    }

    if endpoint_count == 0 {
        warn!("No endpoints found under {}", config.microservice_root(root).display());
    }

    info!("Step 4: Assembling document...");
    builder.finalize_security_schemes(&config.oauth_authorize, &config.oauth_token);
    builder.build(schema_gen)
}

fn selected_microservices(
    root: &Path,
    config: &GeneratorConfig,
    filters: &[String],
) -> Vec<Microservice> {
    let services = FileScanner::new(config.microservice_root(root))
        .find_microservices(&config.microservice_prefix, filters);
    info!("Found {} microservices", services.len());
    services
}

/// Endpoints of every controller file of one service, grouped by file in scan order.
fn controller_endpoints(service: &Microservice) -> Vec<(PathBuf, Vec<RawEndpoint>)> {
    let scan = FileScanner::new(service.path.clone()).scan(ScanFilter::Controllers);
    debug!(
        "{}: {} controller files",
        service.name,
        scan.go_files.len()
    );

    scan.go_files
        .into_iter()
        .filter_map(|path| match GoParser::parse_file(&path) {
            Ok(parsed) => {
                let endpoints = FiberExtractor.extract_routes(&parsed, &service.name);
                Some((path, endpoints))
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_microservice_title() {
        assert_eq!(format_microservice_title("ms_orders", "ms_"), "Orders API");
        assert_eq!(
            format_microservice_title("ms_orders_service", "ms_"),
            "Orders Service API"
        );
        assert_eq!(format_microservice_title("billing", "ms_"), "Billing API");
        assert_eq!(format_microservice_title("ms_", "ms_"), "API");
    }

    #[test]
    fn test_effective_title() {
        let config = GeneratorConfig {
            openapi_title: "Shop API".to_string(),
            ..GeneratorConfig::default()
        };

        let options = DocumentOptions::default();
        assert_eq!(options.effective_title(&config), "Shop API");

        let options = DocumentOptions {
            filters: vec!["ms_orders".to_string()],
            ..DocumentOptions::default()
        };
        assert_eq!(options.effective_title(&config), "Orders API");

        let options = DocumentOptions {
            title: Some("Shop API".to_string()),
            filters: vec!["ms_orders".to_string()],
            ..DocumentOptions::default()
        };
        assert_eq!(options.effective_title(&config), "Orders API");

        let options = DocumentOptions {
            title: Some("Custom".to_string()),
            filters: vec!["ms_orders".to_string()],
            ..DocumentOptions::default()
        };
        assert_eq!(options.effective_title(&config), "Custom");

        let options = DocumentOptions {
            filters: vec!["orders".to_string(), "billing".to_string()],
            ..DocumentOptions::default()
        };
        assert_eq!(options.effective_title(&config), "Shop API");
    }
}
