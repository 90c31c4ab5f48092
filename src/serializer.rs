//! Serialization of the generator outputs.
//!
//! Both the endpoint inventory and the OpenAPI document can be written as YAML, as pretty
//! printed JSON, or as a plain text table for quick inspection in a terminal.

use crate::extractor::RawEndpoint;
use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serializes a value to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use openapi_from_go::openapi_builder::OpenApiBuilder;
/// use openapi_from_go::schema_generator::SchemaGenerator;
/// use openapi_from_go::serializer::serialize_yaml;
/// use openapi_from_go::type_resolver::TypeResolver;
/// use std::path::Path;
///
/// let schema_gen = SchemaGenerator::new(TypeResolver::from_files(Path::new("pkg/models"), &[]));
/// let doc = OpenApiBuilder::new().build(schema_gen);
/// let yaml = serialize_yaml(&doc).unwrap();
/// assert!(yaml.contains("openapi: 3.0.0"));
/// ```
pub fn serialize_yaml<T: Serialize>(value: &T) -> Result<String> {
    debug!("Serializing to YAML");
    serde_yaml::to_string(value).context("Failed to serialize to YAML")
}

/// Serializes a value to JSON format with pretty printing.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    debug!("Serializing to JSON");
    serde_json::to_string_pretty(value).context("Failed to serialize to JSON")
}

/// Renders the endpoint inventory as an aligned text table.
pub fn render_endpoint_table(endpoints: &[RawEndpoint]) -> String {
    let rows: Vec<Vec<String>> = endpoints
        .iter()
        .map(|endpoint| {
            vec![
                endpoint.microservice.clone(),
                endpoint.method.to_string(),
                endpoint.path.clone(),
                endpoint.handler.clone(),
                endpoint.middleware.join(", "),
            ]
        })
        .collect();
    let mut table = render_table(
        &["MICROSERVICE", "METHOD", "PATH", "HANDLER", "MIDDLEWARE"],
        &rows,
    );
    table.push_str(&format!("\n{} endpoints\n", endpoints.len()));
    table
}

/// Renders one row per operation of an OpenAPI document.
pub fn render_operation_table(doc: &OpenApiDocument) -> String {
    let rows: Vec<Vec<String>> = doc
        .paths
        .iter()
        .flat_map(|(path, item)| {
            item.operations().into_iter().map(move |(method, operation)| {
                let security = operation
                    .security
                    .iter()
                    .flat_map(|requirement| requirement.iter())
                    .map(|(name, scopes)| {
                        if scopes.is_empty() {
                            name.clone()
                        } else {
                            format!("{}({})", name, scopes.join(" "))
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                vec![
                    method.to_string(),
                    path.clone(),
                    operation.operation_id.clone(),
                    operation.tags.join(", "),
                    operation.responses.keys().cloned().collect::<Vec<_>>().join(" "),
                    security,
                ]
            })
        })
        .collect();

    let mut table = render_table(
        &["METHOD", "PATH", "OPERATION", "TAGS", "RESPONSES", "SECURITY"],
        &rows,
    );
    table.push_str(&format!(
        "\n{} operations, {} schemas\n",
        rows.len(),
        doc.components.schemas.len()
    ));
    table
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}\n", line.trim_end())
    };

    let mut out = format_row(headers.to_vec());
    let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format_row(dashes.iter().map(String::as_str).collect()));
    for row in rows {
        out.push_str(&format_row(row.iter().map(String::as_str).collect()));
    }
    out
}

/// Writes string content to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does. Missing parent
/// directories are created.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
