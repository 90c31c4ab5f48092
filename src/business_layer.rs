use crate::error::{Error, Result};
use crate::parser::{GoParser, ParsedFile};
use crate::scanner::FileScanner;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Type name suffix marking a business-layer struct.
pub const BUSINESS_LAYER_TYPE_SUFFIX: &str = "BusinessLayer";

/// Declared result types of one business-layer method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub method_name: String,
    /// Result types in declaration order, rendered as Go source text
    pub return_types: Vec<String>,
}

impl MethodSignature {
    /// The first result type that is not an error.
    pub fn primary_return_type(&self) -> Option<&str> {
        self.return_types
            .iter()
            .map(String::as_str)
            .find(|ty| *ty != "error" && !ty.ends_with(".error"))
    }
}

/// Index of business-layer method signatures keyed by `(package, type)`.
///
/// Built once before endpoint enhancement starts and only read afterwards, so lookups never
/// touch the filesystem.
#[derive(Debug, Default)]
pub struct BusinessLayerRegistry {
    layers: HashMap<(String, String), HashMap<String, MethodSignature>>,
}

impl BusinessLayerRegistry {
    /// Scans every directory under `domain_root` whose name ends with `suffix`.
    ///
    /// # Errors
    ///
    /// Returns an error if `domain_root` is not a readable directory. Individual files that
    /// fail to parse are skipped.
    pub fn scan(domain_root: &Path, suffix: &str) -> Result<Self> {
        if !domain_root.is_dir() {
            return Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("domain directory not found: {}", domain_root.display()),
            )));
        }

        let mut registry = Self::default();
        for dir in FileScanner::new(domain_root.to_path_buf()).find_dirs_with_suffix(suffix) {
            let files: Vec<ParsedFile> = GoParser::parse_files(&FileScanner::files_in_dir(&dir))
                .into_iter()
                .filter_map(|result| result.ok())
                .collect();
            debug!("Scanning business layer {} ({} files)", dir.display(), files.len());
            registry.add_package(&files);
        }

        info!(
            "Business layer registry: {} layers, {} methods",
            registry.layers.len(),
            registry.method_count()
        );
        Ok(registry)
    }

    /// Registers the business-layer methods declared in the files of one package directory.
    pub fn add_package(&mut self, files: &[ParsedFile]) {
        let layer_types: HashSet<&str> = files
            .iter()
            .flat_map(|file| file.ast.types())
            .map(|spec| spec.name.as_str())
            .filter(|name| name.ends_with(BUSINESS_LAYER_TYPE_SUFFIX))
            .collect();
        if layer_types.is_empty() {
            return;
        }

        for file in files {
            for func in file.ast.functions() {
                let Some(receiver) = func.receiver_type() else {
                    continue;
                };
                if !layer_types.contains(receiver) {
                    continue;
                }

                let return_types = func
                    .results
                    .iter()
                    .flat_map(|field| {
                        let rendered = field.ty.to_string();
                        std::iter::repeat(rendered).take(field.names.len().max(1))
                    })
                    .collect();
                self.layers
                    .entry((file.ast.package.clone(), receiver.to_string()))
                    .or_default()
                    .insert(
                        func.name.clone(),
                        MethodSignature {
                            method_name: func.name.clone(),
                            return_types,
                        },
                    );
            }
        }
    }

    /// Non-error result type of `package.type_name.method`.
    ///
    /// When the package is unknown, any layer with the same type name is searched.
    pub fn get_method_return_type(
        &self,
        package: &str,
        type_name: &str,
        method: &str,
    ) -> Option<&str> {
        let exact = self
            .layers
            .get(&(package.to_string(), type_name.to_string()))
            .and_then(|methods| methods.get(method));

        let signature = match exact {
            Some(signature) => signature,
            None => {
                let mut candidates: Vec<_> = self
                    .layers
                    .iter()
                    .filter(|((_, ty), _)| ty == type_name)
                    .filter_map(|((pkg, _), methods)| methods.get(method).map(|m| (pkg, m)))
                    .collect();
                candidates.sort_by(|a, b| a.0.cmp(b.0));
                candidates.first()?.1
            }
        };
        signature.primary_return_type()
    }

    /// Resolves a method call through a field whose declared type is e.g.
    /// `*orders_business_layer.OrdersBusinessLayer`.
    pub fn lookup_method_by_field_type(&self, field_type: &str, method: &str) -> Option<&str> {
        let trimmed = field_type.trim_start_matches('*');
        let (package, type_name) = trimmed.split_once('.')?;
        if type_name.contains('.') {
            return None;
        }
        self.get_method_return_type(package, type_name, method)
    }

    pub fn method_count(&self) -> usize {
        self.layers.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
