//! Per-directory symbol tables.
//!
//! Go scopes identifiers by package, and a package is a directory, so a controller's handlers,
//! route setup and struct declarations may sit in different files of the same directory. The
//! [`SymbolTable`] gathers what the endpoint enhancer needs from all of them in one pass.

use crate::ast::{FuncDecl, ImportSpec, TypeExpr};
use crate::parser::{GoParser, ParsedFile};
use crate::scanner::FileScanner;
use log::debug;
use std::collections::HashMap;
use std::path::Path;

/// Functions, import aliases and struct fields declared in one directory.
#[derive(Debug, Default)]
pub struct SymbolTable {
    functions: HashMap<String, FuncDecl>,
    imports: HashMap<String, String>,
    fields: HashMap<(String, String), String>,
}

impl SymbolTable {
    /// Parses every Go file directly inside `dir` and collects its symbols.
    ///
    /// Files that fail to parse are skipped.
    pub fn collect(dir: &Path) -> Self {
        let files: Vec<ParsedFile> = GoParser::parse_files(&FileScanner::files_in_dir(dir))
            .into_iter()
            .filter_map(|result| result.ok())
            .collect();
        let table = Self::from_files(&files);
        debug!(
            "Collected {} functions, {} imports, {} struct fields from {}",
            table.functions.len(),
            table.imports.len(),
            table.fields.len(),
            dir.display()
        );
        table
    }

    /// Builds the table from already parsed files, in the given order.
    pub fn from_files(files: &[ParsedFile]) -> Self {
        let mut table = Self::default();

        for file in files {
            let file_imports: HashMap<&str, &str> = file
                .ast
                .imports
                .iter()
                .map(|spec: &ImportSpec| (spec.local_name(), spec.package_name()))
                .collect();
            for (alias, package) in &file_imports {
                table.imports.insert(alias.to_string(), package.to_string());
            }

            for func in file.ast.functions() {
                table.functions.insert(func.name.clone(), func.clone());
            }

            let canonical = |package: &str| -> String {
                file_imports
                    .get(package)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| package.to_string())
            };
            for spec in file.ast.types() {
                let TypeExpr::Struct(fields) = &spec.ty else {
                    continue;
                };
                for field in fields {
                    let rendered = field.ty.map_packages(&canonical).to_string();
                    for name in &field.names {
                        table
                            .fields
                            .insert((spec.name.clone(), name.clone()), rendered.clone());
                    }
                }
            }
        }

        table
    }

    /// Looks up a function or method by name.
    pub fn function(&self, name: &str) -> Option<&FuncDecl> {
        self.functions.get(name)
    }

    /// Canonical package name behind an import alias.
    pub fn package_for_alias(&self, alias: &str) -> Option<&str> {
        self.imports.get(alias).map(String::as_str)
    }

    /// Declared type of `field` on struct `receiver`, with package aliases resolved.
    pub fn field_type(&self, receiver: &str, field: &str) -> Option<&str> {
        self.fields
            .get(&(receiver.to_string(), field.to_string()))
            .map(String::as_str)
    }

    /// Renders a type expression with package aliases replaced by canonical names.
    pub fn canonical_type(&self, ty: &TypeExpr) -> String {
        ty.map_packages(&|package: &str| {
            self.package_for_alias(package)
                .unwrap_or(package)
                .to_string()
        })
        .to_string()
    }
}
