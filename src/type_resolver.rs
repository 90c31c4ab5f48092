use crate::ast::{Expr, Field, LitKind, TypeExpr, TypeSpec, ValueSpec};
use crate::parser::{GoParser, ParsedFile};
use crate::scanner::{FileScanner, ScanFilter};
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Type resolver - indexes Go type declarations under the models root.
///
/// The index is built from one full walk of the models directory. Lookups afterwards are
/// pure reads, so schema generation never interleaves file I/O with its cycle bookkeeping.
pub struct TypeResolver {
    models_root: PathBuf,
    /// Declarations by type name; several packages may declare the same name
    declarations: HashMap<String, Vec<TypeDeclaration>>,
}

/// A type declaration found under the models root.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub name: String,
    /// Package clause of the declaring file
    pub package: String,
    /// Directory of the declaring file
    pub dir: PathBuf,
    /// Doc comment of the declaration
    pub description: Option<String>,
    pub kind: TypeKind,
}

/// Type kind - how a declaration maps onto a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// A struct with serializable fields
    Struct(StructDef),
    /// A named primitive following the `...Enum` naming convention
    Enum(EnumDef),
    /// Any other named type; the schema is the aliased type's schema
    Alias(TypeExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub fields: Vec<FieldDef>,
}

/// Field definition in a struct
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Serialized name from the `json` tag
    pub json_name: String,
    pub ty: TypeExpr,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    /// Underlying type as written, e.g. `string` or `state.Status`
    pub underlying: String,
    /// Values of typed constants declared in the same file
    pub values: Vec<serde_json::Value>,
}

/// Name suffix that marks a named primitive as an enumeration.
pub const ENUM_TYPE_SUFFIX: &str = "Enum";

impl TypeResolver {
    /// Walks every non-test Go file under `models_root` and indexes its type declarations.
    ///
    /// Unparsable files are skipped. A missing models root yields an empty index.
    pub fn build(models_root: &Path) -> Self {
        let scan = FileScanner::new(models_root.to_path_buf()).scan(ScanFilter::Sources);
        let files: Vec<ParsedFile> = GoParser::parse_files(&scan.go_files)
            .into_iter()
            .filter_map(|result| result.ok())
            .collect();
        let resolver = Self::from_files(models_root, &files);
        info!(
            "Indexed {} model types from {} files under {}",
            resolver.len(),
            files.len(),
            models_root.display()
        );
        resolver
    }

    /// Builds the index from already parsed files located under `models_root`.
    pub fn from_files(models_root: &Path, files: &[ParsedFile]) -> Self {
        let mut declarations: HashMap<String, Vec<TypeDeclaration>> = HashMap::new();

        for file in files {
            let dir = file
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let consts: Vec<&ValueSpec> = file.ast.consts().collect();

            for spec in file.ast.types() {
                let declaration = TypeDeclaration {
                    name: spec.name.clone(),
                    package: file.ast.package.clone(),
                    dir: dir.clone(),
                    description: join_doc(&spec.doc),
                    kind: classify(spec, &consts),
                };
                debug!("Indexed type {}.{}", declaration.package, declaration.name);
                declarations
                    .entry(spec.name.clone())
                    .or_default()
                    .push(declaration);
            }
        }

        Self {
            models_root: models_root.to_path_buf(),
            declarations,
        }
    }

    /// Finds the declaration of `name`.
    ///
    /// A package qualifier selects `<models_root>/<package without _models>`; otherwise a
    /// declaration in `context_dir` is preferred. Falls back to any declaration of the name.
    pub fn find(
        &self,
        package: Option<&str>,
        name: &str,
        context_dir: Option<&Path>,
    ) -> Option<&TypeDeclaration> {
        let candidates = self.declarations.get(name)?;

        if let Some(package) = package {
            let package_dir = self.package_dir(package);
            if let Some(found) = candidates
                .iter()
                .find(|decl| decl.dir.starts_with(&package_dir) || decl.package == package)
            {
                return Some(found);
            }
        }
        if let Some(context) = context_dir {
            if let Some(found) = candidates.iter().find(|decl| decl.dir == context) {
                return Some(found);
            }
        }
        candidates.first()
    }

    /// Whether any model package declares `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// Directory holding a model package: `orders_models` lives in `<root>/orders`.
    pub fn package_dir(&self, package: &str) -> PathBuf {
        let dir = package.strip_suffix("_models").unwrap_or(package);
        self.models_root.join(dir)
    }

    pub fn len(&self) -> usize {
        self.declarations.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

fn classify(spec: &TypeSpec, consts: &[&ValueSpec]) -> TypeKind {
    match &spec.ty {
        TypeExpr::Struct(fields) => TypeKind::Struct(StructDef {
            fields: fields.iter().filter_map(parse_field).collect(),
        }),
        underlying @ (TypeExpr::Named(_) | TypeExpr::Qualified { .. })
            if spec.name.ends_with(ENUM_TYPE_SUFFIX) =>
        {
            TypeKind::Enum(EnumDef {
                underlying: underlying.to_string(),
                values: enum_values(&spec.name, consts),
            })
        }
        other => TypeKind::Alias(other.clone()),
    }
}

/// Reads the `json` and `validate` tags of a struct field.
///
/// Fields without a `json` tag, tagged `-`, or with an empty tag name are not serialized.
pub(crate) fn parse_field(field: &Field) -> Option<FieldDef> {
    let json = field.tag_value("json")?;
    let mut parts = json.split(',');
    let tag_name = parts.next().unwrap_or_default();
    let omit_empty = parts.any(|option| option == "omitempty");

    if tag_name.is_empty() || tag_name == "-" {
        return None;
    }
    let json_name = tag_name.to_string();

    let validated_required = field
        .tag_value("validate")
        .map(|rules| rules.split(',').any(|rule| rule.trim() == "required"))
        .unwrap_or(false);

    Some(FieldDef {
        json_name,
        ty: field.ty.clone(),
        required: !omit_empty || validated_required,
        description: join_doc(&field.doc),
    })
}

/// Values of constants explicitly typed as `type_name`.
fn enum_values(type_name: &str, consts: &[&ValueSpec]) -> Vec<serde_json::Value> {
    consts
        .iter()
        .filter(|spec| matches!(&spec.ty, Some(TypeExpr::Named(name)) if name == type_name))
        .flat_map(|spec| spec.values.iter())
        .filter_map(|value| match value {
            Expr::BasicLit(lit) if lit.kind == LitKind::String => {
                value.string_literal().map(serde_json::Value::String)
            }
            Expr::BasicLit(lit) if lit.kind == LitKind::Int => {
                lit.value.parse::<i64>().ok().map(serde_json::Value::from)
            }
            _ => None,
        })
        .collect()
}

fn join_doc(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}
