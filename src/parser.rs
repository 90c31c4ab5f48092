use crate::ast::{
    unquote, BasicLit, Block, Decl, Expr, Field, File, FuncDecl, ImportSpec, LitKind, Receiver,
    Stmt, TypeExpr, TypeSpec, ValueSpec,
};
use crate::error::{Error, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Go source parser.
///
/// `GoParser` runs the tree-sitter Go grammar over a file and lowers the concrete syntax tree
/// into the owned [`ast::File`](crate::ast::File) model that the analysis passes work on.
/// A file whose tree contains any syntax error is rejected as a whole.
///
/// # Example
///
/// ```no_run
/// use openapi_from_go::parser::GoParser;
/// use std::path::Path;
///
/// let parsed = GoParser::parse_file(Path::new("internal/ms/ms_orders/controller.go")).unwrap();
/// println!("package {} has {} declarations", parsed.ast.package, parsed.ast.decls.len());
/// ```
pub struct GoParser;

/// A successfully parsed Go file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The lowered syntax tree
    pub ast: File,
}

impl GoParser {
    /// Reads and parses a single Go source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid Go syntax.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());
        let content = fs::read_to_string(path)?;
        let parsed = Self::parse_source(path, &content)?;
        debug!("Successfully parsed file: {}", path.display());
        Ok(parsed)
    }

    /// Parses Go source text that was already loaded from `path`.
    pub fn parse_source(path: &Path, source: &str) -> Result<ParsedFile> {
        let parse_error = |message: String| Error::ParseError {
            file: path.to_path_buf(),
            message,
        };

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| parse_error(format!("failed to load Go grammar: {}", e)))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| parse_error("parser returned no syntax tree".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_error(root) {
                Some(node) => {
                    let pos = node.start_position();
                    format!("syntax error at {}:{}", pos.row + 1, pos.column + 1)
                }
                None => "syntax error".to_string(),
            };
            return Err(parse_error(message));
        }

        let lowerer = Lowerer {
            source: source.as_bytes(),
        };
        Ok(ParsedFile {
            path: path.to_path_buf(),
            ast: lowerer.file(root),
        })
    }

    /// Parses multiple Go source files, continuing even if some fail.
    ///
    /// Returns one result per input path. Failures are logged as warnings so a single bad
    /// file never stops the scan.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| match Self::parse_file(path) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    Err(e)
                }
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

fn is_expression_kind(kind: &str) -> bool {
    kind.ends_with("_expression")
        || kind.ends_with("_literal")
        || matches!(
            kind,
            "identifier"
                | "blank_identifier"
                | "field_identifier"
                | "package_identifier"
                | "true"
                | "false"
                | "nil"
                | "iota"
        )
}

fn is_type_kind(kind: &str) -> bool {
    matches!(
        kind,
        "type_identifier"
            | "qualified_type"
            | "pointer_type"
            | "slice_type"
            | "array_type"
            | "implicit_length_array_type"
            | "map_type"
            | "generic_type"
            | "struct_type"
            | "interface_type"
            | "function_type"
            | "channel_type"
    )
}

/// Lowers tree-sitter nodes into [`crate::ast`] values.
struct Lowerer<'a> {
    source: &'a [u8],
}

impl<'a> Lowerer<'a> {
    fn text(&self, node: Node) -> String {
        node.utf8_text(self.source).unwrap_or_default().to_string()
    }

    fn field_text(&self, node: Node, field: &str) -> Option<String> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    fn named<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .collect();
        children
    }

    fn field_texts(&self, node: Node, field: &str) -> Vec<String> {
        let mut cursor = node.walk();
        let texts: Vec<String> = node
            .children_by_field_name(field, &mut cursor)
            .map(|n| self.text(n))
            .collect();
        texts
    }

    fn file(&self, root: Node) -> File {
        let mut file = File::default();
        for node in self.named(root) {
            match node.kind() {
                "package_clause" => {
                    if let Some(name) = self.named(node).first() {
                        file.package = self.text(*name);
                    }
                }
                "import_declaration" => {
                    for spec in self.specs(node, "import_spec") {
                        file.imports.push(ImportSpec {
                            alias: self.field_text(spec, "name"),
                            path: self
                                .field_text(spec, "path")
                                .map(|p| unquote(&p))
                                .unwrap_or_default(),
                        });
                    }
                }
                "function_declaration" | "method_declaration" => {
                    file.decls.push(Decl::Func(self.func(node)));
                }
                "type_declaration" => {
                    let group_doc = self.doc_comments(node);
                    for spec in self.named(node) {
                        if matches!(spec.kind(), "type_spec" | "type_alias") {
                            file.decls.push(Decl::Type(self.type_spec(spec, &group_doc)));
                        }
                    }
                }
                "const_declaration" => {
                    let specs = self.specs(node, "const_spec");
                    file.decls
                        .push(Decl::Const(specs.into_iter().map(|s| self.value_spec(s)).collect()));
                }
                "var_declaration" => {
                    file.decls.push(Decl::Var(self.var_specs(node)));
                }
                _ => {}
            }
        }
        file
    }

    /// Children of `kind`, looking one level into `*_list` wrappers.
    fn specs<'t>(&self, node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
        let mut found = Vec::new();
        for child in self.named(node) {
            if child.kind() == kind {
                found.push(child);
            } else if child.kind().ends_with("_list") {
                found.extend(self.named(child).into_iter().filter(|c| c.kind() == kind));
            }
        }
        found
    }

    fn var_specs(&self, node: Node) -> Vec<ValueSpec> {
        self.specs(node, "var_spec")
            .into_iter()
            .map(|s| self.value_spec(s))
            .collect()
    }

    fn func(&self, node: Node) -> FuncDecl {
        let receiver = node.child_by_field_name("receiver").and_then(|list| {
            self.named(list).into_iter().next().map(|param| Receiver {
                name: self.field_text(param, "name"),
                ty: param
                    .child_by_field_name("type")
                    .map(|t| self.type_expr(t))
                    .unwrap_or_else(|| TypeExpr::Other(String::new())),
            })
        });

        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.params(result),
            Some(result) => vec![Field {
                names: Vec::new(),
                ty: self.type_expr(result),
                tag: None,
                doc: Vec::new(),
            }],
            None => Vec::new(),
        };

        FuncDecl {
            name: self.field_text(node, "name").unwrap_or_default(),
            receiver,
            params: node
                .child_by_field_name("parameters")
                .map(|p| self.params(p))
                .unwrap_or_default(),
            results,
            body: node.child_by_field_name("body").map(|b| self.block(b)),
            doc: self.doc_comments(node),
            line: node.start_position().row + 1,
        }
    }

    fn params(&self, list: Node) -> Vec<Field> {
        self.named(list)
            .into_iter()
            .filter_map(|param| {
                let ty = self.type_expr(param.child_by_field_name("type")?);
                let ty = if param.kind() == "variadic_parameter_declaration" {
                    TypeExpr::Slice(Box::new(ty))
                } else {
                    ty
                };
                Some(Field {
                    names: self.field_texts(param, "name"),
                    ty,
                    tag: None,
                    doc: Vec::new(),
                })
            })
            .collect()
    }

    fn type_spec(&self, node: Node, group_doc: &[String]) -> TypeSpec {
        let own_doc = self.doc_comments(node);
        TypeSpec {
            name: self.field_text(node, "name").unwrap_or_default(),
            ty: node
                .child_by_field_name("type")
                .map(|t| self.type_expr(t))
                .unwrap_or_else(|| TypeExpr::Other(String::new())),
            doc: if own_doc.is_empty() {
                group_doc.to_vec()
            } else {
                own_doc
            },
            alias: node.kind() == "type_alias",
        }
    }

    fn value_spec(&self, node: Node) -> ValueSpec {
        ValueSpec {
            names: self.field_texts(node, "name"),
            ty: node.child_by_field_name("type").map(|t| self.type_expr(t)),
            values: self.expr_list(node.child_by_field_name("value")),
        }
    }

    fn type_expr(&self, node: Node) -> TypeExpr {
        let first_named = || self.named(node).into_iter().next();
        match node.kind() {
            "type_identifier" | "identifier" => TypeExpr::Named(self.text(node)),
            "qualified_type" => TypeExpr::Qualified {
                package: self.field_text(node, "package").unwrap_or_default(),
                name: self.field_text(node, "name").unwrap_or_default(),
            },
            "pointer_type" => match first_named() {
                Some(inner) => TypeExpr::Pointer(Box::new(self.type_expr(inner))),
                None => TypeExpr::Other(self.text(node)),
            },
            "slice_type" => match node.child_by_field_name("element") {
                Some(elem) => TypeExpr::Slice(Box::new(self.type_expr(elem))),
                None => TypeExpr::Other(self.text(node)),
            },
            "array_type" | "implicit_length_array_type" => {
                match node.child_by_field_name("element") {
                    Some(elem) => TypeExpr::Array {
                        len: self.field_text(node, "length").unwrap_or_default(),
                        elem: Box::new(self.type_expr(elem)),
                    },
                    None => TypeExpr::Other(self.text(node)),
                }
            }
            "map_type" => match (
                node.child_by_field_name("key"),
                node.child_by_field_name("value"),
            ) {
                (Some(key), Some(value)) => TypeExpr::Map {
                    key: Box::new(self.type_expr(key)),
                    value: Box::new(self.type_expr(value)),
                },
                _ => TypeExpr::Other(self.text(node)),
            },
            "generic_type" => match node.child_by_field_name("type") {
                Some(base) => TypeExpr::Generic {
                    base: Box::new(self.type_expr(base)),
                    args: node
                        .child_by_field_name("type_arguments")
                        .map(|args| {
                            self.named(args)
                                .into_iter()
                                .map(|arg| self.type_expr(arg))
                                .collect()
                        })
                        .unwrap_or_default(),
                },
                None => TypeExpr::Other(self.text(node)),
            },
            "type_elem" | "parenthesized_type" => match first_named() {
                Some(inner) => self.type_expr(inner),
                None => TypeExpr::Other(self.text(node)),
            },
            "struct_type" => TypeExpr::Struct(
                first_named()
                    .map(|list| self.struct_fields(list))
                    .unwrap_or_default(),
            ),
            "interface_type" => TypeExpr::Interface,
            "function_type" => TypeExpr::Func,
            "channel_type" => match node.child_by_field_name("value").or_else(first_named) {
                Some(inner) => TypeExpr::Chan(Box::new(self.type_expr(inner))),
                None => TypeExpr::Other(self.text(node)),
            },
            _ => TypeExpr::Other(self.text(node)),
        }
    }

    fn struct_fields(&self, list: Node) -> Vec<Field> {
        self.named(list)
            .into_iter()
            .filter(|decl| decl.kind() == "field_declaration")
            .filter_map(|decl| {
                Some(Field {
                    names: self.field_texts(decl, "name"),
                    ty: self.type_expr(decl.child_by_field_name("type")?),
                    tag: self.field_text(decl, "tag").map(|t| unquote(&t)),
                    doc: self.doc_comments(decl),
                })
            })
            .collect()
    }

    /// Comment lines directly above `node`, with markers stripped.
    ///
    /// A comment that trails code on its own line belongs to that code and ends the run.
    fn doc_comments(&self, node: Node) -> Vec<String> {
        let mut comments = Vec::new();
        let mut next_row = node.start_position().row;
        let mut current = node.prev_named_sibling();
        while let Some(sibling) = current {
            if sibling.kind() != "comment" || sibling.end_position().row + 1 < next_row {
                break;
            }
            let trailing = sibling
                .prev_named_sibling()
                .map(|p| {
                    p.kind() != "comment" && p.end_position().row == sibling.start_position().row
                })
                .unwrap_or(false);
            if trailing {
                break;
            }
            comments.push(sibling);
            next_row = sibling.start_position().row;
            current = sibling.prev_named_sibling();
        }

        comments
            .into_iter()
            .rev()
            .flat_map(|comment| clean_comment(&self.text(comment)))
            .collect()
    }

    fn block(&self, node: Node) -> Block {
        let mut stmts = Vec::new();
        for child in self.named(node) {
            if child.kind() == "statement_list" {
                stmts.extend(self.block(child));
            } else {
                stmts.push(self.stmt(child));
            }
        }
        stmts
    }

    fn stmt(&self, node: Node) -> Stmt {
        match node.kind() {
            "short_var_declaration" => Stmt::Define {
                lhs: self.expr_list(node.child_by_field_name("left")),
                rhs: self.expr_list(node.child_by_field_name("right")),
            },
            "assignment_statement" => Stmt::Assign {
                lhs: self.expr_list(node.child_by_field_name("left")),
                rhs: self.expr_list(node.child_by_field_name("right")),
            },
            "var_declaration" => Stmt::Var(self.var_specs(node)),
            "return_statement" => Stmt::Return(
                self.named(node)
                    .into_iter()
                    .flat_map(|child| self.expr_list(Some(child)))
                    .collect(),
            ),
            "expression_statement" | "go_statement" | "defer_statement" => {
                match self.named(node).into_iter().next() {
                    Some(inner) => Stmt::Expr(self.expr(inner)),
                    None => Stmt::Block(Vec::new()),
                }
            }
            "block" | "statement_list" => Stmt::Block(self.block(node)),
            kind if is_expression_kind(kind) => Stmt::Expr(self.expr(node)),
            _ => Stmt::Block(self.named(node).into_iter().map(|c| self.stmt(c)).collect()),
        }
    }

    fn expr_list(&self, node: Option<Node>) -> Vec<Expr> {
        match node {
            Some(list) if list.kind() == "expression_list" => {
                self.named(list).into_iter().map(|e| self.expr(e)).collect()
            }
            Some(single) => vec![self.expr(single)],
            None => Vec::new(),
        }
    }

    fn lit(&self, kind: LitKind, node: Node) -> Expr {
        Expr::BasicLit(BasicLit {
            kind,
            value: self.text(node),
        })
    }

    fn expr(&self, node: Node) -> Expr {
        let boxed = |field: &str| {
            Box::new(
                node.child_by_field_name(field)
                    .map(|n| self.expr(n))
                    .unwrap_or(Expr::Other(Vec::new())),
            )
        };

        match node.kind() {
            "identifier" | "blank_identifier" | "field_identifier" | "package_identifier"
            | "true" | "false" | "nil" | "iota" => Expr::Ident(self.text(node)),
            "interpreted_string_literal" | "raw_string_literal" => self.lit(LitKind::String, node),
            "int_literal" => self.lit(LitKind::Int, node),
            "float_literal" => self.lit(LitKind::Float, node),
            "imaginary_literal" => self.lit(LitKind::Imaginary, node),
            "rune_literal" => self.lit(LitKind::Char, node),
            "selector_expression" => Expr::Selector {
                operand: boxed("operand"),
                field: self.field_text(node, "field").unwrap_or_default(),
            },
            "call_expression" => Expr::Call {
                func: boxed("function"),
                args: node
                    .child_by_field_name("arguments")
                    .map(|args| self.named(args).into_iter().map(|a| self.expr(a)).collect())
                    .unwrap_or_default(),
            },
            "composite_literal" => Expr::Composite {
                ty: node.child_by_field_name("type").map(|t| self.type_expr(t)),
                elts: node
                    .child_by_field_name("body")
                    .map(|body| self.elements(body))
                    .unwrap_or_default(),
            },
            "unary_expression" => Expr::Unary {
                op: self.field_text(node, "operator").unwrap_or_default(),
                operand: boxed("operand"),
            },
            "binary_expression" => Expr::Binary {
                left: boxed("left"),
                op: self.field_text(node, "operator").unwrap_or_default(),
                right: boxed("right"),
            },
            "func_literal" => Expr::FuncLit(
                node.child_by_field_name("body")
                    .map(|b| self.block(b))
                    .unwrap_or_default(),
            ),
            "index_expression" => Expr::Index {
                operand: boxed("operand"),
                indices: node
                    .child_by_field_name("index")
                    .map(|i| vec![self.expr(i)])
                    .unwrap_or_default(),
            },
            "parenthesized_expression" => match self.named(node).into_iter().next() {
                Some(inner) => Expr::Paren(Box::new(self.expr(inner))),
                None => Expr::Other(Vec::new()),
            },
            kind if is_type_kind(kind) => Expr::Type(self.type_expr(node)),
            _ => Expr::Other(self.named(node).into_iter().map(|c| self.expr(c)).collect()),
        }
    }

    fn elements(&self, literal_value: Node) -> Vec<Expr> {
        self.named(literal_value)
            .into_iter()
            .map(|element| self.element(element))
            .collect()
    }

    fn element(&self, node: Node) -> Expr {
        match node.kind() {
            "literal_value" => Expr::Composite {
                ty: None,
                elts: self.elements(node),
            },
            "literal_element" => match self.named(node).into_iter().next() {
                Some(inner) => self.element(inner),
                None => Expr::Other(Vec::new()),
            },
            "keyed_element" => Expr::Other(
                self.named(node)
                    .into_iter()
                    .map(|part| self.element(part))
                    .collect(),
            ),
            _ => self.expr(node),
        }
    }
}

/// Strips `//`, `/*` and `*/` markers and drops blank lines.
fn clean_comment(text: &str) -> Vec<String> {
    let body = if let Some(line) = text.strip_prefix("//") {
        line.to_string()
    } else {
        text.trim_start_matches("/*")
            .trim_end_matches("*/")
            .to_string()
    };
    body.lines()
        .map(|line| line.trim().trim_start_matches('*').trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
