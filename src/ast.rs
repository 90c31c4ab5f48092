//! Owned syntax model for the subset of Go the analyzer inspects.
//!
//! The [`parser`](crate::parser) module lowers a tree-sitter concrete syntax tree into these
//! types, so the analysis passes can pattern match on plain enums instead of walking raw
//! grammar nodes. Anything the analyzer never looks at is folded into an `Other` variant that
//! still keeps its nested expressions reachable for the [`Visit`] walkers.

use std::fmt;

/// One parsed Go source file.
#[derive(Debug, Clone, Default)]
pub struct File {
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

impl File {
    /// Iterates over every function and method declaration.
    pub fn functions(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Func(func) => Some(func),
            _ => None,
        })
    }

    /// Iterates over every type declaration.
    pub fn types(&self) -> impl Iterator<Item = &TypeSpec> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Type(spec) => Some(spec),
            _ => None,
        })
    }

    /// Iterates over every constant spec, grouped or not.
    pub fn consts(&self) -> impl Iterator<Item = &ValueSpec> {
        self.decls.iter().flat_map(|decl| match decl {
            Decl::Const(specs) => specs.as_slice(),
            _ => &[] as &[ValueSpec],
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub alias: Option<String>,
    pub path: String,
}

impl ImportSpec {
    /// The package name declared by the imported path, taken as its last segment.
    pub fn package_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// The name the importing file uses to refer to the package.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.package_name())
    }
}

#[derive(Debug, Clone)]
pub enum Decl {
    Func(FuncDecl),
    Type(TypeSpec),
    Const(Vec<ValueSpec>),
    Var(Vec<ValueSpec>),
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    pub receiver: Option<Receiver>,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    pub body: Option<Block>,
    /// Doc comment lines with comment markers removed.
    pub doc: Vec<String>,
    /// 1-based line of the declaration.
    pub line: usize,
}

impl FuncDecl {
    /// Name of the receiver type for methods, without pointer or type arguments.
    pub fn receiver_type(&self) -> Option<&str> {
        self.receiver.as_ref().and_then(|r| r.ty.base_name())
    }
}

#[derive(Debug, Clone)]
pub struct Receiver {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

/// A struct field, function parameter or function result.
#[derive(Debug, Clone)]
pub struct Field {
    /// Empty for embedded fields and unnamed parameters.
    pub names: Vec<String>,
    pub ty: TypeExpr,
    /// Raw struct tag without the surrounding quotes.
    pub tag: Option<String>,
    pub doc: Vec<String>,
}

impl Field {
    /// Value of `key` inside the struct tag, e.g. `json` in `json:"name,omitempty"`.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        let tag = self.tag.as_deref()?;
        let mut rest = tag;
        while let Some(colon) = rest.find(':') {
            let name = rest[..colon].trim();
            let after = &rest[colon + 1..];
            let after = after.strip_prefix('"')?;
            let end = after.find('"')?;
            if name == key {
                return Some(&after[..end]);
            }
            rest = &after[end + 1..];
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: String,
    pub ty: TypeExpr,
    pub doc: Vec<String>,
    /// `type A = B` rather than `type A B`.
    pub alias: bool,
}

/// One `const` or `var` spec: `a, b Type = x, y`.
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub names: Vec<String>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
}

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `a, b := x, y`
    Define { lhs: Vec<Expr>, rhs: Vec<Expr> },
    /// `a = x` and compound assignments.
    Assign { lhs: Vec<Expr>, rhs: Vec<Expr> },
    Var(Vec<ValueSpec>),
    Expr(Expr),
    Return(Vec<Expr>),
    /// Any compound statement (if, for, switch, plain blocks) flattened to its parts.
    Block(Block),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    String,
    Int,
    Float,
    Imaginary,
    Char,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicLit {
    pub kind: LitKind,
    /// Literal text exactly as written, quotes included.
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident(String),
    BasicLit(BasicLit),
    Selector { operand: Box<Expr>, field: String },
    Call { func: Box<Expr>, args: Vec<Expr> },
    Composite { ty: Option<TypeExpr>, elts: Vec<Expr> },
    Unary { op: String, operand: Box<Expr> },
    Binary { left: Box<Expr>, op: String, right: Box<Expr> },
    FuncLit(Block),
    Index { operand: Box<Expr>, indices: Vec<Expr> },
    Paren(Box<Expr>),
    /// A type used in expression position, e.g. the first argument of `make`.
    Type(TypeExpr),
    Other(Vec<Expr>),
}

impl Expr {
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Unquoted value of a string literal.
    pub fn string_literal(&self) -> Option<String> {
        match self {
            Expr::BasicLit(lit) if lit.kind == LitKind::String => Some(unquote(&lit.value)),
            _ => None,
        }
    }

    pub fn int_literal(&self) -> Option<&str> {
        match self {
            Expr::BasicLit(lit) if lit.kind == LitKind::Int => Some(&lit.value),
            _ => None,
        }
    }

    /// Dotted rendering of identifier and selector chains; calls render as `f()`.
    pub fn dotted(&self) -> String {
        match self {
            Expr::Ident(name) => name.clone(),
            Expr::Selector { operand, field } => format!("{}.{}", operand.dotted(), field),
            Expr::Call { func, .. } => format!("{}()", func.dotted()),
            _ => "?".to_string(),
        }
    }

    /// Name of the called function for `f(..)` and `x.f(..)`.
    pub fn callee_name(&self) -> Option<&str> {
        match self {
            Expr::Call { func, .. } => match func.as_ref() {
                Expr::Ident(name) => Some(name),
                Expr::Selector { field, .. } => Some(field),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Strips Go string literal quoting and resolves the common escapes.
pub fn unquote(literal: &str) -> String {
    if let Some(raw) = literal.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        return raw.to_string();
    }
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Named(String),
    Qualified { package: String, name: String },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array { len: String, elem: Box<TypeExpr> },
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    Generic { base: Box<TypeExpr>, args: Vec<TypeExpr> },
    Struct(Vec<Field>),
    Interface,
    Func,
    Chan(Box<TypeExpr>),
    Other(String),
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names && self.ty == other.ty && self.tag == other.tag
    }
}

impl TypeExpr {
    /// Parses a type written as Go source text, e.g. `*[]models.Order` or `Page[Deal]`.
    pub fn parse(text: &str) -> TypeExpr {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix('*') {
            return TypeExpr::Pointer(Box::new(TypeExpr::parse(rest)));
        }
        if let Some(rest) = text.strip_prefix("[]") {
            return TypeExpr::Slice(Box::new(TypeExpr::parse(rest)));
        }
        if let Some(rest) = text.strip_prefix("map[") {
            if let Some(close) = matching_bracket(rest) {
                return TypeExpr::Map {
                    key: Box::new(TypeExpr::parse(&rest[..close])),
                    value: Box::new(TypeExpr::parse(&rest[close + 1..])),
                };
            }
            return TypeExpr::Other(text.to_string());
        }
        if let Some(rest) = text.strip_prefix('[') {
            if let Some(close) = matching_bracket(rest) {
                return TypeExpr::Array {
                    len: rest[..close].to_string(),
                    elem: Box::new(TypeExpr::parse(&rest[close + 1..])),
                };
            }
            return TypeExpr::Other(text.to_string());
        }
        if text == "interface{}" {
            return TypeExpr::Interface;
        }
        if text.starts_with("func(") || text == "func" {
            return TypeExpr::Func;
        }
        if let Some(rest) = text.strip_prefix("chan ") {
            return TypeExpr::Chan(Box::new(TypeExpr::parse(rest)));
        }
        if let Some(open) = text.find('[') {
            if text.ends_with(']') {
                let args = split_top_level(&text[open + 1..text.len() - 1])
                    .into_iter()
                    .map(TypeExpr::parse)
                    .collect();
                return TypeExpr::Generic {
                    base: Box::new(TypeExpr::parse(&text[..open])),
                    args,
                };
            }
        }
        if text.is_empty() || !text.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
            return TypeExpr::Other(text.to_string());
        }
        match text.rsplit_once('.') {
            Some((package, name)) => TypeExpr::Qualified {
                package: package.to_string(),
                name: name.to_string(),
            },
            None => TypeExpr::Named(text.to_string()),
        }
    }

    /// The clean type name: pointer, slice, package and generic wrapper stripped.
    ///
    /// For `Outer[Inner]` the name comes from `Inner` alone. Maps, funcs and anonymous types
    /// have no clean name.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(name) => Some(name),
            TypeExpr::Qualified { name, .. } => Some(name),
            TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) | TypeExpr::Chan(inner) => {
                inner.base_name()
            }
            TypeExpr::Array { elem, .. } => elem.base_name(),
            TypeExpr::Generic { base, args } => match args.first() {
                Some(arg) => arg.base_name(),
                None => base.base_name(),
            },
            _ => None,
        }
    }

    /// Package qualifier of the innermost named type, if any.
    pub fn package(&self) -> Option<&str> {
        match self {
            TypeExpr::Qualified { package, .. } => Some(package),
            TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) | TypeExpr::Chan(inner) => {
                inner.package()
            }
            TypeExpr::Array { elem, .. } => elem.package(),
            TypeExpr::Generic { base, args } => match args.first() {
                Some(arg) => arg.package(),
                None => base.package(),
            },
            _ => None,
        }
    }

    /// Rewrites package qualifiers through `resolve`, used to turn import aliases into
    /// canonical package names.
    pub fn map_packages(&self, resolve: &dyn Fn(&str) -> String) -> TypeExpr {
        match self {
            TypeExpr::Qualified { package, name } => TypeExpr::Qualified {
                package: resolve(package),
                name: name.clone(),
            },
            TypeExpr::Pointer(inner) => TypeExpr::Pointer(Box::new(inner.map_packages(resolve))),
            TypeExpr::Slice(inner) => TypeExpr::Slice(Box::new(inner.map_packages(resolve))),
            TypeExpr::Chan(inner) => TypeExpr::Chan(Box::new(inner.map_packages(resolve))),
            TypeExpr::Array { len, elem } => TypeExpr::Array {
                len: len.clone(),
                elem: Box::new(elem.map_packages(resolve)),
            },
            TypeExpr::Map { key, value } => TypeExpr::Map {
                key: Box::new(key.map_packages(resolve)),
                value: Box::new(value.map_packages(resolve)),
            },
            TypeExpr::Generic { base, args } => TypeExpr::Generic {
                base: Box::new(base.map_packages(resolve)),
                args: args.iter().map(|arg| arg.map_packages(resolve)).collect(),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => write!(f, "{}", name),
            TypeExpr::Qualified { package, name } => write!(f, "{}.{}", package, name),
            TypeExpr::Pointer(inner) => write!(f, "*{}", inner),
            TypeExpr::Slice(inner) => write!(f, "[]{}", inner),
            TypeExpr::Array { elem, .. } => write!(f, "[]{}", elem),
            TypeExpr::Map { key, value } => write!(f, "map[{}]{}", key, value),
            TypeExpr::Generic { base, args } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{}[{}]", base, args.join(", "))
            }
            TypeExpr::Struct(_) => write!(f, "struct{{}}"),
            TypeExpr::Interface => write!(f, "interface{{}}"),
            TypeExpr::Func => write!(f, "func"),
            TypeExpr::Chan(inner) => write!(f, "chan {}", inner),
            TypeExpr::Other(text) => write!(f, "{}", text),
        }
    }
}

/// Index of the `]` closing a bracket whose `[` was already consumed.
fn matching_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => return Some(idx),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(text[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Syntax tree traversal in source order, in the style of `syn::visit`.
///
/// Override a method to observe a node, then call the matching `walk_*` function to keep
/// descending.
pub trait Visit {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_file<V: Visit + ?Sized>(v: &mut V, file: &File) {
    for decl in &file.decls {
        match decl {
            Decl::Func(func) => {
                if let Some(body) = &func.body {
                    walk_block(v, body);
                }
            }
            Decl::Var(specs) | Decl::Const(specs) => {
                for spec in specs {
                    for value in &spec.values {
                        v.visit_expr(value);
                    }
                }
            }
            Decl::Type(_) => {}
        }
    }
}

pub fn walk_block<V: Visit + ?Sized>(v: &mut V, block: &[Stmt]) {
    for stmt in block {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visit + ?Sized>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Define { lhs, rhs } | Stmt::Assign { lhs, rhs } => {
            for expr in lhs.iter().chain(rhs) {
                v.visit_expr(expr);
            }
        }
        Stmt::Var(specs) => {
            for spec in specs {
                for value in &spec.values {
                    v.visit_expr(value);
                }
            }
        }
        Stmt::Expr(expr) => v.visit_expr(expr),
        Stmt::Return(exprs) => {
            for expr in exprs {
                v.visit_expr(expr);
            }
        }
        Stmt::Block(block) => walk_block(v, block),
    }
}

pub fn walk_expr<V: Visit + ?Sized>(v: &mut V, expr: &Expr) {
    match expr {
        Expr::Selector { operand, .. } => v.visit_expr(operand),
        Expr::Call { func, args } => {
            v.visit_expr(func);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::Composite { elts, .. } => {
            for elt in elts {
                v.visit_expr(elt);
            }
        }
        Expr::Unary { operand, .. } => v.visit_expr(operand),
        Expr::Binary { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        Expr::FuncLit(body) => walk_block(v, body),
        Expr::Index { operand, indices } => {
            v.visit_expr(operand);
            for index in indices {
                v.visit_expr(index);
            }
        }
        Expr::Paren(inner) => v.visit_expr(inner),
        Expr::Other(children) => {
            for child in children {
                v.visit_expr(child);
            }
        }
        Expr::Ident(_) | Expr::BasicLit(_) | Expr::Type(_) => {}
    }
}
