//! Top-level declaration extraction using tree-sitter
//!
//! Only the direct children of the module node are inspected: functions,
//! classes (and their methods' decorators), and `from ... import ...`
//! statements. Nested definitions and imports inside other statements are
//! not part of a module's public surface and are ignored.

use thiserror::Error;
use tree_sitter::{Node, Parser};

use crate::resolver::ImportRef;

/// Decorator marking a method as abstract
pub const ABSTRACT_METHOD_MARKER: &str = "abstractmethod";

/// Errors that can occur while parsing a source file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Failed to load Python grammar: {0}")]
    Language(String),

    #[error("Parser produced no syntax tree")]
    NoTree,

    #[error("Syntax error at line {line}")]
    Syntax { line: usize },
}

/// A top-level class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDeclaration {
    pub name: String,
    /// At least one method carries the abstract-method marker
    pub is_abstract: bool,
    pub line: usize,
}

/// Everything the graph builder needs from one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDeclarations {
    /// Names of top-level functions
    pub functions: Vec<String>,
    pub classes: Vec<ClassDeclaration>,
    /// One entry per imported name of every top-level `from ... import ...`
    pub imports: Vec<ImportRef>,
}

impl ModuleDeclarations {
    pub fn abstract_count(&self) -> usize {
        self.classes.iter().filter(|c| c.is_abstract).count()
    }

    /// Functions plus non-abstract classes
    pub fn concrete_count(&self) -> usize {
        self.functions.len() + self.classes.iter().filter(|c| !c.is_abstract).count()
    }
}

/// Reusable Python parser
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::LANGUAGE;
        parser
            .set_language(&language.into())
            .map_err(|e| ParseError::Language(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Parse a whole file
    pub fn parse(&mut self, source: &str) -> Result<ModuleDeclarations, ParseError> {
        let tree = self.parser.parse(source, None).ok_or(ParseError::NoTree)?;
        let root = tree.root_node();

        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(ParseError::Syntax { line });
        }

        let source = source.as_bytes();
        let mut declarations = ModuleDeclarations::default();

        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            collect_top_level(node, source, &mut declarations);
        }

        Ok(declarations)
    }
}

/// Parse with a throwaway parser
pub fn parse_source(source: &str) -> Result<ModuleDeclarations, ParseError> {
    PythonParser::new()?.parse(source)
}

fn collect_top_level(node: Node, source: &[u8], declarations: &mut ModuleDeclarations) {
    match node.kind() {
        "function_definition" => {
            if let Some(name) = field_text(node, "name", source) {
                declarations.functions.push(name.to_string());
            }
        }
        "class_definition" => {
            if let Some(class) = parse_class(node, source) {
                declarations.classes.push(class);
            }
        }
        "decorated_definition" => {
            if let Some(definition) = node.child_by_field_name("definition") {
                collect_top_level(definition, source, declarations);
            }
        }
        "import_from_statement" => {
            declarations.imports.extend(parse_import_from(node, source));
        }
        _ => {}
    }
}

fn parse_class(node: Node, source: &[u8]) -> Option<ClassDeclaration> {
    let name = field_text(node, "name", source)?.to_string();
    let is_abstract = node
        .child_by_field_name("body")
        .is_some_and(|body| declares_abstract_method(body, source));

    Some(ClassDeclaration {
        name,
        is_abstract,
        line: node.start_position().row + 1,
    })
}

fn declares_abstract_method(body: Node, source: &[u8]) -> bool {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .any(|member| is_abstract_method(member, source))
}

fn is_abstract_method(member: Node, source: &[u8]) -> bool {
    if member.kind() != "decorated_definition" {
        return false;
    }
    let is_method = member
        .child_by_field_name("definition")
        .is_some_and(|d| d.kind() == "function_definition");
    if !is_method {
        return false;
    }

    let mut cursor = member.walk();
    member
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .any(|d| decorator_name(d, source) == Some(ABSTRACT_METHOD_MARKER))
}

/// `@name` -> `name`, `@a.b.name` -> `name`; anything else has no name
fn decorator_name<'a>(decorator: Node, source: &'a [u8]) -> Option<&'a str> {
    let mut cursor = decorator.walk();
    let expression = decorator.named_children(&mut cursor).next()?;
    match expression.kind() {
        "identifier" => expression.utf8_text(source).ok(),
        "attribute" => field_text(expression, "attribute", source),
        _ => None,
    }
}

fn parse_import_from(node: Node, source: &[u8]) -> Vec<ImportRef> {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return Vec::new();
    };
    // relative imports (`from . import x`, `from .a import x`) are not resolved
    if module_node.kind() != "dotted_name" {
        return Vec::new();
    }
    let Ok(module) = module_node.utf8_text(source) else {
        return Vec::new();
    };
    let line = node.start_position().row + 1;

    let mut imports = Vec::new();
    let mut cursor = node.walk();
    for name_node in node.children_by_field_name("name", &mut cursor) {
        let imported = match name_node.kind() {
            "dotted_name" => name_node.utf8_text(source).ok(),
            "aliased_import" => field_text(name_node, "name", source),
            _ => None,
        };
        if let Some(name) = imported {
            imports.push(ImportRef::new(module, name).at_line(line));
        }
    }
    imports
}

fn field_text<'a>(node: Node, field: &str, source: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name(field)?.utf8_text(source).ok()
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(line) = first_error_line(child) {
            return Some(line);
        }
    }
    None
}
