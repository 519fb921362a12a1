/// Declaration index used as the project-wide symbol resolver.
///
/// Every file contributes the names it binds (declarations, parameters,
/// destructured bindings, imports) and the member names it declares.
/// Top-level declarations of script files, i.e. files without any import or
/// export, are visible from every file.
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tree_sitter::Node;

use super::{ParsedUnit, SymbolResolver, walk_preorder};
use crate::splitter::imports::local_names;

#[derive(Debug, Default, Clone)]
pub struct FileBindings {
    names: HashSet<String>,
    members: HashSet<String>,
    top_level: Vec<String>,
    is_module: bool,
}

impl FileBindings {
    pub fn collect(unit: &ParsedUnit) -> Self {
        let mut bindings = FileBindings::default();
        let root = unit.root();

        walk_preorder(root, |node| bindings.visit(unit, node));

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "import_statement" | "export_statement" => bindings.is_module = true,
                _ => {}
            }
            top_level_names(unit, child, &mut bindings.top_level);
        }

        bindings
    }

    #[must_use]
    pub fn binds(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    /// Whether the file is an ES module rather than a global script.
    #[must_use]
    pub fn is_module(&self) -> bool {
        self.is_module
    }

    fn visit(&mut self, unit: &ParsedUnit, node: Node<'_>) {
        match node.kind() {
            "function_declaration"
            | "generator_function_declaration"
            | "function_signature"
            | "class_declaration"
            | "abstract_class_declaration"
            | "class"
            | "function_expression"
            | "generator_function"
            | "interface_declaration"
            | "enum_declaration"
            | "type_alias_declaration"
            | "type_parameter"
            | "internal_module" => {
                if let Some(name) = node.child_by_field_name("name") {
                    if matches!(name.kind(), "identifier" | "type_identifier") {
                        self.add_name(unit, name);
                    }
                }
            }
            "variable_declarator" => self.add_pattern(unit, node.child_by_field_name("name")),
            "required_parameter" | "optional_parameter" => {
                self.add_pattern(unit, node.child_by_field_name("pattern"))
            }
            "formal_parameters" => {
                // JavaScript puts patterns directly under formal_parameters.
                let mut cursor = node.walk();
                for param in node.named_children(&mut cursor) {
                    if !matches!(
                        param.kind(),
                        "required_parameter" | "optional_parameter" | "comment"
                    ) {
                        self.add_pattern(unit, Some(param));
                    }
                }
            }
            "arrow_function" | "catch_clause" => {
                self.add_pattern(unit, node.child_by_field_name("parameter"))
            }
            "for_in_statement" => self.add_pattern(unit, node.child_by_field_name("left")),
            "import_statement" => self.names.extend(local_names(unit, node)),
            "method_definition"
            | "method_signature"
            | "abstract_method_signature"
            | "property_signature"
            | "public_field_definition"
            | "enum_assignment" => self.add_member(unit, node.child_by_field_name("name")),
            "field_definition" => self.add_member(unit, node.child_by_field_name("property")),
            "enum_body" => {
                let mut cursor = node.walk();
                for member in node.named_children(&mut cursor) {
                    if member.kind() == "property_identifier" {
                        self.add_member(unit, Some(member));
                    }
                }
            }
            _ => {}
        }
    }

    fn add_name(&mut self, unit: &ParsedUnit, node: Node<'_>) {
        if let Some(text) = unit.text_of(node) {
            self.names.insert(text.to_string());
        }
    }

    fn add_member(&mut self, unit: &ParsedUnit, node: Option<Node<'_>>) {
        let Some(node) = node else { return };
        if matches!(node.kind(), "property_identifier" | "private_property_identifier") {
            if let Some(text) = unit.text_of(node) {
                self.members.insert(text.to_string());
            }
        }
    }

    fn add_pattern(&mut self, unit: &ParsedUnit, pattern: Option<Node<'_>>) {
        let Some(pattern) = pattern else { return };
        let mut found = Vec::new();
        pattern_names(unit, pattern, &mut found);
        self.names.extend(found);
    }
}

/// Names bound by a binding pattern; default values and object keys are skipped.
pub(crate) fn pattern_names(unit: &ParsedUnit, pattern: Node<'_>, out: &mut Vec<String>) {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            if let Some(text) = unit.text_of(pattern) {
                out.push(text.to_string());
            }
        }
        "assignment_pattern" | "object_assignment_pattern" => {
            if let Some(left) = pattern.child_by_field_name("left") {
                pattern_names(unit, left, out);
            }
        }
        "pair_pattern" => {
            if let Some(value) = pattern.child_by_field_name("value") {
                pattern_names(unit, value, out);
            }
        }
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            let mut cursor = pattern.walk();
            for child in pattern.named_children(&mut cursor) {
                pattern_names(unit, child, out);
            }
        }
        _ => {}
    }
}

fn top_level_names(unit: &ParsedUnit, node: Node<'_>, out: &mut Vec<String>) {
    match node.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() == "variable_declarator" {
                    if let Some(name) = declarator.child_by_field_name("name") {
                        pattern_names(unit, name, out);
                    }
                }
            }
        }
        "ambient_declaration" => {
            let mut cursor = node.walk();
            for inner in node.named_children(&mut cursor) {
                top_level_names(unit, inner, out);
            }
        }
        _ => {
            if let Some(name) = node.child_by_field_name("name") {
                if matches!(name.kind(), "identifier" | "type_identifier") {
                    if let Some(text) = unit.text_of(name) {
                        out.push(text.to_string());
                    }
                }
            }
        }
    }
}

/// Project-wide resolver built from every parsed unit.
#[derive(Debug, Default)]
pub struct DeclarationIndex {
    files: HashMap<PathBuf, FileBindings>,
    globals: HashSet<String>,
}

impl DeclarationIndex {
    pub fn build<'a>(units: impl IntoIterator<Item = &'a ParsedUnit>) -> Self {
        let mut index = DeclarationIndex::default();
        for unit in units {
            let bindings = FileBindings::collect(unit);
            if !bindings.is_module {
                index.globals.extend(bindings.top_level.iter().cloned());
            }
            index.files.insert(unit.path().to_path_buf(), bindings);
        }
        tracing::debug!(
            "declaration index: {} files, {} globals",
            index.files.len(),
            index.globals.len()
        );
        index
    }

    #[must_use]
    pub fn bindings(&self, path: &Path) -> Option<&FileBindings> {
        self.files.get(path)
    }
}

impl SymbolResolver for DeclarationIndex {
    fn resolve(&self, unit: &ParsedUnit, identifier: Node<'_>) -> Option<String> {
        let text = unit.text_of(identifier)?;
        let file = self.files.get(unit.path());

        let resolved = match identifier.kind() {
            "identifier"
            | "type_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern" => {
                file.is_some_and(|f| f.binds(text)) || self.globals.contains(text)
            }
            "property_identifier" => file.is_some_and(|f| f.has_member(text)),
            _ => false,
        };

        resolved.then(|| text.to_string())
    }
}
