//! Import catalog: one immutable record per top-level import statement.

use std::collections::BTreeSet;

use tracing::trace;
use tree_sitter::Node;

use super::lines::LineIndex;
use crate::provider::ParsedUnit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportRecord {
    pub text: String,
    pub names: BTreeSet<String>,
    pub start_line: usize,
    pub end_line: usize,
}

/// Every top-level import of one file, in source order.
#[derive(Debug, Default)]
pub(crate) struct ImportCatalog {
    records: Vec<ImportRecord>,
}

impl ImportCatalog {
    pub fn build(unit: &ParsedUnit, lines: &LineIndex) -> Self {
        let root = unit.root();
        let mut records = Vec::new();

        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            if node.kind() != "import_statement" {
                continue;
            }
            let Some(text) = unit.text_of(node) else {
                continue;
            };
            let record = ImportRecord {
                text: text.to_string(),
                names: local_names(unit, node).into_iter().collect(),
                start_line: lines.line_of(node.start_byte()),
                end_line: lines.line_of(node.end_byte()),
            };
            trace!(
                "import at lines {}-{} binds {:?}",
                record.start_line, record.end_line, record.names
            );
            records.push(record);
        }

        Self { records }
    }

    pub fn records(&self) -> &[ImportRecord] {
        &self.records
    }

    /// Whether any import of the file introduces `name`.
    pub fn binds(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.names.contains(name))
    }

    /// Imports needed by a chunk referencing `referenced`, in file order.
    ///
    /// When several imports bind the same local name, only the first one in
    /// file order is credited with it.
    pub fn required_for(&self, referenced: &[String]) -> Vec<&ImportRecord> {
        let mut claimed: BTreeSet<&str> = BTreeSet::new();
        let mut required = Vec::new();

        for record in &self.records {
            let mut needed = false;
            for name in &record.names {
                if !claimed.insert(name.as_str()) {
                    continue;
                }
                if referenced.iter().any(|r| r == name) {
                    needed = true;
                }
            }
            if needed {
                required.push(record);
            }
        }

        required
    }
}

/// Local names introduced by an `import_statement` node.
///
/// Renamed specifiers contribute only their alias.
pub(crate) fn local_names(unit: &ParsedUnit, import: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut push = |node: Node<'_>| {
        if let Some(text) = unit.text_of(node) {
            names.push(text.to_string());
        }
    };

    let mut cursor = import.walk();
    for child in import.named_children(&mut cursor) {
        match child.kind() {
            "import_clause" => {
                let mut clause_cursor = child.walk();
                for binding in child.named_children(&mut clause_cursor) {
                    match binding.kind() {
                        "identifier" => push(binding),
                        "namespace_import" => {
                            let mut ns_cursor = binding.walk();
                            for ident in binding.named_children(&mut ns_cursor) {
                                if ident.kind() == "identifier" {
                                    push(ident);
                                }
                            }
                        }
                        "named_imports" => {
                            let mut spec_cursor = binding.walk();
                            for spec in binding.named_children(&mut spec_cursor) {
                                if spec.kind() != "import_specifier" {
                                    continue;
                                }
                                let local = spec
                                    .child_by_field_name("alias")
                                    .or_else(|| spec.child_by_field_name("name"));
                                if let Some(local) = local {
                                    push(local);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            // `import fs = require('fs')`
            "import_require_clause" => {
                let mut req_cursor = child.walk();
                for ident in child.named_children(&mut req_cursor) {
                    if ident.kind() == "identifier" {
                        push(ident);
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    names
}
