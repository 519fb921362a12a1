use std::collections::HashSet;

use tree_sitter::Node;

use super::imports::ImportCatalog;
use crate::provider::{ParsedUnit, SymbolResolver, walk_preorder};

fn is_identifier(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "identifier"
            | "type_identifier"
            | "property_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern"
    )
}

/// Distinct names referenced inside `root`'s subtree, root included, in
/// first-encounter order.
///
/// Identifiers the resolver cannot place are kept by their literal text only
/// when an import of the file binds that text.
pub(crate) fn referenced_symbols(
    unit: &ParsedUnit,
    root: Node<'_>,
    resolver: &dyn SymbolResolver,
    catalog: &ImportCatalog,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();

    walk_preorder(root, |node| {
        if !is_identifier(node) {
            return;
        }
        let name = match resolver.resolve(unit, node) {
            Some(name) => name,
            None => match unit.text_of(node) {
                Some(text) if catalog.binds(text) => text.to_string(),
                _ => return,
            },
        };
        if seen.insert(name.clone()) {
            symbols.push(name);
        }
    });

    symbols
}
