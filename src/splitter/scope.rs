//! Node categories: declaration classification, scope, and the function-like
//! boundary the shallow traversal stops at.

use tree_sitter::Node;

use super::{ChunkKind, Scope};

/// A node that may produce chunks. Matched exhaustively by the extractor.
#[derive(Debug, Clone)]
pub(crate) enum Declaration<'t> {
    Function { name: Node<'t> },
    Class { name: Node<'t> },
    Interface { name: Node<'t> },
    Enum { name: Node<'t> },
    TypeAlias { name: Node<'t> },
    /// A `let`/`const`/`var` statement; only plain identifier declarators are kept.
    Variables { names: Vec<Node<'t>> },
}

impl Declaration<'_> {
    pub fn kind(&self) -> ChunkKind {
        match self {
            Declaration::Function { .. } => ChunkKind::Function,
            Declaration::Class { .. } => ChunkKind::Class,
            Declaration::Interface { .. } => ChunkKind::Interface,
            Declaration::Enum { .. } => ChunkKind::Enum,
            Declaration::TypeAlias { .. } => ChunkKind::Type,
            Declaration::Variables { .. } => ChunkKind::Variable,
        }
    }
}

/// Classify `node`, or `None` if it never becomes a chunk.
pub(crate) fn classify(node: Node<'_>) -> Option<Declaration<'_>> {
    let named = || node.child_by_field_name("name");
    match node.kind() {
        // `function_signature` covers overloads and `declare function`.
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            named().map(|name| Declaration::Function { name })
        }
        "class_declaration" | "abstract_class_declaration" => {
            named().map(|name| Declaration::Class { name })
        }
        "interface_declaration" => named().map(|name| Declaration::Interface { name }),
        "enum_declaration" => named().map(|name| Declaration::Enum { name }),
        "type_alias_declaration" => named().map(|name| Declaration::TypeAlias { name }),
        "lexical_declaration" | "variable_declaration" => {
            if is_for_initializer(node) {
                return None;
            }
            let mut cursor = node.walk();
            let names = node
                .named_children(&mut cursor)
                .filter(|d| d.kind() == "variable_declarator")
                .filter_map(|d| d.child_by_field_name("name"))
                .filter(|name| name.kind() == "identifier")
                .collect();
            Some(Declaration::Variables { names })
        }
        _ => None,
    }
}

/// `let i = 0` in `for (let i = 0; ...)` is a declaration list, not a statement.
fn is_for_initializer(node: Node<'_>) -> bool {
    node.parent().is_some_and(|parent| {
        parent.kind() == "for_statement"
            && parent.child_by_field_name("initializer") == Some(node)
    })
}

/// Nodes whose bodies the shallow traversal does not enter.
pub(crate) fn is_function_like(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "function_declaration"
            | "generator_function_declaration"
            | "method_definition"
            | "arrow_function"
            | "function_expression"
            | "function"
            | "generator_function"
    )
}

/// Wrappers TypeScript models as modifiers of the declaration they contain.
fn is_modifier_wrapper(node: Node<'_>) -> bool {
    matches!(node.kind(), "export_statement" | "ambient_declaration")
}

/// The node whose span a chunk covers: the declaration, widened to an
/// enclosing `export` / `declare` wrapper.
pub(crate) fn chunk_span(node: Node<'_>) -> Node<'_> {
    let mut span = node;
    while let Some(parent) = span.parent() {
        if !is_modifier_wrapper(parent) {
            break;
        }
        span = parent;
    }
    span
}

/// `Module` when the declaration sits directly in the file root, a namespace
/// body or a `declare global` block, `Local` otherwise.
pub(crate) fn scope_of(node: Node<'_>) -> Scope {
    let Some(parent) = chunk_span(node).parent() else {
        return Scope::Module;
    };
    match parent.kind() {
        "program" => Scope::Module,
        "statement_block" => match parent.parent().map(|p| p.kind()) {
            Some("internal_module" | "module" | "ambient_declaration") => Scope::Module,
            _ => Scope::Local,
        },
        _ => Scope::Local,
    }
}
