use tree_sitter::Node;

use crate::provider::ParsedUnit;

/// Leading comment text of `span`, joined with `\n` in source order.
///
/// Comments between the previous non-comment sibling and `span` count, except
/// ones on the same line as that sibling: those trail the previous statement.
/// When the scan starts at offset 0 every comment counts.
pub(crate) fn leading_comments(unit: &ParsedUnit, span: Node<'_>) -> String {
    let mut comments = Vec::new();
    let mut trivia_start = None;

    let mut sibling = span.prev_sibling();
    while let Some(node) = sibling {
        if node.kind() != "comment" {
            trivia_start = Some(node.end_byte());
            break;
        }
        comments.push(node);
        sibling = node.prev_sibling();
    }

    let trivia_start = trivia_start.unwrap_or_else(|| match span.parent() {
        Some(parent) if parent.parent().is_some() => parent.start_byte(),
        _ => 0,
    });

    let source = unit.source();
    let mut collecting = trivia_start == 0;
    let mut texts = Vec::new();

    for comment in comments.into_iter().rev() {
        if !collecting {
            let gap = source.get(trivia_start..comment.start_byte()).unwrap_or("");
            collecting = gap.contains(['\n', '\r']);
        }
        if collecting {
            if let Some(text) = unit.text_of(comment) {
                texts.push(text);
            }
        }
    }

    texts.join("\n")
}
