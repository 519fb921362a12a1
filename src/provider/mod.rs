/// Source tree provider: parsed units plus project-wide symbol resolution.
///
/// The splitter only talks to this module through [`SourceProvider`] and
/// [`SymbolResolver`], so the tree-sitter backed [`project::Project`] can be
/// swapped for another backend without touching the traversal.
pub mod languages;
pub mod project;
pub mod resolver;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

use self::languages::LanguageConfig;

/// Errors raised while supplying a parsed tree for a source unit.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("source unit not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type: {0}")]
    UnsupportedLanguage(String),

    #[error("failed to parse {0}")]
    Parse(PathBuf),

    #[error("{path} is unavailable: {reason}")]
    Unavailable { path: PathBuf, reason: String },

    #[error("invalid source root: {0}")]
    InvalidSourceRoot(String),

    #[error("invalid exclude patterns: {0}")]
    InvalidExclude(String),
}

/// One parsed source file. Immutable once built.
pub struct ParsedUnit {
    path: PathBuf,
    language: &'static str,
    source: String,
    tree: Tree,
}

impl ParsedUnit {
    /// Parse `source`, picking the grammar from the path's extension.
    pub fn from_source(path: impl Into<PathBuf>, source: String) -> Result<Self, ProviderError> {
        let path = path.into();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = LanguageConfig::get_by_extension(ext)
            .ok_or_else(|| ProviderError::UnsupportedLanguage(ext.to_string()))?;
        Self::with_language(path, source, config.name)
    }

    /// Parse `source` with the named grammar regardless of the path.
    pub fn with_language(
        path: impl Into<PathBuf>,
        source: String,
        lang_name: &str,
    ) -> Result<Self, ProviderError> {
        let path = path.into();
        let config = LanguageConfig::get_by_name(lang_name)
            .ok_or_else(|| ProviderError::UnsupportedLanguage(lang_name.to_string()))?;

        let mut parser = Parser::new();
        parser
            .set_language(&config.language)
            .map_err(|_| ProviderError::UnsupportedLanguage(lang_name.to_string()))?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| ProviderError::Parse(path.clone()))?;

        if tree.root_node().has_error() {
            tracing::debug!("{} contains syntax errors, continuing", path.display());
        }

        Ok(Self {
            path,
            language: config.name,
            source,
            tree,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path with forward slashes, as used in chunk ids.
    #[must_use]
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }

    #[must_use]
    pub fn language(&self) -> &'static str {
        self.language
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by `node`, or `None` if the range is not valid UTF-8.
    #[must_use]
    pub fn text_of(&self, node: Node<'_>) -> Option<&str> {
        node.utf8_text(self.source.as_bytes()).ok()
    }
}

/// Visit `root` and every descendant in pre-order.
pub fn walk_preorder<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Resolves identifier nodes to the canonical name of their declaration.
///
/// Implementations are shared read-only across every file of a run, so they
/// must be `Send + Sync` and must not mutate on lookup.
pub trait SymbolResolver: Send + Sync {
    /// Return the declared name `identifier` refers to, or `None` when the
    /// backend cannot resolve it (library globals, unmodelled syntax).
    fn resolve(&self, unit: &ParsedUnit, identifier: Node<'_>) -> Option<String>;
}

/// Supplies parsed units and the project resolver to the splitter.
pub trait SourceProvider: Send + Sync {
    /// Every source unit that belongs to the project, in a stable order.
    fn source_units(&self) -> Vec<PathBuf>;

    /// The parsed unit for `path`.
    fn unit(&self, path: &Path) -> Result<&ParsedUnit, ProviderError>;

    fn resolver(&self) -> &dyn SymbolResolver;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typescript_unit() {
        let unit = ParsedUnit::from_source("src/a.ts", "export type T = string;\n".to_string())
            .expect("Failed to parse TypeScript");
        assert_eq!(unit.language(), "typescript");
        assert_eq!(unit.root().kind(), "program");
        assert_eq!(unit.display_path(), "src/a.ts");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ParsedUnit::from_source("notes.md", "# hi".to_string())
            .err()
            .expect("markdown should be rejected");
        assert!(matches!(err, ProviderError::UnsupportedLanguage(ext) if ext == "md"));
    }

    #[test]
    fn test_windows_paths_use_forward_slashes_in_display() {
        let unit = ParsedUnit::with_language(
            "src\\nested\\b.ts",
            "const a = 1;".to_string(),
            "typescript",
        )
        .expect("Failed to parse");
        assert_eq!(unit.display_path(), "src/nested/b.ts");
    }
}
