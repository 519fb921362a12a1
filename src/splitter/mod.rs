/// Chunk extraction: splits one parsed source unit into declaration chunks.
///
/// Each chunk carries the imports it needs, its leading comments and the
/// names it references, so it can be rendered on its own.
pub mod extractor;
pub(crate) mod comments;
pub(crate) mod imports;
pub(crate) mod lines;
pub(crate) mod references;
pub(crate) mod scope;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::{ProviderError, SourceProvider};

pub use extractor::AstSplitter;

/// Errors that can occur while splitting one file.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no source tree for {path}: {reason}")]
    ProviderUnavailable { path: PathBuf, reason: String },

    #[error("traversal of {path} failed: {message}")]
    TraversalFailure { path: PathBuf, message: String },
}

impl ExtractError {
    pub(crate) fn traversal(path: &Path, message: impl Into<String>) -> Self {
        Self::TraversalFailure {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

impl From<ProviderError> for ExtractError {
    fn from(err: ProviderError) -> Self {
        let path = match &err {
            ProviderError::NotFound(p) | ProviderError::Parse(p) => p.clone(),
            ProviderError::Io { path, .. } | ProviderError::Unavailable { path, .. } => {
                path.clone()
            }
            ProviderError::UnsupportedLanguage(_)
            | ProviderError::InvalidSourceRoot(_)
            | ProviderError::InvalidExclude(_) => {
                PathBuf::new()
            }
        };
        Self::ProviderUnavailable {
            path,
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Function,
    Class,
    Interface,
    Enum,
    Variable,
    Type,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Function => "function",
            ChunkKind::Class => "class",
            ChunkKind::Interface => "interface",
            ChunkKind::Enum => "enum",
            ChunkKind::Variable => "variable",
            ChunkKind::Type => "type",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Module,
    Local,
}

/// One extracted declaration with everything needed to read it alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: String,
    pub symbol: String,
    pub kind: ChunkKind,
    pub scope: Scope,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    pub imports: Vec<String>,
    pub leading_comments: String,
    pub referenced_symbols: Vec<String>,
}

impl Chunk {
    /// `file:symbol:start-end`, unique per run.
    #[must_use]
    pub fn make_id(file: &str, symbol: &str, start_line: usize, end_line: usize) -> String {
        format!("{file}:{symbol}:{start_line}-{end_line}")
    }
}

/// How far the traversal descends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    /// Stop at function, method and arrow bodies.
    #[default]
    Shallow,
    /// Visit every node, surfacing local declarations.
    Deep,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SplitterOptions {
    pub mode: TraversalMode,
}

impl SplitterOptions {
    #[must_use]
    pub fn deep() -> Self {
        Self {
            mode: TraversalMode::Deep,
        }
    }
}

/// Split the file at `path` into chunks.
pub fn split_file(
    provider: &dyn SourceProvider,
    path: &Path,
    options: SplitterOptions,
) -> Result<Vec<Chunk>, ExtractError> {
    let unit = provider.unit(path)?;
    AstSplitter::new(unit, provider.resolver(), options).split()
}
