//! # docgen-splitter: declaration chunks for documentation generation
//!
//! Splits TypeScript and JavaScript sources into self-contained chunks, one
//! per declaration, each carrying the imports it needs, its leading comments
//! and the symbols it references.
//!
//! ## Architecture
//!
//! - **[`provider`]**: Tree-sitter parsing, project enumeration and the declaration-index resolver
//! - **[`splitter`]**: Import catalog, scope classification and the chunk traversal
//! - **[`indexer`]**: Runs the splitter over every file of a project
//! - **[`config`]**: Configuration loading and validation

pub mod config;
pub mod indexer;
pub mod provider;
pub mod splitter;

pub use splitter::{Chunk, ChunkKind, ExtractError, Scope, SplitterOptions, TraversalMode};
