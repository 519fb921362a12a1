/// Project-level driver: runs the splitter over every source unit.
pub mod core;

pub use self::core::{FileFailure, IndexReport, Indexer};
