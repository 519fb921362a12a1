use std::path::PathBuf;

use tracing::{info, warn};

use crate::provider::SourceProvider;
use crate::splitter::{Chunk, ExtractError, SplitterOptions, TraversalMode, split_file};

/// A file the splitter could not process.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: ExtractError,
}

/// Outcome of one run over a project.
#[derive(Debug, Default)]
pub struct IndexReport {
    /// Chunks of every file, files in enumeration order.
    pub chunks: Vec<Chunk>,
    pub indexed: usize,
    pub failed: Vec<FileFailure>,
}

impl IndexReport {
    #[must_use]
    pub fn files_seen(&self) -> usize {
        self.indexed + self.failed.len()
    }
}

pub struct Indexer<'a> {
    provider: &'a dyn SourceProvider,
    options: SplitterOptions,
    fail_fast: bool,
}

impl<'a> Indexer<'a> {
    pub fn new(provider: &'a dyn SourceProvider, options: SplitterOptions) -> Self {
        Self {
            provider,
            options,
            fail_fast: false,
        }
    }

    /// Return the first file error instead of recording it and moving on.
    #[must_use]
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Split every source unit the provider enumerates.
    pub fn index_project(&self) -> Result<IndexReport, ExtractError> {
        let mut report = IndexReport::default();

        for path in self.provider.source_units() {
            match split_file(self.provider, &path, self.options) {
                Ok(chunks) => {
                    report.indexed += 1;
                    report.chunks.extend(chunks);
                }
                Err(error) if self.fail_fast => return Err(error),
                Err(error) => {
                    warn!("Skipping {}: {error}", path.display());
                    report.failed.push(FileFailure { path, error });
                }
            }
        }

        info!(
            "Found {} code chunks{} across {} files ({} failed)",
            report.chunks.len(),
            if self.options.mode == TraversalMode::Deep {
                " (deep mode)"
            } else {
                ""
            },
            report.files_seen(),
            report.failed.len()
        );

        Ok(report)
    }
}
