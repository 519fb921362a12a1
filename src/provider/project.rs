/// Tree-sitter backed [`SourceProvider`] over a project directory.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use super::resolver::DeclarationIndex;
use super::{ParsedUnit, ProviderError, SourceProvider, SymbolResolver};
use crate::config::Config;

/// Every source unit of a project, parsed up front, plus the resolver built
/// over them.
pub struct Project {
    root: PathBuf,
    units: BTreeMap<PathBuf, ParsedUnit>,
    /// Enumerated files that could not be read or parsed, with the reason.
    unavailable: BTreeMap<PathBuf, String>,
    index: DeclarationIndex,
}

impl Project {
    /// Walk `root/<source_root>` and parse every matching file.
    ///
    /// Unit paths are relative to `root`, so chunk ids do not depend on where
    /// the project is checked out.
    pub fn load(root: &Path, config: &Config) -> Result<Self, ProviderError> {
        let source_dir = root.join(&config.source_root);
        if !source_dir.is_dir() {
            return Err(ProviderError::InvalidSourceRoot(
                source_dir.display().to_string(),
            ));
        }
        let exclude = config
            .exclude_matcher()
            .map_err(|e| ProviderError::InvalidExclude(format!("{e:#}")))?;

        let mut units = BTreeMap::new();
        let mut unavailable = BTreeMap::new();

        // Walk builder respects .gitignore by default
        let walker = WalkBuilder::new(&source_dir).hidden(false).build();

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let ext = path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            if !config.accepts_extension(ext) || is_declaration_file(path) {
                continue;
            }

            let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            if exclude.is_match(&relative) {
                debug!("excluded {}", relative.display());
                continue;
            }

            let parsed = std::fs::read_to_string(path)
                .map_err(|source| ProviderError::Io {
                    path: relative.clone(),
                    source,
                })
                .and_then(|content| ParsedUnit::from_source(relative.clone(), content));

            match parsed {
                Ok(unit) => {
                    units.insert(relative, unit);
                }
                Err(e) => {
                    warn!("Skipping {}: {e}", relative.display());
                    unavailable.insert(relative, e.to_string());
                }
            }
        }

        info!(
            "Loaded {} source files from {} ({} unavailable)",
            units.len(),
            source_dir.display(),
            unavailable.len()
        );

        let index = DeclarationIndex::build(units.values());
        Ok(Self {
            root: root.to_path_buf(),
            units,
            unavailable,
            index,
        })
    }

    /// Build a project from already parsed units.
    pub fn from_units(units: impl IntoIterator<Item = ParsedUnit>) -> Self {
        let units: BTreeMap<PathBuf, ParsedUnit> = units
            .into_iter()
            .map(|u| (u.path().to_path_buf(), u))
            .collect();
        let index = DeclarationIndex::build(units.values());
        Self {
            root: PathBuf::new(),
            units,
            unavailable: BTreeMap::new(),
            index,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn index(&self) -> &DeclarationIndex {
        &self.index
    }

    fn normalize<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// `.d.ts` style files only carry signatures.
fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| [".d.ts", ".d.mts", ".d.cts"].iter().any(|s| n.ends_with(s)))
}

impl SourceProvider for Project {
    fn source_units(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .units
            .keys()
            .chain(self.unavailable.keys())
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    fn unit(&self, path: &Path) -> Result<&ParsedUnit, ProviderError> {
        let path = self.normalize(path);
        if let Some(unit) = self.units.get(path) {
            return Ok(unit);
        }
        match self.unavailable.get(path) {
            Some(reason) => Err(ProviderError::Unavailable {
                path: path.to_path_buf(),
                reason: reason.clone(),
            }),
            None => Err(ProviderError::NotFound(path.to_path_buf())),
        }
    }

    fn resolver(&self) -> &dyn SymbolResolver {
        &self.index
    }
}
