/// Configuration module for docgen.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::splitter::{SplitterOptions, TraversalMode};

pub const DEFAULT_CONFIG_FILE: &str = "docgen.json";

// ── Default value functions ──────────────────────────────────────────

fn default_source_root() -> String {
    "src".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["ts".to_string(), "tsx".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["**/*.d.ts".to_string(), "**/node_modules/**".to_string()]
}

// ── Config struct ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory under the project root holding the sources to split.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Globs matched against paths relative to the project root.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub deep: bool,

    /// Abort the run on the first file that cannot be split.
    #[serde(default)]
    pub fail_fast: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            extensions: default_extensions(),
            exclude: default_exclude(),
            deep: false,
            fail_fast: false,
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults; so does a file that is not valid
    /// JSON, with a warning.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {}: {e}", path.display());
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.source_root.trim().is_empty(),
            "source_root must not be empty"
        );
        anyhow::ensure!(
            !self.extensions.is_empty(),
            "at least one extension must be specified"
        );
        self.exclude_matcher()?;
        Ok(())
    }

    /// Compile the exclude globs.
    pub fn exclude_matcher(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob =
                Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {pattern}"))?;
            builder.add(glob);
        }
        builder.build().context("failed to build exclude patterns")
    }

    #[must_use]
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.trim_start_matches('.') == ext)
    }

    #[must_use]
    pub fn splitter_options(&self) -> SplitterOptions {
        SplitterOptions {
            mode: if self.deep {
                TraversalMode::Deep
            } else {
                TraversalMode::Shallow
            },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
