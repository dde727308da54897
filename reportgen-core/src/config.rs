//! Configuration file support for reportgen
//!
//! Loads run configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.reportgenrc.json` in the input root
//! 3. `reportgen.config.json` in the input root
//!
//! All fields are optional. CLI flags take precedence over config file values.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Assignment folder names excluded when no config is specified
const DEFAULT_EXCLUDES: &[&str] = &["output", "reports", ".*"];

pub const DEFAULT_MANIFEST: &str = "reports.csv";
pub const DEFAULT_TITLE: &str = "Web Development Report";

/// reportgen configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportgenConfig {
    /// Glob patterns for assignment folder names to include (default: all)
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns for assignment folder names to skip (default: output, reports, .*)
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Output root, relative paths resolve against the input root
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Manifest file name inside the output root (default: reports.csv)
    #[serde(default)]
    pub manifest: Option<String>,

    /// Report heading and title prefix (default: Web Development Report)
    #[serde(default)]
    pub title: Option<String>,
}

/// Resolved configuration with compiled glob patterns
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Compiled include patterns (None means include all)
    pub include: Option<GlobSet>,
    /// Compiled exclude patterns
    pub exclude: GlobSet,
    /// Include patterns as written in the config
    pub include_patterns: Vec<String>,
    /// Exclude patterns in effect, the defaults when the config lists none
    pub exclude_patterns: Vec<String>,
    /// True when `exclude_patterns` are the built-in defaults
    pub default_excludes: bool,
    pub output: Option<PathBuf>,
    pub manifest_name: String,
    pub title: String,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl ReportgenConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref manifest) = self.manifest {
            if manifest.trim().is_empty() {
                anyhow::bail!("manifest must not be empty");
            }
            if !manifest.ends_with(".csv") {
                anyhow::bail!("manifest must be a .csv file name (got {})", manifest);
            }
            if manifest.contains('/') || manifest.contains('\\') {
                anyhow::bail!(
                    "manifest must be a file name, not a path (got {})",
                    manifest
                );
            }
        }

        if let Some(ref title) = self.title {
            if title.trim().is_empty() {
                anyhow::bail!("title must not be empty");
            }
        }

        if let Some(ref output) = self.output {
            if output.as_os_str().is_empty() {
                anyhow::bail!("output must not be empty");
            }
        }

        // Validate glob patterns compile
        for pattern in &self.include {
            Glob::new(pattern).with_context(|| format!("invalid include pattern: {}", pattern))?;
        }
        for pattern in &self.exclude {
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let include = if self.include.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &self.include {
                builder.add(Glob::new(pattern)?);
            }
            Some(builder.build()?)
        };

        let default_excludes = self.exclude.is_empty();
        let exclude_patterns: Vec<String> = if default_excludes {
            DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect()
        } else {
            self.exclude.clone()
        };
        let exclude = {
            let mut builder = GlobSetBuilder::new();
            for pattern in &exclude_patterns {
                builder.add(Glob::new(pattern)?);
            }
            builder.build()?
        };

        Ok(ResolvedConfig {
            include,
            exclude,
            include_patterns: self.include.clone(),
            exclude_patterns,
            default_excludes,
            output: self.output.clone(),
            manifest_name: self
                .manifest
                .clone()
                .unwrap_or_else(|| DEFAULT_MANIFEST.to_string()),
            title: self
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Check if an assignment folder should be processed, by folder name
    pub fn should_include(&self, folder_name: &str) -> bool {
        if self.exclude.is_match(folder_name) {
            return false;
        }

        if let Some(ref include) = self.include {
            return include.is_match(folder_name);
        }

        true
    }

    /// Output root for an input root: configured path, or `<input_root>/reports`
    pub fn output_root(&self, input_root: &Path) -> PathBuf {
        match &self.output {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => input_root.join(p),
            None => input_root.join("reports"),
        }
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        ReportgenConfig::default().resolve()
    }
}

/// Discover and load a config file from the input root
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(input_root: &Path) -> Result<Option<(ReportgenConfig, PathBuf)>> {
    for name in [".reportgenrc.json", "reportgen.config.json"] {
        let path = input_root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<ReportgenConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: ReportgenConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for an input root
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the input root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(input_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(input_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (ReportgenConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}
