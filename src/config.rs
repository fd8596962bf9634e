//! Optional filter rules loaded from a TOML file.
//!
//! Nothing is read unless a file is passed explicitly with `--config`; without
//! one every top-level file is a candidate for organizing. Files matched by an
//! exclusion rule stay where they are and are reported as skipped.
//!
//! # Configuration File Format
//!
//! ```toml
//! [filters]
//! include_hidden = true
//! exclude_names = ["Thumbs.db", "desktop.ini"]
//! exclude_extensions = ["part", "crdownload"]
//! exclude_globs = ["~$*"]
//! exclude_regex = ['^\d{8}_backup\.']
//! keep_globs = ["important.*"]
//! ```
//!
//! Rules are matched against the file name only, since organizing never
//! descends into subdirectories.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading or compiling filter rules.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// The configuration file does not exist.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// A glob in `exclude_globs` or `keep_globs` does not compile.
    InvalidGlobPattern(String),
    /// A regex in `exclude_regex` does not compile.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading the file.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filters: FilterRules,
}

/// Which top-level files to leave alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether dotfiles such as `.env.local` are organized. Defaults to true.
    #[serde(default = "default_include_hidden")]
    pub include_hidden: bool,

    /// Exact file names to leave in place.
    #[serde(default)]
    pub exclude_names: Vec<String>,

    /// Extensions to leave in place, without the dot; compared case-insensitively.
    #[serde(default)]
    pub exclude_extensions: Vec<String>,

    /// Glob patterns matched against the file name.
    #[serde(default)]
    pub exclude_globs: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub exclude_regex: Vec<String>,

    /// Globs that override every exclusion above.
    #[serde(default)]
    pub keep_globs: Vec<String>,
}

fn default_include_hidden() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: default_include_hidden(),
            exclude_names: Vec::new(),
            exclude_extensions: Vec::new(),
            exclude_globs: Vec::new(),
            exclude_regex: Vec::new(),
            keep_globs: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the file at `config_path`, or returns the defaults when `None`.
    ///
    /// No implicit locations are searched.
    ///
    /// # Errors
    ///
    /// Returns an error if the given file is missing, unreadable, or not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compiles the filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile(self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self.filters)
    }
}

/// Filter rules with every pattern compiled once up front.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    include_hidden: bool,
    exclude_names: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_globs: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    keep_globs: Vec<Pattern>,
}

impl Default for CompiledFilters {
    /// Filters that exclude nothing.
    fn default() -> Self {
        Self {
            include_hidden: true,
            exclude_names: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_globs: Vec::new(),
            exclude_regexes: Vec::new(),
            keep_globs: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|_| ConfigError::InvalidGlobPattern(p.clone())))
        .collect()
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_regexes = rules
            .exclude_regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            exclude_names: rules.exclude_names.into_iter().collect(),
            exclude_extensions: rules
                .exclude_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_globs: compile_globs(&rules.exclude_globs)?,
            exclude_regexes,
            keep_globs: compile_globs(&rules.keep_globs)?,
        })
    }

    /// Returns true if the file called `name` with lowercase `extension` must
    /// stay where it is.
    ///
    /// A matching keep glob wins over every exclusion.
    pub fn excludes(&self, name: &str, extension: &str) -> bool {
        if self.keep_globs.iter().any(|p| p.matches(name)) {
            return false;
        }

        (!self.include_hidden && name.starts_with('.'))
            || self.exclude_names.contains(name)
            || self.exclude_extensions.contains(extension)
            || self.exclude_globs.iter().any(|p| p.matches(name))
            || self.exclude_regexes.iter().any(|r| r.is_match(name))
    }
}
