//! Gather configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Declarative description of what to gather.
///
/// This is the serializable form of the command-line flags. Matchers are
/// built from it once per invocation.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct GatherConfig {
    /// Regex selecting files to include.
    #[builder(default = "default_include()")]
    #[serde(default = "default_include")]
    pub include: String,

    /// Regex selecting files and directories to exclude.
    #[builder(default)]
    #[serde(default)]
    pub exclude: Option<String>,

    /// Roots to scan, in order.
    #[builder(default = "default_paths()")]
    #[serde(default = "default_paths")]
    pub paths: Vec<PathBuf>,

    /// Exclude whatever git considers ignored.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub exclude_from_gitignore: bool,

    /// Exclude `.git` directories.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub exclude_git_dir: bool,

    /// Executable used for gitignore resolution.
    #[builder(default = "default_git_program()")]
    #[serde(default = "default_git_program")]
    pub git_program: String,

    /// Files larger than this (bytes) trigger an advisory warning.
    #[builder(default = "100_000")]
    #[serde(default = "default_large_file_threshold")]
    pub large_file_threshold: u64,
}

fn default_include() -> String {
    ".*".to_string()
}

fn default_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_true() -> bool {
    true
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_large_file_threshold() -> u64 {
    100_000
}

impl GatherConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref paths) = self.paths {
            if paths.is_empty() {
                return Err("At least one path is required".to_string());
            }
            if paths.iter().any(|p| p.as_os_str().is_empty()) {
                return Err("Paths cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl GatherConfig {
    /// Create a new gather config builder.
    pub fn builder() -> GatherConfigBuilder {
        GatherConfigBuilder::default()
    }

    /// Create a config with defaults for the given roots.
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// The exclude pattern, if one was given and it is not blank.
    pub fn exclude_pattern(&self) -> Option<&str> {
        self.exclude.as_deref().filter(|p| !p.is_empty())
    }
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: None,
            paths: default_paths(),
            exclude_from_gitignore: true,
            exclude_git_dir: true,
            git_program: default_git_program(),
            large_file_threshold: default_large_file_threshold(),
        }
    }
}
