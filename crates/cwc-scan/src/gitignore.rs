//! Gitignore matching delegated to the `git` executable.

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use cwc_core::{Candidate, MatchError, PathMatcher};

/// Maximum number of paths passed to a single `git check-ignore` call.
const CHECK_IGNORE_CHUNK: usize = 256;

/// Matches whatever git's own ignore rules consider ignored.
///
/// Candidates are resolved with `git check-ignore` run from the
/// candidate's parent directory, so nested `.gitignore` files, the
/// repository's `info/exclude` and the user's global excludes all apply.
#[derive(Debug, Clone)]
pub struct GitignoreMatcher {
    tool: String,
    program: PathBuf,
}

impl GitignoreMatcher {
    /// Locate `git` on the search path.
    pub fn new() -> Result<Self, MatchError> {
        Self::with_program("git")
    }

    /// Locate a specific git executable on the search path.
    pub fn with_program(name: &str) -> Result<Self, MatchError> {
        let program = which::which(name).map_err(|_| MatchError::ToolNotAvailable {
            tool: name.to_string(),
        })?;
        tracing::debug!(program = %program.display(), "using git for ignore checks");
        Ok(Self {
            tool: name.to_string(),
            program,
        })
    }

    /// Run `git check-ignore` for `names` inside `dir` and return the
    /// names git reported as ignored.
    fn check_ignore(&self, dir: &Path, names: &[String]) -> Result<HashSet<String>, MatchError> {
        // Untranslated messages, so the repository check below holds in any locale
        let output = Command::new(&self.program)
            .env("LC_ALL", "C")
            .env("LANGUAGE", "C")
            .arg("-C")
            .arg(dir)
            .args(["check-ignore", "-z", "--"])
            .args(names)
            .output()
            .map_err(|source| MatchError::ToolIo {
                tool: self.tool.clone(),
                source,
            })?;

        match output.status.code() {
            Some(0) => Ok(output
                .stdout
                .split(|&b| b == 0)
                .filter(|name| !name.is_empty())
                .map(|name| trim_dir_suffix(&String::from_utf8_lossy(name)).to_string())
                .collect()),
            Some(1) => Ok(HashSet::new()),
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if stderr.contains("not a git repository") {
                    // No repository, so no ignore rules apply here
                    return Ok(HashSet::new());
                }
                Err(MatchError::ExternalTool {
                    tool: self.tool.clone(),
                    path: dir.to_path_buf(),
                    message: match stderr.trim() {
                        "" => format!("check-ignore exited with {}", output.status),
                        message => message.to_string(),
                    },
                })
            }
        }
    }
}

impl PathMatcher for GitignoreMatcher {
    fn matches(&self, candidate: &Candidate<'_>) -> Result<bool, MatchError> {
        let results = self.matches_batch(std::slice::from_ref(candidate))?;
        Ok(results.first().copied().unwrap_or(false))
    }

    fn matches_batch(&self, candidates: &[Candidate<'_>]) -> Result<Vec<bool>, MatchError> {
        let mut matched = vec![false; candidates.len()];

        // Group by directory so each listing costs one git invocation
        let mut by_dir: BTreeMap<PathBuf, Vec<(usize, String)>> = BTreeMap::new();
        for (index, candidate) in candidates.iter().enumerate() {
            if inside_git_dir(candidate.path) {
                continue;
            }
            let Some(name) = candidate.path.file_name() else {
                continue;
            };
            let dir = match candidate.path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let mut name = name.to_string_lossy().into_owned();
            if candidate.is_dir {
                name.push('/');
            }
            by_dir.entry(dir).or_default().push((index, name));
        }

        for (dir, entries) in by_dir {
            for chunk in entries.chunks(CHECK_IGNORE_CHUNK) {
                let names: Vec<String> = chunk.iter().map(|(_, name)| name.clone()).collect();
                let ignored = self.check_ignore(&dir, &names)?;
                tracing::debug!(
                    dir = %dir.display(),
                    checked = names.len(),
                    ignored = ignored.len(),
                    "git check-ignore"
                );
                for (index, name) in chunk {
                    if ignored.contains(trim_dir_suffix(name)) {
                        matched[*index] = true;
                    }
                }
            }
        }

        Ok(matched)
    }
}

fn trim_dir_suffix(name: &str) -> &str {
    name.strip_suffix('/').unwrap_or(name)
}

/// Git refuses to reason about its own metadata directory.
fn inside_git_dir(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == ".git"))
}
