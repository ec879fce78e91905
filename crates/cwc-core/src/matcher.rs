//! Path matchers used for inclusion and exclusion decisions.
//!
//! Any type implementing [`PathMatcher`] can take part in a
//! [`CompoundMatcher`], regardless of how it decides internally.

use std::fmt;
use std::path::Path;

use regex::Regex;

use crate::error::MatchError;

/// An entry presented to a matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    /// Path relative to the scan root, `/`-separated.
    pub relative: &'a str,
    /// Path of the entry on disk.
    pub path: &'a Path,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl<'a> Candidate<'a> {
    /// Create a candidate for a file.
    pub fn file(relative: &'a str, path: &'a Path) -> Self {
        Self {
            relative,
            path,
            is_dir: false,
        }
    }

    /// Create a candidate for a directory.
    pub fn dir(relative: &'a str, path: &'a Path) -> Self {
        Self {
            relative,
            path,
            is_dir: true,
        }
    }
}

/// Capability to answer "does this path match?".
///
/// Implementations are immutable after construction and may be shared
/// across gather calls and threads.
pub trait PathMatcher: Send + Sync + fmt::Debug {
    /// Check a single candidate.
    fn matches(&self, candidate: &Candidate<'_>) -> Result<bool, MatchError>;

    /// Check a batch of candidates, returning one flag per candidate.
    ///
    /// Matchers backed by an external process override this to answer a
    /// whole directory listing with one invocation.
    fn matches_batch(&self, candidates: &[Candidate<'_>]) -> Result<Vec<bool>, MatchError> {
        candidates.iter().map(|c| self.matches(c)).collect()
    }
}

impl<M: PathMatcher + ?Sized> PathMatcher for Box<M> {
    fn matches(&self, candidate: &Candidate<'_>) -> Result<bool, MatchError> {
        (**self).matches(candidate)
    }

    fn matches_batch(&self, candidates: &[Candidate<'_>]) -> Result<Vec<bool>, MatchError> {
        (**self).matches_batch(candidates)
    }
}

/// Matches every path.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchAll;

impl PathMatcher for MatchAll {
    fn matches(&self, _candidate: &Candidate<'_>) -> Result<bool, MatchError> {
        Ok(true)
    }
}

/// Matches paths against a single regular expression.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    /// Compile a matcher from a pattern.
    pub fn new(pattern: &str) -> Result<Self, MatchError> {
        let regex = Regex::new(pattern).map_err(|source| MatchError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    /// Whether the pattern is found anywhere in `path`.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PathMatcher for RegexMatcher {
    /// Directories are also tried with a trailing `/`, so `vendor/` matches
    /// the `vendor` directory itself and not only its contents.
    fn matches(&self, candidate: &Candidate<'_>) -> Result<bool, MatchError> {
        if self.is_match(candidate.relative) {
            return Ok(true);
        }
        Ok(candidate.is_dir && self.is_match(&format!("{}/", candidate.relative)))
    }
}

/// OR-aggregation of child matchers.
///
/// Children are asked in order and evaluation stops at the first match.
/// An empty compound matcher never matches.
#[derive(Debug, Default)]
pub struct CompoundMatcher {
    matchers: Vec<Box<dyn PathMatcher>>,
}

impl CompoundMatcher {
    /// Create a compound matcher from child matchers.
    pub fn new(matchers: Vec<Box<dyn PathMatcher>>) -> Self {
        Self { matchers }
    }

    /// A compound matcher with no children.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a child matcher.
    pub fn push(&mut self, matcher: impl PathMatcher + 'static) {
        self.matchers.push(Box::new(matcher));
    }

    /// Number of child matchers.
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Whether there are no child matchers.
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl PathMatcher for CompoundMatcher {
    fn matches(&self, candidate: &Candidate<'_>) -> Result<bool, MatchError> {
        for matcher in &self.matchers {
            if matcher.matches(candidate)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn matches_batch(&self, candidates: &[Candidate<'_>]) -> Result<Vec<bool>, MatchError> {
        let mut matched = vec![false; candidates.len()];

        for matcher in &self.matchers {
            // Later children only see candidates nobody has claimed yet
            let pending: Vec<usize> = (0..candidates.len()).filter(|&i| !matched[i]).collect();
            if pending.is_empty() {
                break;
            }

            let subset: Vec<Candidate<'_>> = pending.iter().map(|&i| candidates[i]).collect();
            let results = matcher.matches_batch(&subset)?;
            for (index, hit) in pending.into_iter().zip(results) {
                matched[index] |= hit;
            }
        }

        Ok(matched)
    }
}
