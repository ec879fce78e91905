//! Directory walker that builds the file tree and the selection list.

use std::path::{Path, PathBuf};

use cwc_core::{
    Candidate, CompoundMatcher, File, FileNode, GatherConfig, GatherError, MatchAll, PathMatcher,
    RegexMatcher,
};

use crate::fs::{EntryKind, FileSystem, OsFileSystem};

/// Pattern excluding `.git` directories at any depth.
pub const GIT_DIR_PATTERN: &str = r"(^|/)\.git/?$";

/// Matchers and roots for a single gather call.
#[derive(Debug)]
pub struct FileGatherOptions {
    /// Files must match this to be selected.
    pub include: Box<dyn PathMatcher>,
    /// Entries matching this are pruned, subtree and all.
    pub exclude: CompoundMatcher,
    /// Roots to scan, in order. Overlaps are not deduplicated.
    pub scopes: Vec<PathBuf>,
}

impl FileGatherOptions {
    /// Options selecting everything under `scopes`.
    pub fn new(scopes: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            include: Box::new(MatchAll),
            exclude: CompoundMatcher::empty(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Replace the include matcher.
    pub fn with_include(mut self, include: impl PathMatcher + 'static) -> Self {
        self.include = Box::new(include);
        self
    }

    /// Replace the exclude matcher.
    pub fn with_exclude(mut self, exclude: CompoundMatcher) -> Self {
        self.exclude = exclude;
        self
    }

    /// Build matchers from a config.
    ///
    /// Any matcher that cannot be built is fatal, except the gitignore
    /// matcher when git is not installed: that one is skipped with a
    /// warning and gathering continues with the remaining matchers.
    pub fn from_config(config: &GatherConfig) -> Result<Self, GatherError> {
        let mut exclude = CompoundMatcher::empty();

        if let Some(pattern) = config.exclude_pattern() {
            let matcher = RegexMatcher::new(pattern)
                .map_err(|e| GatherError::matcher_setup("error creating exclude matcher", e))?;
            exclude.push(matcher);
        }

        if config.exclude_git_dir {
            let matcher = RegexMatcher::new(GIT_DIR_PATTERN)
                .map_err(|e| GatherError::matcher_setup("error creating git directory matcher", e))?;
            exclude.push(matcher);
        }

        if config.exclude_from_gitignore {
            push_gitignore(&mut exclude, &config.git_program)?;
        }

        let include = RegexMatcher::new(&config.include)
            .map_err(|e| GatherError::matcher_setup("error creating include matcher", e))?;

        if config.paths.is_empty() {
            return Err(GatherError::InvalidConfig {
                message: "at least one path is required".to_string(),
                source: None,
            });
        }

        Ok(Self {
            include: Box::new(include),
            exclude,
            scopes: config.paths.clone(),
        })
    }
}

#[cfg(feature = "git")]
fn push_gitignore(exclude: &mut CompoundMatcher, program: &str) -> Result<(), GatherError> {
    match crate::gitignore::GitignoreMatcher::with_program(program) {
        Ok(matcher) => {
            exclude.push(matcher);
            Ok(())
        }
        Err(err) if err.is_tool_not_available() => {
            tracing::warn!("{program} not found in PATH, skipping .gitignore");
            Ok(())
        }
        Err(err) => Err(GatherError::matcher_setup("error creating gitignore matcher", err)),
    }
}

#[cfg(not(feature = "git"))]
fn push_gitignore(_exclude: &mut CompoundMatcher, _program: &str) -> Result<(), GatherError> {
    tracing::warn!("built without git support, skipping .gitignore");
    Ok(())
}

/// Result of a gather call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gathered {
    /// Selected files, in walk order.
    pub files: Vec<File>,
    /// Root of the built tree.
    pub root: FileNode,
}

/// Walks scopes and applies include/exclude matchers.
#[derive(Debug, Clone, Default)]
pub struct FileGatherer<F = OsFileSystem> {
    fs: F,
}

impl FileGatherer<OsFileSystem> {
    /// Create a gatherer over the host filesystem.
    pub fn new() -> Self {
        Self { fs: OsFileSystem }
    }
}

impl<F: FileSystem> FileGatherer<F> {
    /// Create a gatherer over a custom filesystem.
    pub fn with_fs(fs: F) -> Self {
        Self { fs }
    }

    /// The filesystem this gatherer reads from.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Walk every scope and collect the tree and selected files.
    ///
    /// With a single directory scope the returned root is that directory.
    /// Otherwise it is a synthetic `.` directory holding one node per scope.
    pub fn gather(&self, options: &FileGatherOptions) -> Result<Gathered, GatherError> {
        if options.scopes.is_empty() {
            return Err(GatherError::InvalidConfig {
                message: "at least one path is required".to_string(),
                source: None,
            });
        }

        let mut files = Vec::new();
        let mut scope_nodes = Vec::with_capacity(options.scopes.len());

        for scope in &options.scopes {
            let node = self.gather_scope(scope, options, &mut files)?;
            scope_nodes.extend(node);
        }

        let root = match (options.scopes.len(), scope_nodes.pop()) {
            (1, Some(node)) if node.is_dir() => node,
            (_, last) => {
                let mut root = FileNode::new_directory(".");
                root.children = scope_nodes;
                root.children.extend(last);
                root
            }
        };

        tracing::debug!(
            scopes = options.scopes.len(),
            selected = files.len(),
            "gather complete"
        );

        Ok(Gathered { files, root })
    }

    /// Gather a single scope. Returns `None` if the scope itself is an
    /// excluded file.
    fn gather_scope(
        &self,
        scope: &Path,
        options: &FileGatherOptions,
        files: &mut Vec<File>,
    ) -> Result<Option<FileNode>, GatherError> {
        let kind = self
            .fs
            .entry_kind(scope)
            .map_err(|e| GatherError::io(scope, e))?;

        match kind {
            EntryKind::Directory => {
                let mut node = FileNode::new_directory(scope_name(scope));
                self.walk_dir(scope, "", &mut node, options, files)?;
                Ok(Some(node))
            }
            EntryKind::File => {
                let name = scope
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| scope_name(scope));
                let candidate = Candidate::file(&name, scope);

                if options
                    .exclude
                    .matches(&candidate)
                    .map_err(|source| matcher_error(scope, source))?
                {
                    return Ok(None);
                }
                self.select_file(&candidate, options, files)?;
                Ok(Some(FileNode::new_file(name.as_str())))
            }
            EntryKind::Other => Err(GatherError::UnsupportedEntry {
                path: scope.to_path_buf(),
            }),
        }
    }

    /// Recursively walk `dir`, whose path relative to the scope is `relative`.
    fn walk_dir(
        &self,
        dir: &Path,
        relative: &str,
        node: &mut FileNode,
        options: &FileGatherOptions,
        files: &mut Vec<File>,
    ) -> Result<(), GatherError> {
        let mut entries = self.fs.read_dir(dir).map_err(|e| GatherError::io(dir, e))?;
        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        entries.retain(|entry| {
            let keep = entry.kind != EntryKind::Other;
            if !keep {
                let path = dir.join(&entry.file_name);
                tracing::debug!(path = %path.display(), "skipping special entry");
            }
            keep
        });

        // Lossy names are for matching and display only; disk access keeps
        // the raw file name
        let relatives: Vec<String> = entries
            .iter()
            .map(|entry| join_relative(relative, &entry.name()))
            .collect();
        let paths: Vec<PathBuf> = entries
            .iter()
            .map(|entry| dir.join(&entry.file_name))
            .collect();
        let candidates: Vec<Candidate<'_>> = entries
            .iter()
            .zip(relatives.iter().zip(&paths))
            .map(|(entry, (rel, path))| Candidate {
                relative: rel,
                path,
                is_dir: entry.kind == EntryKind::Directory,
            })
            .collect();

        // Exclusion comes first so pruned subtrees are never read
        let excluded = options
            .exclude
            .matches_batch(&candidates)
            .map_err(|source| matcher_error(dir, source))?;

        for ((entry, candidate), excluded) in entries.iter().zip(&candidates).zip(excluded) {
            if excluded {
                tracing::trace!(path = candidate.relative, "excluded");
                continue;
            }

            if candidate.is_dir {
                let mut child = FileNode::new_directory(entry.name());
                self.walk_dir(candidate.path, candidate.relative, &mut child, options, files)?;
                node.children.push(child);
            } else {
                self.select_file(candidate, options, files)?;
                node.children.push(FileNode::new_file(entry.name()));
            }
        }

        Ok(())
    }

    /// Load the file into the selection if the include matcher accepts it.
    fn select_file(
        &self,
        candidate: &Candidate<'_>,
        options: &FileGatherOptions,
        files: &mut Vec<File>,
    ) -> Result<(), GatherError> {
        let included = options
            .include
            .matches(candidate)
            .map_err(|source| matcher_error(candidate.path, source))?;
        if included {
            let data = self
                .fs
                .read(candidate.path)
                .map_err(|e| GatherError::io(candidate.path, e))?;
            files.push(File::new(candidate.relative, data));
        }
        Ok(())
    }
}

/// Gather from the host filesystem.
pub fn gather_files(options: &FileGatherOptions) -> Result<(Vec<File>, FileNode), GatherError> {
    let Gathered { files, root } = FileGatherer::new().gather(options)?;
    Ok((files, root))
}

fn matcher_error(path: &Path, source: cwc_core::MatchError) -> GatherError {
    GatherError::Matcher {
        path: path.to_path_buf(),
        source,
    }
}

fn join_relative(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// Display name for a scope root: the path as given, without a leading
/// `./` or trailing separator.
fn scope_name(scope: &Path) -> String {
    let raw = scope.to_string_lossy();
    let mut name: &str = &raw;
    while let Some(rest) = name.strip_prefix("./") {
        name = rest;
    }
    let name = name.trim_end_matches(['/', std::path::MAIN_SEPARATOR]);
    match name {
        "" if raw.starts_with('/') => "/".to_string(),
        "" => ".".to_string(),
        name => name.to_string(),
    }
}
