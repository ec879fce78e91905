//! Filesystem access used by the gatherer.
//!
//! The gatherer only needs three operations, so they are abstracted behind
//! [`FileSystem`]. [`OsFileSystem`] talks to the real disk and
//! [`MemoryFileSystem`] backs deterministic tests.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

/// What a path refers to, as far as gathering is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file, or a symlink to one.
    File,
    /// Directory (symlinked directories are not followed).
    Directory,
    /// Anything else; skipped by the gatherer.
    Other,
}

/// A single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Base name of the entry, exactly as the filesystem reported it.
    pub file_name: OsString,
    /// Kind of entry.
    pub kind: EntryKind,
}

impl DirEntry {
    /// Base name for display and matching. Invalid UTF-8 is replaced.
    pub fn name(&self) -> Cow<'_, str> {
        self.file_name.to_string_lossy()
    }
}

/// Read-only filesystem operations needed to gather files.
pub trait FileSystem: Send + Sync {
    /// Classify the entry at `path`.
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind>;

    /// List the entries of a directory, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Read a file's full content.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl OsFileSystem {
    fn classify(path: &Path, file_type: std::fs::FileType) -> EntryKind {
        if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_symlink() {
            // Only symlinks to regular files are followed
            match std::fs::metadata(path) {
                Ok(meta) if meta.is_file() => EntryKind::File,
                _ => EntryKind::Other,
            }
        } else {
            EntryKind::Other
        }
    }
}

impl FileSystem for OsFileSystem {
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::classify(path, metadata.file_type()))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            entries.push(DirEntry {
                file_name: entry.file_name(),
                kind: Self::classify(&entry.path(), file_type),
            });
        }
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

#[derive(Debug, Clone)]
enum MemoryNode {
    File(Vec<u8>),
    Directory,
}

/// In-memory filesystem for tests.
///
/// Paths are normalized, so `./src/main.rs` and `src/main.rs` refer to the
/// same entry. Parent directories are created implicitly. The empty path
/// (also reachable as `.`) is the root directory.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    nodes: BTreeMap<PathBuf, MemoryNode>,
    denied: BTreeSet<PathBuf>,
    reads: std::sync::Arc<std::sync::Mutex<Vec<PathBuf>>>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem containing only the root directory.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::from([(PathBuf::new(), MemoryNode::Directory)]),
            denied: BTreeSet::new(),
            reads: Default::default(),
        }
    }

    /// Add a file with the given content.
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        let path = normalize(path.as_ref());
        self.add_parents(&path);
        self.nodes.insert(path, MemoryNode::File(content.into()));
        self
    }

    /// Add an empty directory.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        let path = normalize(path.as_ref());
        self.add_parents(&path);
        self.nodes.insert(path, MemoryNode::Directory);
        self
    }

    /// Make reads of `path` (file content or directory listing) fail with
    /// a permission error.
    pub fn deny(mut self, path: impl AsRef<Path>) -> Self {
        self.denied.insert(normalize(path.as_ref()));
        self
    }

    /// Directories listed and files read so far, in call order.
    pub fn accessed(&self) -> Vec<PathBuf> {
        self.reads.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn add_parents(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            self.nodes
                .entry(ancestor.to_path_buf())
                .or_insert(MemoryNode::Directory);
        }
    }

    fn record(&self, path: &Path) -> io::Result<()> {
        if let Ok(mut reads) = self.reads.lock() {
            reads.push(path.to_path_buf());
        }
        if self.denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            ));
        }
        Ok(())
    }

    fn lookup(&self, path: &Path) -> io::Result<(PathBuf, &MemoryNode)> {
        let path = normalize(path);
        match self.nodes.get(&path) {
            Some(node) => Ok((path, node)),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such entry: {}", path.display()),
            )),
        }
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MemoryFileSystem {
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        let (_, node) = self.lookup(path)?;
        Ok(match node {
            MemoryNode::File(_) => EntryKind::File,
            MemoryNode::Directory => EntryKind::Directory,
        })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let (path, node) = self.lookup(path)?;
        if !matches!(node, MemoryNode::Directory) {
            return Err(io::Error::other(format!("not a directory: {}", path.display())));
        }
        self.record(&path)?;

        let entries = self
            .nodes
            .iter()
            .filter(|(candidate, _)| {
                !candidate.as_os_str().is_empty() && candidate.parent() == Some(path.as_path())
            })
            .filter_map(|(candidate, node)| {
                let file_name = candidate.file_name()?.to_os_string();
                let kind = match node {
                    MemoryNode::File(_) => EntryKind::File,
                    MemoryNode::Directory => EntryKind::Directory,
                };
                Some(DirEntry { file_name, kind })
            })
            .collect();
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let (path, node) = self.lookup(path)?;
        match node {
            MemoryNode::File(data) => {
                self.record(&path)?;
                Ok(data.clone())
            }
            MemoryNode::Directory => Err(io::Error::other(format!("is a directory: {}", path.display()))),
        }
    }
}

/// Drop `.` components and resolve `..` lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}
