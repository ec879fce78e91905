//! Tree nodes and selected file records.

use std::borrow::Cow;
use std::path::Path;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Type of tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Regular file (always a leaf).
    File,
    /// Directory.
    Directory,
}

/// A single file or directory in the gathered tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// File/directory name (not full path).
    pub name: CompactString,

    /// Node type.
    pub kind: NodeKind,

    /// Children nodes (directories only), sorted by name.
    pub children: Vec<FileNode>,
}

impl FileNode {
    /// Create a new file node.
    pub fn new_file(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    /// Create a new, empty directory node.
    pub fn new_directory(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Directory,
            children: Vec::new(),
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of file leaves in this subtree (1 for a file).
    pub fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children.iter().map(FileNode::file_count).sum(),
        }
    }

    /// Find a descendant by following `/`-separated segments from this node.
    ///
    /// The empty path resolves to the node itself.
    pub fn find(&self, path: &str) -> Option<&FileNode> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| {
                node.children.iter().find(|c| c.name.as_str() == segment)
            })
    }

    /// Paths of every file leaf below this node, relative to it.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for child in &self.children {
            child.collect_leaves("", &mut paths);
        }
        paths
    }

    fn collect_leaves(&self, prefix: &str, out: &mut Vec<String>) {
        let path = if prefix.is_empty() {
            self.name.to_string()
        } else {
            format!("{prefix}/{}", self.name)
        };
        match self.kind {
            NodeKind::File => out.push(path),
            NodeKind::Directory => {
                for child in &self.children {
                    child.collect_leaves(&path, out);
                }
            }
        }
    }

    /// Sort children by name, recursively.
    pub fn sort_children_by_name(&mut self) {
        self.children.sort_by(|a, b| a.name.cmp(&b.name));
        for child in &mut self.children {
            child.sort_children_by_name();
        }
    }
}

/// A selected file with its content loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Path relative to the scan root, `/`-separated.
    pub path: String,

    /// Extension label used to annotate content blocks (empty if none).
    pub file_type: String,

    /// Full file content.
    pub data: Vec<u8>,
}

impl File {
    /// Create a file record, deriving the type label from the extension.
    pub fn new(path: impl Into<String>, data: Vec<u8>) -> Self {
        let path = path.into();
        let file_type = Path::new(&path)
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            file_type,
            data,
        }
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Content decoded as UTF-8, with invalid sequences replaced.
    pub fn contents(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}
