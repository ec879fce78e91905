//! File gathering engine for cwc.
//!
//! This crate walks one or more scan roots, prunes everything the exclude
//! matcher rejects, and returns both a tree of what remains and a flat list
//! of the files the include matcher selected, with their contents loaded.
//!
//! # Overview
//!
//! - **Pruning**: an excluded directory is never read
//! - **Deterministic order**: entries are visited by name
//! - **Gitignore support** via the `git` executable (feature `git`)
//! - **Injectable filesystem** for tests ([`MemoryFileSystem`])
//!
//! # Example
//!
//! ```rust,no_run
//! use cwc_scan::{FileGatherOptions, FileGatherer, GatherConfig, generate_file_tree};
//!
//! let config = GatherConfig::new(["./cmd", "./pkg"]);
//! let options = FileGatherOptions::from_config(&config).unwrap();
//! let gathered = FileGatherer::new().gather(&options).unwrap();
//!
//! print!("{}", generate_file_tree(&gathered.root));
//! println!("{} files selected", gathered.files.len());
//! ```

mod context;
mod fs;
mod gatherer;
#[cfg(feature = "git")]
mod gitignore;
mod render;

pub use context::{build_context, large_files, warn_large_files};
pub use fs::{DirEntry, EntryKind, FileSystem, MemoryFileSystem, OsFileSystem};
pub use gatherer::{FileGatherOptions, FileGatherer, GIT_DIR_PATTERN, Gathered, gather_files};
#[cfg(feature = "git")]
pub use gitignore::GitignoreMatcher;
pub use render::generate_file_tree;

// Re-export core types for convenience
pub use cwc_core::{
    Candidate, CompoundMatcher, File, FileNode, GatherConfig, GatherError, MatchAll, MatchError,
    NodeKind, PathMatcher, RegexMatcher,
};
