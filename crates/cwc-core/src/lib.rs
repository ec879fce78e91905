//! Core types and traits for cwc.
//!
//! This crate provides the fundamental data structures used by the file
//! gathering engine: tree nodes, selected file records, the gather
//! configuration, and the [`PathMatcher`] capability with its regex and
//! compound implementations.

mod config;
mod error;
mod matcher;
mod node;

pub use config::{GatherConfig, GatherConfigBuilder};
pub use error::{GatherError, MatchError};
pub use matcher::{Candidate, CompoundMatcher, MatchAll, PathMatcher, RegexMatcher};
pub use node::{File, FileNode, NodeKind};
