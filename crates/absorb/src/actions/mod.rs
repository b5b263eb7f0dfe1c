//! Destructive stages: scene rewriting and loose-file deletion

pub mod delete;
pub mod rewrite;

pub use delete::{DeleteSummary, Deleter, deletion_set};
pub use rewrite::{ReferenceRewriter, RewriteSummary, splice_references};

/// Prefix of every log line describing a change skipped by a dry run
pub const DRY_RUN_MARKER: &str = "[DRY-RUN] ";
