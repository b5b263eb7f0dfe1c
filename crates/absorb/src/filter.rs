//! Exclusion filters over root-relative paths

use glob::{MatchOptions, Pattern};

use crate::error::{AbsorbError, Result};

/// Predicate deciding which loose files must never be deleted
pub trait Filter: Send + Sync {
    /// `true` when `local_path` is excluded
    fn is_filtered(&self, local_path: &str) -> bool;
}

/// Filter that excludes nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFilter;

impl Filter for NoFilter {
    fn is_filtered(&self, _local_path: &str) -> bool {
        false
    }
}

/// Excludes paths matching any of a set of glob patterns.
///
/// Patterns and paths are compared with `/` separators and without regard to
/// case. A pattern without wildcards also excludes everything below it, so
/// `Saves/scene` protects the whole folder.
#[derive(Debug, Clone, Default)]
pub struct ExcludeFilter {
    patterns: Vec<Pattern>,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl ExcludeFilter {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for raw in patterns {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            let normalized = raw.replace('\\', "/");
            let normalized = normalized.trim_end_matches('/');
            for pattern in [normalized.to_string(), format!("{normalized}/*")] {
                compiled.push(Pattern::new(&pattern).map_err(|e| AbsorbError::InvalidPattern {
                    pattern: raw.to_string(),
                    reason: e.msg.to_string(),
                })?);
            }
        }
        Ok(Self { patterns: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Filter for ExcludeFilter {
    fn is_filtered(&self, local_path: &str) -> bool {
        let path = local_path.replace('\\', "/");
        self.patterns
            .iter()
            .any(|p| p.matches_with(&path, MATCH_OPTIONS))
    }
}
