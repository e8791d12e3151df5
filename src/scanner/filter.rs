//! Exclude pattern matching against file base names

use glob::{MatchOptions, Pattern};
use std::path::Path;

use crate::config::ConfigError;

/// Shell-glob options: `*` and `?` also match a leading dot, matching is case sensitive.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled set of exclude patterns
///
/// A file is excluded when its base name matches any pattern, whatever the
/// directory depth it was found at.
#[derive(Debug, Clone, Default)]
pub struct ExcludeFilter {
    patterns: Vec<Pattern>,
}

impl ExcludeFilter {
    /// Compile patterns (`*`, `?`, `[...]`, `[!...]`)
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.to_string(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Filter that excludes nothing
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether a base name matches any pattern
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(file_name, MATCH_OPTIONS))
    }

    /// Whether the base name of `path` matches any pattern
    pub fn is_excluded_path(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.is_excluded(&name.to_string_lossy()))
            .unwrap_or(false)
    }

    /// Number of compiled patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when no patterns are configured
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
