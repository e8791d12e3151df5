//! File enumeration
//!
//! Turns a root path into an ordered, finite sequence of [`UploadTarget`]s.
//!
//! - A regular file root yields that file (unless excluded).
//! - A directory root yields its regular files, name-sorted within each
//!   directory, descending into subdirectories only when recursive.
//! - Symlinks to regular files are uploaded; symlinked directories are never
//!   followed, so the walk cannot cycle.
//!
//! The returned [`Enumeration`] is consumed by value: walking the tree again
//! requires a new [`FileEnumerator::scan`].

pub mod filter;

pub use filter::ExcludeFilter;

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{ConfigError, RunConfig};
use crate::UploadTarget;

/// Enumeration errors
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Root path does not exist
    #[error("path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    /// Root exists but is neither a regular file nor a directory
    #[error("not a regular file or directory: {}", .0.display())]
    Unsupported(PathBuf),

    /// Nothing left to upload after filtering
    #[error("no files selected ({excluded} excluded)")]
    EmptySelection {
        /// Files dropped by exclude patterns
        excluded: usize,
    },

    /// Root could not be inspected
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

/// Enumerator settings for one scan
#[derive(Debug, Clone)]
pub struct FileEnumerator {
    root: PathBuf,
    recursive: bool,
    filter: ExcludeFilter,
}

impl FileEnumerator {
    /// Create an enumerator
    pub fn new(root: impl Into<PathBuf>, recursive: bool, filter: ExcludeFilter) -> Self {
        Self {
            root: root.into(),
            recursive,
            filter,
        }
    }

    /// Create an enumerator from the path, recursion and exclude settings of a run
    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.path.clone(),
            config.recursive,
            config.exclude_filter()?,
        ))
    }

    /// Inspect the root and start a lazy enumeration
    pub fn scan(self) -> Result<Enumeration, ScanError> {
        let metadata = match std::fs::metadata(&self.root) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ScanError::NotFound(self.root));
            }
            Err(source) => {
                return Err(ScanError::Io {
                    path: self.root,
                    source,
                });
            }
        };

        let root = std::path::absolute(&self.root).map_err(|source| ScanError::Io {
            path: self.root.clone(),
            source,
        })?;

        if metadata.is_file() {
            debug!(root = %root.display(), "Enumerating single file");
            return Ok(Enumeration {
                source: Source::Single(Some(root.clone())),
                base: root.parent().map(Path::to_path_buf).unwrap_or_default(),
                filter: self.filter,
                excluded: 0,
                single_file: true,
            });
        }

        if !metadata.is_dir() {
            return Err(ScanError::Unsupported(self.root));
        }

        let mut walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        debug!(
            root = %root.display(),
            recursive = self.recursive,
            patterns = self.filter.len(),
            "Enumerating directory"
        );

        Ok(Enumeration {
            source: Source::Walk(walker.into_iter()),
            base: root,
            filter: self.filter,
            excluded: 0,
            single_file: false,
        })
    }
}

enum Source {
    Single(Option<PathBuf>),
    Walk(walkdir::IntoIter),
}

/// Lazy, non-restartable sequence of upload targets
pub struct Enumeration {
    source: Source,
    base: PathBuf,
    filter: ExcludeFilter,
    excluded: usize,
    single_file: bool,
}

impl Enumeration {
    /// Files skipped by exclude patterns so far
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Whether the root was a single file
    pub fn is_single_file(&self) -> bool {
        self.single_file
    }

    /// Drain the enumeration, failing with [`ScanError::EmptySelection`] when nothing is left
    pub fn into_selection(mut self) -> Result<Selection, ScanError> {
        let targets: Vec<UploadTarget> = self.by_ref().collect();
        if targets.is_empty() {
            return Err(ScanError::EmptySelection {
                excluded: self.excluded,
            });
        }
        Ok(Selection {
            targets,
            excluded: self.excluded,
        })
    }

    fn next_candidate(&mut self) -> Option<PathBuf> {
        match &mut self.source {
            Source::Single(slot) => slot.take(),
            Source::Walk(walker) => loop {
                match walker.next()? {
                    Ok(entry) => {
                        let is_file = entry.file_type().is_file()
                            || (entry.path_is_symlink() && entry.path().is_file());
                        if is_file {
                            return Some(entry.into_path());
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Skipping unreadable entry");
                    }
                }
            },
        }
    }

    fn display_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.base)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

impl Iterator for Enumeration {
    type Item = UploadTarget;

    fn next(&mut self) -> Option<UploadTarget> {
        loop {
            let path = self.next_candidate()?;
            if self.filter.is_excluded_path(&path) {
                debug!(path = %path.display(), "Excluded by pattern");
                self.excluded += 1;
                continue;
            }
            let display_name = self.display_name(&path);
            return Some(UploadTarget::new(path, display_name));
        }
    }
}

/// Fully drained, non-empty enumeration
#[derive(Debug, Clone)]
pub struct Selection {
    /// Targets in enumeration order
    pub targets: Vec<UploadTarget>,
    /// Files dropped by exclude patterns
    pub excluded: usize,
}
