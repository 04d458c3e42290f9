//! Recursive folder scanner.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("folder does not exist: {0}")]
    MissingRoot(String),

    #[error("invalid ignore pattern {0}: {1}")]
    BadPattern(String, #[source] globset::Error),

    #[error("failed to walk folder {0}: {1}")]
    Walk(String, #[source] walkdir::Error),
}

/// A file discovered under the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Absolute path to the file.
    pub absolute_path: PathBuf,
    /// Path relative to the scan root, with forward slashes.
    pub relative_path: String,
}

/// Scanner that discovers every file under a root folder, minus ignores.
///
/// All regular files are reported, not only markdown. Non-markdown files
/// still get an index row so links to them can be resolved.
#[derive(Debug)]
pub struct FolderScanner {
    root: PathBuf,
    ignore: GlobSet,
}

impl FolderScanner {
    /// Create a scanner rooted at `root`, skipping anything whose relative
    /// path matches one of `ignore_patterns`.
    pub fn new(root: &Path, ignore_patterns: &[String]) -> Result<Self, ScanError> {
        let root = root
            .canonicalize()
            .map_err(|_| ScanError::MissingRoot(root.display().to_string()))?;

        let mut builder = GlobSetBuilder::new();
        for pattern in ignore_patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| ScanError::BadPattern(pattern.clone(), e))?;
            builder.add(glob);
        }
        let ignore = builder
            .build()
            .map_err(|e| ScanError::BadPattern("<set>".into(), e))?;

        Ok(Self { root, ignore })
    }

    /// Walk the root and return all non-ignored files, sorted by relative
    /// path.
    pub fn walk(&self) -> Result<Vec<ScannedFile>, ScanError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !self.is_ignored(e))
        {
            let entry =
                entry.map_err(|e| ScanError::Walk(self.root.display().to_string(), e))?;

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative_path = relative_string(path, &self.root);
            files.push(ScannedFile { absolute_path: path.to_path_buf(), relative_path });
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    fn is_ignored(&self, entry: &walkdir::DirEntry) -> bool {
        // Never filter the root directory itself.
        if entry.depth() == 0 {
            return false;
        }
        let relative = relative_string(entry.path(), &self.root);
        self.ignore.is_match(&relative)
    }

    /// The canonicalized scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn relative_string(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut out = relative.to_string_lossy().into_owned();
    if std::path::MAIN_SEPARATOR != '/' {
        out = out.replace(std::path::MAIN_SEPARATOR, "/");
    }
    out
}
