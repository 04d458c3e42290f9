//! Top-level index engine: one-shot folder indexing and watch-mode sync.

use std::path::{Path, PathBuf};
use std::time::Instant;

use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;

use crate::document::{
    build_document, document_id, BuildError, BuildOptions, ComputedField, DocumentRecord,
    PathToUrlResolver,
};
use crate::scan::{FolderScanner, ScanError};
use crate::schema::{validate_record, BatchValidationError, FileValidation, SchemaRegistry};
use crate::source::MarkdownSource;
use crate::store::{FileQuery, FileStore, StoreError};
use crate::watch::{FileEvent, FolderWatcher};

#[derive(Debug, Error)]
pub enum IndexFolderError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to process {path}: {source}")]
    Build {
        path: String,
        #[source]
        source: BuildError,
    },

    #[error(transparent)]
    Validation(#[from] BatchValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Options for an indexing run.
#[derive(Default)]
pub struct IndexOptions {
    /// Glob patterns matched against relative paths; matches are skipped.
    pub ignore_patterns: Vec<String>,
    /// Per-filetype metadata schemas. Empty registry validates everything.
    pub schemas: SchemaRegistry,
    /// Caller hooks run on each record before tasks are attached.
    pub computed_fields: Vec<ComputedField>,
    /// Maps relative paths to site URLs. Identity when unset.
    pub path_to_url: Option<PathToUrlResolver>,
}

/// Outcome of one indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub files_found: usize,
    pub files_indexed: usize,
    pub files_deleted: usize,
    pub duration_ms: u128,
}

/// The markdown index: a folder of documents projected into SQLite.
pub struct MarkdownDb {
    store: FileStore,
}

impl MarkdownDb {
    /// Open or create the index database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        Ok(Self { store: FileStore::open(db_path)? })
    }

    /// In-memory index, used by tests and ad-hoc tooling.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self { store: FileStore::open_in_memory()? })
    }

    /// Index `root` from scratch against the current database state.
    ///
    /// The run is all-or-nothing: every file is read, built, and validated
    /// before a single row changes. Stale rows (files gone from disk) are
    /// deleted in the same transaction as the upserts, so readers never see
    /// a half-applied scan.
    pub fn index_folder(
        &mut self,
        root: &Path,
        options: &IndexOptions,
    ) -> Result<IndexStats, IndexFolderError> {
        let started = Instant::now();

        let scanner = FolderScanner::new(root, &options.ignore_patterns)?;
        let files = scanner.walk()?;

        let permalinks: Vec<String> =
            files.iter().map(|f| f.relative_path.clone()).collect();

        let mut records = Vec::with_capacity(files.len());
        for file in &files {
            let bytes = std::fs::read(&file.absolute_path).map_err(|e| {
                IndexFolderError::Io { path: file.relative_path.clone(), source: e }
            })?;
            let build = BuildOptions {
                file_path: Some(&file.absolute_path),
                root_folder: Some(scanner.root()),
                path_to_url: options.path_to_url.as_ref(),
                permalinks: &permalinks,
                computed_fields: &options.computed_fields,
            };
            let record =
                build_document(MarkdownSource::Bytes(bytes), &build).map_err(|e| {
                    IndexFolderError::Build { path: file.relative_path.clone(), source: e }
                })?;
            records.push(record);
        }

        let failures: Vec<FileValidation> = records
            .iter()
            .map(|r| FileValidation {
                path: r.file_path.clone(),
                result: validate_record(&options.schemas, r),
            })
            .filter(|v| !v.result.valid)
            .collect();
        if !failures.is_empty() {
            return Err(BatchValidationError { failures }.into());
        }

        let stale = self.stale_ids(scanner.root(), &permalinks)?;

        self.store.apply_batch(&stale, &records)?;

        let stats = IndexStats {
            files_found: files.len(),
            files_indexed: records.len(),
            files_deleted: stale.len(),
            duration_ms: started.elapsed().as_millis(),
        };
        tracing::info!(
            "indexed {} files, removed {} stale rows in {}ms",
            stats.files_indexed,
            stats.files_deleted,
            stats.duration_ms
        );
        Ok(stats)
    }

    /// Ids of stored rows under `root` whose file no longer exists on disk.
    fn stale_ids(
        &self,
        root: &Path,
        current_relative: &[String],
    ) -> Result<Vec<String>, StoreError> {
        let stored = self.store.list_file_paths(Some(root))?;
        let root_str = root.to_string_lossy();
        let mut stale = Vec::new();
        for path in stored {
            let relative = path
                .strip_prefix(root_str.as_ref())
                .map(|p| p.trim_start_matches('/'))
                .unwrap_or(&path);
            if !current_relative.iter().any(|r| r == relative) {
                stale.push(document_id(Some(relative), ""));
            }
        }
        Ok(stale)
    }

    pub fn query_files(&self, query: &FileQuery) -> Result<Vec<DocumentRecord>, StoreError> {
        self.store.query_files(query)
    }

    pub fn get_file(&self, id: &str) -> Result<Option<DocumentRecord>, StoreError> {
        self.store.get_file(id)
    }

    pub fn count_files(&self) -> Result<i64, StoreError> {
        self.store.count_files()
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }
}

/// Incremental sync driven by filesystem events.
///
/// One session serves one watched root. Events are applied one at a time;
/// a file that fails validation is logged and skipped, leaving its previous
/// rows untouched, so watch mode degrades per file rather than aborting.
pub struct WatchSession<'a> {
    db: &'a mut MarkdownDb,
    root: PathBuf,
    options: &'a IndexOptions,
    ignore: GlobSet,
    permalinks: Vec<String>,
}

impl<'a> WatchSession<'a> {
    pub fn new(
        db: &'a mut MarkdownDb,
        root: &Path,
        options: &'a IndexOptions,
    ) -> Result<Self, IndexFolderError> {
        let scanner = FolderScanner::new(root, &options.ignore_patterns)?;
        let permalinks = scanner
            .walk()?
            .into_iter()
            .map(|f| f.relative_path)
            .collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &options.ignore_patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| ScanError::BadPattern(pattern.clone(), e))?;
            builder.add(glob);
        }
        let ignore = builder
            .build()
            .map_err(|e| ScanError::BadPattern("<set>".into(), e))?;

        Ok(Self { db, root: scanner.root().to_path_buf(), options, ignore, permalinks })
    }

    /// Consume events until the watcher's channel closes.
    pub fn run(&mut self, watcher: &FolderWatcher) {
        for event in watcher.events().iter() {
            if let Err(e) = self.handle(event) {
                tracing::error!("sync failed: {e}");
            }
        }
    }

    /// Apply one filesystem event to the index.
    pub fn handle(&mut self, event: FileEvent) -> Result<(), IndexFolderError> {
        match event {
            FileEvent::Created(path) | FileEvent::Modified(path) => self.sync_file(&path),
            FileEvent::Deleted(path) => self.remove_file(&path),
            FileEvent::Renamed(from, to) => {
                self.remove_file(&from)?;
                self.sync_file(&to)
            }
        }
    }

    fn sync_file(&mut self, path: &Path) -> Result<(), IndexFolderError> {
        let relative = match self.relative_of(path) {
            Some(r) => r,
            None => return Ok(()),
        };
        // Directory creation also produces events; only files are indexed.
        if !path.is_file() {
            return Ok(());
        }

        if !self.permalinks.iter().any(|p| p == &relative) {
            self.permalinks.push(relative.clone());
        }

        let bytes = std::fs::read(path)
            .map_err(|e| IndexFolderError::Io { path: relative.clone(), source: e })?;
        let build = BuildOptions {
            file_path: Some(path),
            root_folder: Some(&self.root),
            path_to_url: self.options.path_to_url.as_ref(),
            permalinks: &self.permalinks,
            computed_fields: &self.options.computed_fields,
        };
        let record = build_document(MarkdownSource::Bytes(bytes), &build)
            .map_err(|e| IndexFolderError::Build { path: relative.clone(), source: e })?;

        let result = validate_record(&self.options.schemas, &record);
        if !result.valid {
            tracing::warn!(
                "skipping {relative}: {} validation error(s), keeping previous state",
                result.errors.len()
            );
            return Ok(());
        }

        self.db.store.upsert_file(&record)?;
        tracing::debug!("synced {relative}");
        Ok(())
    }

    fn remove_file(&mut self, path: &Path) -> Result<(), IndexFolderError> {
        let relative = match self.relative_of(path) {
            Some(r) => r,
            None => return Ok(()),
        };
        self.permalinks.retain(|p| p != &relative);
        if self.db.store.delete_file(&document_id(Some(&relative), ""))? {
            tracing::debug!("removed {relative}");
        }
        Ok(())
    }

    /// Relative path for an event target, or `None` when the path falls
    /// outside the root or matches an ignore pattern.
    fn relative_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut out = relative.to_string_lossy().into_owned();
        if std::path::MAIN_SEPARATOR != '/' {
            out = out.replace(std::path::MAIN_SEPARATOR, "/");
        }
        if self.ignore.is_match(&out) {
            return None;
        }
        Some(out)
    }
}
