//! Filesystem change notifications.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// A normalized filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
    Renamed(PathBuf, PathBuf),
}

impl FileEvent {
    /// Primary path the event concerns. For renames, the destination.
    pub fn path(&self) -> &Path {
        match self {
            FileEvent::Created(p) => p,
            FileEvent::Modified(p) => p,
            FileEvent::Deleted(p) => p,
            FileEvent::Renamed(_, p) => p,
        }
    }
}

/// Wraps a notify watcher and delivers [`FileEvent`]s over a channel.
///
/// The watcher callback runs on notify's thread; events cross into the
/// consumer through a std mpsc channel so the index sees a serialized
/// stream.
pub struct FolderWatcher {
    rx: mpsc::Receiver<FileEvent>,
    watcher: RecommendedWatcher,
}

impl FolderWatcher {
    pub fn new() -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = RecommendedWatcher::new(
            move |result: notify::Result<notify::Event>| match result {
                Ok(event) => {
                    if let Some(file_event) = convert_event(&event) {
                        let _ = tx.send(file_event);
                    }
                }
                Err(e) => {
                    tracing::error!("watch error: {e}");
                }
            },
            notify::Config::default(),
        )?;
        Ok(Self { rx, watcher })
    }

    /// Start watching a folder recursively.
    pub fn watch(&mut self, path: &Path) -> notify::Result<()> {
        self.watcher.watch(path, RecursiveMode::Recursive)?;
        tracing::info!("watching {}", path.display());
        Ok(())
    }

    pub fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        self.watcher.unwatch(path)?;
        tracing::info!("stopped watching {}", path.display());
        Ok(())
    }

    /// Receiver for the serialized event stream. Blocks on `iter()` until
    /// the watcher is dropped.
    pub fn events(&self) -> &mpsc::Receiver<FileEvent> {
        &self.rx
    }
}

/// Map a raw notify event to the subset the index reacts to.
fn convert_event(event: &notify::Event) -> Option<FileEvent> {
    let first = event.paths.first()?;
    match event.kind {
        EventKind::Create(_) => Some(FileEvent::Created(first.clone())),
        EventKind::Remove(_) => Some(FileEvent::Deleted(first.clone())),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if event.paths.len() >= 2 {
                Some(FileEvent::Renamed(event.paths[0].clone(), event.paths[1].clone()))
            } else {
                None
            }
        }
        // Platforms that split a rename into two events deliver From and To
        // separately; treat them as delete and create.
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            Some(FileEvent::Deleted(first.clone()))
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            Some(FileEvent::Created(first.clone()))
        }
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
            Some(FileEvent::Modified(first.clone()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn watcher_starts_and_stops() {
        let dir = TempDir::new().unwrap();
        let mut watcher = FolderWatcher::new().unwrap();
        watcher.watch(dir.path()).unwrap();
        assert!(watcher.events().try_recv().is_err());
        watcher.unwatch(dir.path()).unwrap();
    }

    #[test]
    fn convert_create() {
        let event = notify::Event {
            kind: EventKind::Create(notify::event::CreateKind::File),
            paths: vec![PathBuf::from("notes/a.md")],
            ..Default::default()
        };
        assert_eq!(
            convert_event(&event),
            Some(FileEvent::Created(PathBuf::from("notes/a.md")))
        );
    }

    #[test]
    fn convert_data_modify() {
        let event = notify::Event {
            kind: EventKind::Modify(ModifyKind::Data(notify::event::DataChange::Content)),
            paths: vec![PathBuf::from("notes/a.md")],
            ..Default::default()
        };
        assert_eq!(
            convert_event(&event),
            Some(FileEvent::Modified(PathBuf::from("notes/a.md")))
        );
    }

    #[test]
    fn convert_rename_both() {
        let event = notify::Event {
            kind: EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            paths: vec![PathBuf::from("old.md"), PathBuf::from("new.md")],
            ..Default::default()
        };
        assert_eq!(
            convert_event(&event),
            Some(FileEvent::Renamed(PathBuf::from("old.md"), PathBuf::from("new.md")))
        );
    }

    #[test]
    fn convert_ignores_metadata_changes() {
        let event = notify::Event {
            kind: EventKind::Modify(ModifyKind::Metadata(
                notify::event::MetadataKind::Permissions,
            )),
            paths: vec![PathBuf::from("a.md")],
            ..Default::default()
        };
        assert!(convert_event(&event).is_none());
    }
}
