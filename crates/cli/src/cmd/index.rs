//! Index command: one-shot folder indexing, optionally followed by watch
//! mode.

use std::path::Path;

use mddb_core::config::ConfigLoader;
use mddb_core::markdowndb::{IndexFolderError, IndexOptions, MarkdownDb, WatchSession};
use mddb_core::schema::SchemaRegistry;
use mddb_core::watch::FolderWatcher;

pub fn run(root: &Path, config: Option<&Path>, watch: bool) {
    let cf = match ConfigLoader::load(config) {
        Ok(cf) => cf,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    crate::logging::init(&cf.logging);

    let mut db = match MarkdownDb::open(&cf.index.db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error opening index database: {}", e);
            std::process::exit(1);
        }
    };

    let options = IndexOptions {
        ignore_patterns: cf.index.ignore_patterns.clone(),
        schemas: SchemaRegistry::from(cf.schemas),
        ..IndexOptions::default()
    };

    println!("Indexing folder: {}", root.display());

    match db.index_folder(root, &options) {
        Ok(stats) => {
            println!();
            println!("Indexing complete:");
            println!("  Files found:    {}", stats.files_found);
            println!("  Files indexed:  {}", stats.files_indexed);
            if stats.files_deleted > 0 {
                println!("  Stale removed:  {}", stats.files_deleted);
            }
            println!("  Duration:       {}ms", stats.duration_ms);
            println!();
            println!("Index stored at: {}", cf.index.db_path.display());
            tracing::info!(
                "index run finished: {} files in {}ms",
                stats.files_indexed,
                stats.duration_ms
            );
        }
        Err(IndexFolderError::Validation(e)) => {
            eprintln!("\n{}", e);
            for failure in &e.failures {
                eprintln!("  {}", failure.path);
                for error in &failure.result.errors {
                    eprintln!("    - {}", error);
                }
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("\nError during indexing: {}", e);
            std::process::exit(1);
        }
    }

    if watch {
        let mut watcher = match FolderWatcher::new() {
            Ok(w) => w,
            Err(e) => {
                eprintln!("Error starting watcher: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = watcher.watch(root) {
            eprintln!("Error watching {}: {}", root.display(), e);
            std::process::exit(1);
        }

        let mut session = match WatchSession::new(&mut db, root, &options) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error starting watch session: {}", e);
                std::process::exit(1);
            }
        };

        println!("Watching {} (Ctrl-C to stop)", root.display());
        session.run(&watcher);
    }
}
