//! Inspect command: build one file's record and print it as JSON.

use std::path::Path;

use mddb_core::document::{build_document, BuildOptions};
use mddb_core::source::MarkdownSource;

pub fn run(file: &Path) {
    let bytes = match std::fs::read(file) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            std::process::exit(1);
        }
    };

    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if extension != "md" && extension != "mdx" {
        eprintln!(
            "Warning: {} is not a markdown file; emitting a bare record",
            file.display()
        );
    }

    // Single-file mode treats the containing directory as the root, so the
    // record's id and url derive from the basename.
    let options = BuildOptions {
        file_path: Some(file),
        root_folder: file.parent(),
        ..BuildOptions::default()
    };
    let record = match build_document(MarkdownSource::Bytes(bytes), &options) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("Error processing {}: {}", file.display(), e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&record) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing record: {}", e);
            std::process::exit(1);
        }
    }
}
