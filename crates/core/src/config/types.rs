use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::schema::DocumentSchema;

#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub index: IndexConfig,
    /// Schemas keyed by filetype, e.g. `[schemas.blog]`.
    #[serde(default)]
    pub schemas: HashMap<String, DocumentSchema>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Where the SQLite database lives, relative to the working directory.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Glob patterns matched against relative paths; matches are skipped.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { db_path: default_db_path(), ignore_patterns: default_ignore_patterns() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_version() -> u32 {
    1
}

fn default_db_path() -> PathBuf {
    PathBuf::from("markdown.db")
}

fn default_ignore_patterns() -> Vec<String> {
    [
        ".git",
        ".git/**",
        ".obsidian",
        ".obsidian/**",
        "node_modules",
        "node_modules/**",
        ".DS_Store",
        "**/.DS_Store",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}
