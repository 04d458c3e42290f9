use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::types::ConfigFile;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at {0}")]
    NotFound(String),

    #[error("failed to read config file {0}: {1}")]
    ReadError(String, #[source] std::io::Error),

    #[error("failed to parse TOML in {0}: {1}")]
    ParseError(String, #[source] toml::de::Error),

    #[error("version {0} is unsupported (expected 1)")]
    BadVersion(u32),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration.
    ///
    /// An explicitly given path must exist. With no path, the default
    /// project-local file is used when present, otherwise built-in defaults
    /// apply.
    pub fn load(config_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
        let path = match config_path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.display().to_string()));
                }
                p.to_path_buf()
            }
            None => {
                let default = default_config_path();
                if !default.exists() {
                    return Ok(ConfigFile::default());
                }
                default
            }
        };

        let s = fs::read_to_string(&path)
            .map_err(|e| ConfigError::ReadError(path.display().to_string(), e))?;

        let cf: ConfigFile = toml::from_str(&s)
            .map_err(|e| ConfigError::ParseError(path.display().to_string(), e))?;

        if cf.version != 1 {
            return Err(ConfigError::BadVersion(cf.version));
        }

        Ok(cf)
    }
}

/// Project-local config file, looked up in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("mddb.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_explicit_path_errors() {
        let result = ConfigLoader::load(Some(Path::new("/no/such/mddb.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn parses_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
version = 1

[index]
db_path = "out/markdown.db"
ignore_patterns = ["drafts/**"]

[schemas.blog.title]
type = "string"
required = true

[logging]
level = "debug"
"#
        )
        .unwrap();

        let cf = ConfigLoader::load(Some(file.path())).unwrap();
        assert_eq!(cf.index.db_path, PathBuf::from("out/markdown.db"));
        assert_eq!(cf.index.ignore_patterns, vec!["drafts/**"]);
        assert!(cf.schemas.contains_key("blog"));
        assert_eq!(cf.logging.level, "debug");
    }

    #[test]
    fn rejects_unknown_version() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "version = 2").unwrap();
        let result = ConfigLoader::load(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::BadVersion(2))));
    }

    #[test]
    fn defaults_apply_when_sections_missing() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "version = 1").unwrap();
        let cf = ConfigLoader::load(Some(file.path())).unwrap();
        assert_eq!(cf.index.db_path, PathBuf::from("markdown.db"));
        assert!(cf.index.ignore_patterns.iter().any(|p| p == ".git"));
        assert!(cf.schemas.is_empty());
    }
}
