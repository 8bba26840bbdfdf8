#![forbid(unsafe_code)]

//! Root parser metadata loaded from built-in defaults and TOML files
//!
//! A program starts from its own [`ParserConfig`] and may overlay a TOML file
//! on top of it. Keys missing from the file keep their current values:
//!
//! ```toml
//! program = "admin"
//! description = "This is the Admin Service Tool."
//! epilog = "Epidingsbums"
//! add_help = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming an overlay file for the binary
pub const CONFIG_ENV_VAR: &str = "ARGDISPATCH_CONFIG";

/// Errors that can occur when loading a configuration overlay
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or contains unknown keys
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Metadata applied to the root parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Program name shown in usage lines
    pub program: String,
    /// Text shown above the argument list
    pub description: Option<String>,
    /// Text shown below the argument list
    pub epilog: Option<String>,
    /// Whether `-h/--help` flags are generated
    pub add_help: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            program: env!("CARGO_PKG_NAME").to_string(),
            description: None,
            epilog: None,
            add_help: true,
        }
    }
}

/// On-disk form; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParserConfigFile {
    program: Option<String>,
    description: Option<String>,
    epilog: Option<String>,
    add_help: Option<bool>,
}

impl ParserConfig {
    /// Applies the keys present in `content` on top of `self`
    pub fn overlay_str(self, content: &str) -> Result<Self, toml::de::Error> {
        let file: ParserConfigFile = toml::from_str(content)?;
        Ok(ParserConfig {
            program: file.program.unwrap_or(self.program),
            description: file.description.or(self.description),
            epilog: file.epilog.or(self.epilog),
            add_help: file.add_help.unwrap_or(self.add_help),
        })
    }

    /// Reads `path` and overlays it on top of `self`
    pub fn overlay_file(self, path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config overlay");
        self.overlay_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlays the file named by [`CONFIG_ENV_VAR`], if the variable is set
    pub fn overlay_env(self) -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => self.overlay_file(Path::new(&path)),
            _ => Ok(self),
        }
    }
}
