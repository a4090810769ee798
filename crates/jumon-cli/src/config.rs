//! User configuration, stored as RON.
//!
//! ```ron
//! (
//!     taxonomy: Some("/home/me/.config/jumon/terms.json"),
//!     lookup: output,
//!     show_tree: true,
//!     log_level: Some("jumon_tree=debug"),
//! )
//! ```
//!
//! Every field is optional; a missing default config file means defaults.

use std::path::{Path, PathBuf};

use jumon_taxonomy::Taxonomy;
use jumon_types::TermField;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory under the platform config dir.
pub const CONFIG_DIR: &str = "jumon";

/// File name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.ron";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumonConfig {
    /// External taxonomy JSON. `None` uses the embedded taxonomy.
    pub taxonomy: Option<PathBuf>,
    /// Which side of a term pair typed names are matched against first.
    pub lookup: TermField,
    /// Print the tree after every mutating session command.
    pub show_tree: bool,
    /// `EnvFilter` directive used when neither `--log-level` nor `RUST_LOG`
    /// is set.
    pub log_level: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

impl JumonConfig {
    /// `$XDG_CONFIG_HOME/jumon/config.ron` (or the platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&source)
    }

    /// Load an explicitly named config (which must exist), else the default
    /// path if present, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// The configured taxonomy, falling back to the embedded one.
    pub fn load_taxonomy(&self) -> jumon_taxonomy::Result<Taxonomy> {
        match &self.taxonomy {
            Some(path) => Taxonomy::load(path),
            None => Taxonomy::embedded(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
