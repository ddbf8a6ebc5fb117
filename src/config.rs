//! Configuration module for odpack
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Project config (`odpack.toml`)
//! 3. Built-in defaults (lowest priority)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OdpackError, OdpackResult};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "odpack.toml";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub package: PackageConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub assets: AssetsConfig,
}

/// Output document configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageConfig {
    /// Template document the build rewrites
    #[serde(default = "default_template")]
    pub template: PathBuf,

    /// Output document path
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Zip-internal prefix for injected scripts
    #[serde(default = "default_script_prefix")]
    pub script_prefix: String,

    /// Manifest media type for injected scripts
    #[serde(default)]
    pub script_media_type: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            output: default_output(),
            script_prefix: default_script_prefix(),
            script_media_type: String::new(),
        }
    }
}

/// Script source tree configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptsConfig {
    #[serde(default = "default_scripts_dir")]
    pub dir: PathBuf,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            dir: default_scripts_dir(),
        }
    }
}

/// Asset tree configuration; assets are optional
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetsConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Zip-internal prefix for injected assets
    #[serde(default = "default_assets_dest")]
    pub dest: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: None,
            dest: default_assets_dest(),
        }
    }
}

fn default_template() -> PathBuf {
    PathBuf::from("template.odt")
}

fn default_output() -> PathBuf {
    PathBuf::from("out.odt")
}

fn default_script_prefix() -> String {
    crate::callbacks::SCRIPT_PATH_PREFIX.to_string()
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}

fn default_assets_dest() -> String {
    "assets/".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> OdpackResult<Config> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| OdpackError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `odpack.toml` from a directory, falling back to defaults
    /// when the file does not exist.
    pub fn load_dir(dir: &Path) -> OdpackResult<Config> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Config::default())
        }
    }
}
