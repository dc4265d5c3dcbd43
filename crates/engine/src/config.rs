//! Store configuration via `stowage.toml`
//!
//! Everything a store needs at open time: the default record encoding and
//! the storage open options. A missing key takes its default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stowage_core::{Encoding, Error, Result};
use stowage_storage::{OpenOptions, DEFAULT_FILE_MODE};

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "stowage.toml";

/// Store configuration loaded from `stowage.toml`
///
/// # Example
///
/// ```toml
/// encoding = "msgpack"
/// timeout_ms = 1000
/// no_sync = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Default encoding: `"bincode"`, `"json"`, `"json-pretty"`, `"msgpack"`
    /// or `"xml"`
    pub encoding: String,
    /// Permission bits for created files (decimal in TOML, 384 = 0o600)
    pub file_mode: u32,
    /// Lock wait timeout in milliseconds; absent waits forever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Open without write access
    pub read_only: bool,
    /// Commit without fsync
    pub no_sync: bool,
    /// Page cache size in bytes; absent keeps the engine default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_size: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::default().name().to_string(),
            file_mode: DEFAULT_FILE_MODE,
            timeout_ms: None,
            read_only: false,
            no_sync: false,
            cache_size: None,
        }
    }
}

impl StoreConfig {
    /// Parse the encoding name
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an unknown name.
    pub fn encoding(&self) -> Result<Encoding> {
        Encoding::from_name(&self.encoding).map_err(|e| {
            Error::Config(format!(
                "Invalid encoding '{}' in {}: {}",
                self.encoding, CONFIG_FILE_NAME, e
            ))
        })
    }

    /// Storage open options described by this config
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            file_mode: self.file_mode,
            timeout: self.timeout_ms.map(Duration::from_millis),
            read_only: self.read_only,
            no_sync: self.no_sync,
            cache_size: self.cache_size,
            ..OpenOptions::default()
        }
    }

    /// Check every value eagerly
    pub fn validate(&self) -> Result<()> {
        self.encoding()?;
        self.open_options()
            .validate()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Parse and validate config text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read, parsed or
    /// validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{} ({})", msg, path.display())),
            other => other,
        })
    }

    /// Default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# Stowage store configuration
#
# Default record encoding: "bincode" (default), "json", "json-pretty",
# "msgpack", "xml"
encoding = "bincode"

# Permission bits for created files (decimal; 384 = 0o600)
file_mode = 384

# How long to wait for the file lock and the writer lock, in milliseconds.
# Leave unset to wait forever.
# timeout_ms = 1000

# Refuse write transactions
read_only = false

# Commit without fsync. A crash may lose the latest commits, never tear one.
no_sync = false

# Page cache size in bytes. Leave unset for the engine default.
# cache_size = 67108864
"#
    }

    /// Write the default config file if it does not already exist
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
