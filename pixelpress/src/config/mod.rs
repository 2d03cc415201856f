//! Application configuration.
//!
//! Configuration is deliberately small: a bind address and an output
//! directory for produced archives. Both are read once at startup from the
//! environment (or CLI flags) and passed into component constructors as an
//! immutable value - there is no ambient global configuration.

use std::env;
use std::path::PathBuf;

/// Default bind address when `ADDR` is not set.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default archive output directory when `OUTPUT_PATH` is not set.
pub const DEFAULT_OUTPUT_DIR: &str = "archives";

/// Top-level application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the HTTP server binds to, e.g. `127.0.0.1:8080`.
    pub addr: String,

    /// Directory where produced zip archives are written and served from.
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// Reads `ADDR` and `OUTPUT_PATH`, falling back to the documented
    /// defaults for any variable that is unset or empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = env::var("ADDR") {
            if !addr.is_empty() {
                config.addr = addr;
            }
        }
        if let Some(dir) = env::var_os("OUTPUT_PATH") {
            if !dir.is_empty() {
                config.output_dir = PathBuf::from(dir);
            }
        }
        config
    }

    /// Set the bind address.
    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Set the archive output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}
