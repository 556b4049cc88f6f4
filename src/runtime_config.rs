//! # Runtime Configuration Module
//!
//! Environment variable based configuration for the request driver.
//!
//! ## Environment Variables
//!
//! ### `WALTER_CHUNK_SIZE`
//!
//! Size in bytes of the chunks a body is split into when a request is replayed
//! through the dispatcher. Accepts decimal (`16384`) or hexadecimal
//! (`0x4000`). Zero and unparsable values fall back to the default.
//!
//! Default: `0x4000` (16 KB)
//!
//! ## Usage
//!
//! ```rust
//! use walter::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! assert!(config.chunk_size > 0);
//! ```

use std::env;

/// Default chunk size: 16 KB
pub const DEFAULT_CHUNK_SIZE: usize = 0x4000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Body chunk size in bytes
    pub chunk_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_value(env::var("WALTER_CHUNK_SIZE").ok().as_deref())
    }

    fn from_value(chunk_size: Option<&str>) -> Self {
        let chunk_size = chunk_size
            .and_then(parse_size)
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        RuntimeConfig { chunk_size }
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal byte count
#[must_use]
pub fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}
