//! Runtime settings read from the environment.
//!
//! The CLI loads a `.env` file (if present) before calling [`Settings::from_env`].

use std::path::PathBuf;

/// Directory where cached mapping configurations are stored (relative to current dir)
pub const DEFAULT_CACHE_DIR: &str = ".csv2ynab/configs";

/// Overrides the cache directory.
pub const CACHE_DIR_VAR: &str = "CSV2YNAB_CACHE_DIR";

/// Any non-empty value other than `0`/`false` disables the cache.
pub const NO_CACHE_VAR: &str = "CSV2YNAB_NO_CACHE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub cache_enabled: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let cache_dir = lookup(CACHE_DIR_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));

        let cache_enabled = match lookup(NO_CACHE_VAR) {
            Some(v) => matches!(v.trim().to_lowercase().as_str(), "" | "0" | "false"),
            None => true,
        };

        Self { cache_dir, cache_enabled }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_enabled: true,
        }
    }
}
