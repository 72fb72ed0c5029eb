//! Config Registry - Remember mapping configurations per bank export layout
//!
//! A configuration is saved under a key derived from the file's header set,
//! so the next statement from the same bank opens with the user's last
//! mapping. Keys are compatible with configurations saved by earlier
//! versions of the converter: sort the headers, join them with `|`, and fold
//! the UTF-16 code units into a 32-bit rolling hash.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{MappingConfig, Settings};
use crate::error::{RegistryError, RegistryResult};

/// Prefix of every storage key.
pub const KEY_PREFIX: &str = "csv2ynab_config_";

/// Compute the storage key for a header set.
///
/// Header order does not matter. The hash is `h = h * 31 + unit` over
/// UTF-16 code units with 32-bit wrap-around, printed as a signed integer.
pub fn storage_key(headers: &[String]) -> String {
    let mut sorted: Vec<&str> = headers.iter().map(String::as_str).collect();
    // Code-unit order, as saved keys were computed
    sorted.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));
    let joined = sorted.join("|");

    let hash = joined
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
        });

    format!("{}{}", KEY_PREFIX, hash)
}

/// A stored configuration with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConfig {
    /// Storage key (see [`storage_key`])
    pub key: String,
    /// Headers this configuration was saved for
    pub headers: Vec<String>,
    /// The mapping configuration
    pub config: MappingConfig,
    /// Last save timestamp
    pub saved_at: String,
    /// Number of times saved
    #[serde(default)]
    pub save_count: u32,
}

/// Registry for cached mapping configurations
pub struct ConfigRegistry {
    /// Directory where configurations are stored
    registry_dir: PathBuf,
    /// Loaded configurations (key -> stored config)
    configs: HashMap<String, StoredConfig>,
}

impl ConfigRegistry {
    /// Create a registry in the directory named by the settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_dir(&settings.cache_dir)
    }

    /// Create a registry with a custom directory, loading existing entries
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let mut registry = Self {
            registry_dir: PathBuf::from(dir.as_ref()),
            configs: HashMap::new(),
        };
        registry.load_all();
        registry
    }

    pub fn dir(&self) -> &Path {
        &self.registry_dir
    }

    /// Load all configurations from the registry directory.
    /// Unreadable or malformed files are ignored.
    fn load_all(&mut self) {
        let entries = match fs::read_dir(&self.registry_dir) {
            Ok(e) => e,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(stored) = serde_json::from_str::<StoredConfig>(&content) {
                        self.configs.insert(stored.key.clone(), stored);
                    }
                }
            }
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.registry_dir.join(format!("{}.json", key))
    }

    /// All stored configurations, sorted by key
    pub fn list(&self) -> Vec<&StoredConfig> {
        let mut stored: Vec<_> = self.configs.values().collect();
        stored.sort_by(|a, b| a.key.cmp(&b.key));
        stored
    }

    /// Stored entry for a header set
    pub fn get(&self, headers: &[String]) -> Option<&StoredConfig> {
        self.configs.get(&storage_key(headers))
    }

    /// Configuration saved for a header set
    pub fn load(&self, headers: &[String]) -> Option<MappingConfig> {
        self.get(headers).map(|stored| stored.config.clone())
    }

    /// Save (or overwrite) the configuration for a header set
    pub fn save(&mut self, headers: &[String], config: &MappingConfig) -> RegistryResult<String> {
        fs::create_dir_all(&self.registry_dir)?;

        let key = storage_key(headers);
        let save_count = self.configs.get(&key).map_or(0, |s| s.save_count) + 1;
        let stored = StoredConfig {
            key: key.clone(),
            headers: headers.to_vec(),
            config: config.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
            save_count,
        };

        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(self.path_for(&key), content)?;

        self.configs.insert(key.clone(), stored);
        Ok(key)
    }

    /// Delete the configuration for a header set
    pub fn forget(&mut self, headers: &[String]) -> RegistryResult<()> {
        let key = storage_key(headers);
        if self.configs.remove(&key).is_none() {
            return Err(RegistryError::NotFound(key));
        }
        fs::remove_file(self.path_for(&key))?;
        Ok(())
    }
}
