//! Nickname cache: a JSON file mapping account numbers to display names with
//! an expiry stamp. The CLI only reads and writes the file; nothing here
//! performs network lookups, and the core library does not depend on it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CACHE_DIR_NAME: &str = "ntemoji";
const CACHE_FILE_NAME: &str = "nickname_cache.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicknameEntry {
    pub name: String,
    /// Unix seconds after which the name is considered stale.
    pub username_expire_time: u64,
}

/// In-memory view of the cache file.
#[derive(Debug, Default)]
pub struct NicknameCache {
    entries: HashMap<String, NicknameEntry>,
}

impl NicknameCache {
    /// Load from `path`. A missing or unparsable file yields an empty cache.
    pub fn load(path: &Path) -> Self {
        let entries = fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self { entries }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, text)
            .with_context(|| format!("Failed to write nickname cache {}", path.display()))
    }

    /// Cached name for `account`, if present and not expired.
    pub fn fresh_name(&self, account: &str) -> Option<&str> {
        let entry = self.entries.get(account)?;
        if entry.username_expire_time > unix_now() {
            Some(entry.name.as_str())
        } else {
            None
        }
    }

    /// `昵称（账号）` when a fresh name is cached, the bare account otherwise.
    pub fn display_name(&self, account: &str) -> String {
        match self.fresh_name(account) {
            Some(name) => format!("{}（{}）", name, account),
            None => account.to_string(),
        }
    }
}

/// Default cache file location under the local app-data directory.
pub fn default_cache_path() -> Option<PathBuf> {
    let base = std::env::var_os("LOCALAPPDATA")
        .or_else(|| std::env::var_os("XDG_DATA_HOME"))
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))?;
    Some(base.join(CACHE_DIR_NAME).join(CACHE_FILE_NAME))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_and_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nickname_cache.json");

        let mut cache = NicknameCache::load(&path);
        assert!(cache.fresh_name("10001").is_none());

        cache.entries.insert(
            "10001".to_string(),
            NicknameEntry {
                name: "纳西妲".to_string(),
                username_expire_time: unix_now() + 3600,
            },
        );
        cache.save(&path).unwrap();

        let reloaded = NicknameCache::load(&path);
        assert_eq!(reloaded.fresh_name("10001"), Some("纳西妲"));
        assert_eq!(reloaded.display_name("10001"), "纳西妲（10001）");
        assert_eq!(reloaded.display_name("10002"), "10002");
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let mut cache = NicknameCache::default();
        cache.entries.insert(
            "10001".to_string(),
            NicknameEntry {
                name: "old".to_string(),
                username_expire_time: 1, // long past
            },
        );
        assert!(cache.fresh_name("10001").is_none());
        assert_eq!(cache.display_name("10001"), "10001");
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nickname_cache.json");
        fs::write(&path, b"not json {{{").unwrap();
        let cache = NicknameCache::load(&path);
        assert!(cache.fresh_name("10001").is_none());
    }
}
