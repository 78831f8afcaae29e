//! Registry of monitored channels, persisted as a JSON file.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use ts_domain::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Channel
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A monitored channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "d_enabled")]
    pub enabled: bool,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

fn d_enabled() -> bool {
    true
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Registry for the channels the crawler should follow.
pub struct ChannelRegistry {
    path: PathBuf,
    channels: RwLock<BTreeMap<i64, Channel>>,
}

impl ChannelRegistry {
    /// Load the registry from `path`, tolerating a missing or corrupt
    /// file (either starts empty).
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let channels = Self::read(&path);
        Self {
            path,
            channels: RwLock::new(channels),
        }
    }

    fn read(path: &Path) -> BTreeMap<i64, Channel> {
        if !path.exists() {
            return BTreeMap::new();
        }

        let parsed: std::result::Result<Vec<Channel>, _> = std::fs::read_to_string(path)
            .map_err(Error::Io)
            .and_then(|raw| serde_json::from_str(&raw).map_err(Error::Json));

        match parsed {
            Ok(list) => list.into_iter().map(|c| (c.channel_id, c)).collect(),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "channel registry load failed");
                BTreeMap::new()
            }
        }
    }

    fn save(&self, channels: &BTreeMap<i64, Channel>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(Error::Io)?;
            }
        }

        let list: Vec<&Channel> = channels.values().collect();
        let json = serde_json::to_string_pretty(&list)?;

        let mut tmp_os: OsString = self.path.as_os_str().to_owned();
        tmp_os.push(".tmp");
        let tmp = PathBuf::from(tmp_os);
        std::fs::write(&tmp, json).map_err(Error::Io)?;
        std::fs::rename(&tmp, &self.path).map_err(Error::Io)?;
        Ok(())
    }

    /// Add a channel, or update the username/title of an existing one
    /// (its `enabled` flag and `added_at` are preserved).
    pub fn add_channel(&self, channel_id: i64, username: &str, title: &str) -> Result<Channel> {
        if channel_id <= 0 {
            return Err(Error::Config("channel_id must be a positive integer".into()));
        }

        let mut channels = self.channels.write();
        let channel = channels
            .entry(channel_id)
            .and_modify(|existing| {
                existing.username = username.to_owned();
                existing.title = title.to_owned();
            })
            .or_insert_with(|| Channel {
                channel_id,
                username: username.to_owned(),
                title: title.to_owned(),
                enabled: true,
                added_at: Utc::now(),
            })
            .clone();

        self.save(&channels)?;
        Ok(channel)
    }

    /// Remove a channel. Returns whether it existed.
    pub fn remove_channel(&self, channel_id: i64) -> Result<bool> {
        if channel_id <= 0 {
            return Err(Error::Config("channel_id must be a positive integer".into()));
        }

        let mut channels = self.channels.write();
        let removed = channels.remove(&channel_id).is_some();
        if removed {
            self.save(&channels)?;
        }
        Ok(removed)
    }

    /// All registered channels, ordered by id.
    pub fn list_channels(&self) -> Vec<Channel> {
        self.channels.read().values().cloned().collect()
    }

    pub fn get_channel(&self, channel_id: i64) -> Option<Channel> {
        self.channels.read().get(&channel_id).cloned()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_at(dir: &tempfile::TempDir) -> ChannelRegistry {
        ChannelRegistry::load(dir.path().join("channels.json"))
    }

    #[test]
    fn add_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_at(&dir);

        registry.add_channel(100, "news", "News Channel").unwrap();
        registry.add_channel(200, "tech", "Tech Channel").unwrap();

        let channels = registry.list_channels();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].channel_id, 100);
        assert!(channels[0].enabled);
    }

    #[test]
    fn re_add_updates_but_preserves_flags() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_at(&dir);

        let first = registry.add_channel(100, "news", "News").unwrap();
        let updated = registry.add_channel(100, "news_v2", "News v2").unwrap();

        assert_eq!(updated.username, "news_v2");
        assert_eq!(updated.added_at, first.added_at);
        assert_eq!(registry.list_channels().len(), 1);
    }

    #[test]
    fn non_positive_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_at(&dir);
        assert!(registry.add_channel(0, "x", "x").is_err());
        assert!(registry.add_channel(-5, "x", "x").is_err());
        assert!(registry.remove_channel(0).is_err());
    }

    #[test]
    fn remove_reports_existence() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_at(&dir);
        registry.add_channel(100, "news", "News").unwrap();

        assert!(registry.remove_channel(100).unwrap());
        assert!(!registry.remove_channel(100).unwrap());
        assert!(registry.list_channels().is_empty());
    }

    #[test]
    fn persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.json");
        {
            let registry = ChannelRegistry::load(&path);
            registry.add_channel(100, "news", "News").unwrap();
        }

        let registry = ChannelRegistry::load(&path);
        let channel = registry.get_channel(100).expect("channel survives reload");
        assert_eq!(channel.username, "news");
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.json");
        std::fs::write(&path, "[ not json").unwrap();

        let registry = ChannelRegistry::load(&path);
        assert!(registry.list_channels().is_empty());
    }
}
