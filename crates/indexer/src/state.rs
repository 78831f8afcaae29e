//! Per-channel checkpoint state, persisted as a small JSON file.
//!
//! Checkpoints advance strictly monotonically; writes go to a sibling
//! temp file and are renamed over the target so a concurrent reader
//! never observes a half-written file.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use ts_domain::error::{Error, Result};
use ts_domain::trace::TraceEvent;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChannelState {
    last_msg_id: i64,
}

#[derive(Debug)]
struct Inner {
    state: HashMap<String, ChannelState>,
    dirty: bool,
    last_flush: Instant,
}

/// Persistent map of channel id to the highest message id known to be
/// durably indexed.
pub struct StateStore {
    path: PathBuf,
    flush_interval: Duration,
    inner: Mutex<Inner>,
}

impl StateStore {
    /// Load or create the store at `path`. `flush_interval` is the
    /// minimum number of seconds between disk writes; 0 persists on
    /// every advancing `set`.
    pub fn open(path: impl Into<PathBuf>, flush_interval: f64) -> Self {
        let path = path.into();
        let state = Self::load(&path);

        tracing::info!(
            channels = state.len(),
            path = %path.display(),
            "state store loaded"
        );

        Self {
            path,
            flush_interval: Duration::from_secs_f64(flush_interval.max(0.0)),
            inner: Mutex::new(Inner {
                state,
                dirty: false,
                last_flush: Instant::now(),
            }),
        }
    }

    fn load(path: &Path) -> HashMap<String, ChannelState> {
        if !path.exists() {
            return HashMap::new();
        }

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "state file unreadable, starting empty");
                return HashMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                // Preserve the corrupted file for inspection and start over.
                let corrupt = append_suffix(path, ".corrupt");
                tracing::warn!(
                    error = %e,
                    moved_to = %corrupt.display(),
                    "state file corrupt, starting empty"
                );
                if let Err(e) = std::fs::rename(path, &corrupt) {
                    tracing::warn!(error = %e, "could not move corrupt state file aside");
                }
                HashMap::new()
            }
        }
    }

    /// Last indexed message id for a channel, 0 when unknown.
    pub fn get(&self, channel_id: i64) -> i64 {
        self.inner
            .lock()
            .state
            .get(&channel_id.to_string())
            .map(|s| s.last_msg_id)
            .unwrap_or(0)
    }

    /// Advance the checkpoint for a channel. Backward writes are a
    /// no-op. Disk errors are logged and leave the store dirty so the
    /// next flush retries.
    pub fn set(&self, channel_id: i64, msg_id: i64) {
        let mut inner = self.inner.lock();
        let key = channel_id.to_string();
        let current = inner.state.get(&key).map(|s| s.last_msg_id).unwrap_or(0);
        if msg_id <= current {
            return;
        }

        inner.state.insert(key, ChannelState { last_msg_id: msg_id });
        inner.dirty = true;
        TraceEvent::CheckpointAdvanced {
            channel_id,
            last_msg_id: msg_id,
        }
        .emit();

        let due = self.flush_interval.is_zero()
            || inner.last_flush.elapsed() >= self.flush_interval;
        if due {
            if let Err(e) = self.save(&mut inner) {
                tracing::warn!(error = %e, "checkpoint write failed, will retry on flush");
            }
        }
    }

    /// Force a persist when there are unwritten changes.
    pub fn flush(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.dirty {
            self.save(&mut inner)?;
        }
        Ok(())
    }

    fn save(&self, inner: &mut Inner) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(Error::Io)?;
            }
        }

        let json = serde_json::to_string_pretty(&inner.state)?;
        let tmp = append_suffix(&self.path, ".tmp");
        std::fs::write(&tmp, json).map_err(Error::Io)?;
        std::fs::rename(&tmp, &self.path).map_err(Error::Io)?;

        inner.dirty = false;
        inner.last_flush = Instant::now();
        Ok(())
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
