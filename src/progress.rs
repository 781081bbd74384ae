//! Per-user, per-line level progress
//!
//! The level index stored for (user, line) is the highest game unlocked on
//! that line. Writes are fire-and-forget: a failed write is logged and kept
//! for a later retry, and never rolls back local game state.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Backend that remembers unlocked levels
pub trait ProgressStore {
    /// Last unlocked level index (0 if none)
    fn level(&self, user: &str, line: &str) -> Result<u32>;

    /// Idempotent upsert of the level index
    fn set_level(&mut self, user: &str, line: &str, level: u32) -> Result<()>;
}

/// Whether the game at `level_idx` can be played with `progress` unlocked
pub fn is_unlocked(progress: u32, level_idx: usize) -> bool {
    level_idx <= progress as usize
}

/// In-memory progress, persisted to LocalStorage on the web and to an
/// optional JSON file natively
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalProgress {
    /// user -> line -> level
    pub entries: BTreeMap<String, BTreeMap<String, u32>>,
    #[serde(skip)]
    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    path: Option<PathBuf>,
}

impl LocalProgress {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "trolley_games_progress";

    pub fn new() -> Self {
        Self::default()
    }

    /// Lines with progress for a user
    pub fn lines(&self, user: &str) -> impl Iterator<Item = (&str, u32)> {
        self.entries
            .get(user)
            .into_iter()
            .flat_map(|lines| lines.iter().map(|(line, level)| (line.as_str(), *level)))
    }

    /// Load progress from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(progress) = serde_json::from_str::<LocalProgress>(&json) {
                    log::info!("Loaded progress for {} users", progress.entries.len());
                    return progress;
                }
            }
        }

        log::info!("No stored progress, starting fresh");
        Self::new()
    }

    /// Save progress to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<()> {
        let failed = |reason: String| EngineError::Storage {
            key: Self::STORAGE_KEY.to_string(),
            reason,
        };
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| failed("LocalStorage unavailable".into()))?;
        let json = serde_json::to_string(self)?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|err| failed(format!("{:?}", err)))?;
        log::info!("Progress saved");
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    /// Progress kept in a JSON file; a missing or unreadable file starts fresh
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut progress = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<LocalProgress>(&json) {
                Ok(progress) => {
                    log::info!("Loaded progress for {} users", progress.entries.len());
                    progress
                }
                Err(err) => {
                    log::warn!("Ignoring unreadable progress in {}: {}", path.display(), err);
                    Self::new()
                }
            },
            Err(_) => {
                log::info!("No stored progress in {}, starting fresh", path.display());
                Self::new()
            }
        };
        progress.path = Some(path);
        progress
    }

    /// Write to the file given to `open`; in-memory progress has nothing to do
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|err| EngineError::Storage {
            key: path.display().to_string(),
            reason: err.to_string(),
        })?;
        log::debug!("Progress saved to {}", path.display());
        Ok(())
    }
}

impl ProgressStore for LocalProgress {
    fn level(&self, user: &str, line: &str) -> Result<u32> {
        Ok(self
            .entries
            .get(user)
            .and_then(|lines| lines.get(line))
            .copied()
            .unwrap_or(0))
    }

    fn set_level(&mut self, user: &str, line: &str, level: u32) -> Result<()> {
        self.entries
            .entry(user.to_string())
            .or_default()
            .insert(line.to_string(), level);
        self.save().map_err(|err| EngineError::ProgressWriteFailed {
            user: user.to_string(),
            line: line.to_string(),
            reason: err.to_string(),
        })
    }
}

/// A write that failed and waits for a retry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub user: String,
    pub line: String,
    pub level: u32,
}

/// Sends progress to a store without ever blocking play
#[derive(Debug)]
pub struct ProgressReporter<S> {
    store: S,
    pending: Vec<PendingWrite>,
}

impl<S: ProgressStore> ProgressReporter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            pending: Vec::new(),
        }
    }

    /// Try to store `level`; returns false if the write was queued for retry
    pub fn report(&mut self, user: &str, line: &str, level: u32) -> bool {
        match self.store.set_level(user, line, level) {
            Ok(()) => {
                self.pending.retain(|p| !(p.user == user && p.line == line));
                log::info!("progress for '{}' on '{}' set to {}", user, line, level);
                true
            }
            Err(err) => {
                log::warn!("progress write failed, will retry: {}", err);
                self.queue(PendingWrite {
                    user: user.to_string(),
                    line: line.to_string(),
                    level,
                });
                false
            }
        }
    }

    /// Keep one pending write per (user, line), the highest level wins
    fn queue(&mut self, write: PendingWrite) {
        match self
            .pending
            .iter_mut()
            .find(|p| p.user == write.user && p.line == write.line)
        {
            Some(existing) => existing.level = existing.level.max(write.level),
            None => self.pending.push(write),
        }
    }

    /// Retry queued writes; returns how many are still pending
    pub fn retry_pending(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        for write in pending {
            if let Err(err) = self.store.set_level(&write.user, &write.line, write.level) {
                log::warn!("progress retry failed: {}", err);
                self.queue(write);
            }
        }
        self.pending.len()
    }

    /// Read a level, treating a failed read as no progress
    pub fn level(&self, user: &str, line: &str) -> u32 {
        let queued = self
            .pending
            .iter()
            .find(|p| p.user == user && p.line == line)
            .map(|p| p.level);
        let stored = self.store.level(user, line).unwrap_or_else(|err| {
            log::warn!("progress read failed for '{}': {}", line, err);
            0
        });
        stored.max(queued.unwrap_or(0))
    }

    pub fn pending(&self) -> &[PendingWrite] {
        &self.pending
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store that rejects writes while `offline` is set
    #[derive(Default)]
    struct Flaky {
        inner: LocalProgress,
        offline: bool,
    }

    impl ProgressStore for Flaky {
        fn level(&self, user: &str, line: &str) -> Result<u32> {
            self.inner.level(user, line)
        }

        fn set_level(&mut self, user: &str, line: &str, level: u32) -> Result<()> {
            if self.offline {
                return Err(EngineError::ProgressWriteFailed {
                    user: user.into(),
                    line: line.into(),
                    reason: "offline".into(),
                });
            }
            self.inner.set_level(user, line, level)
        }
    }

    #[test]
    fn test_unlock_rules() {
        assert!(is_unlocked(0, 0));
        assert!(!is_unlocked(0, 1));
        assert!(is_unlocked(2, 2));
        assert!(!is_unlocked(2, 3));
    }

    #[test]
    fn test_local_progress() {
        let mut progress = LocalProgress::new();
        assert_eq!(progress.level("ana", "Orange Line East").unwrap(), 0);
        progress.set_level("ana", "Orange Line East", 2).unwrap();
        progress.set_level("ana", "Orange Line East", 2).unwrap();
        assert_eq!(progress.level("ana", "Orange Line East").unwrap(), 2);
        assert_eq!(progress.level("bo", "Orange Line East").unwrap(), 0);
        assert_eq!(progress.lines("ana").collect::<Vec<_>>(), vec![("Orange Line East", 2)]);
    }

    #[test]
    fn test_failed_write_is_queued_not_fatal() {
        let mut reporter = ProgressReporter::new(Flaky {
            offline: true,
            ..Default::default()
        });
        assert!(!reporter.report("ana", "Green Line East", 1));
        assert!(!reporter.report("ana", "Green Line East", 2));
        assert_eq!(reporter.pending().len(), 1);
        assert_eq!(reporter.pending()[0].level, 2);
        assert_eq!(reporter.level("ana", "Green Line East"), 2);

        assert_eq!(reporter.retry_pending(), 1);

        reporter.store_mut().offline = false;
        assert_eq!(reporter.retry_pending(), 0);
        assert_eq!(reporter.store().inner.level("ana", "Green Line East").unwrap(), 2);
    }

    #[test]
    fn test_successful_write_clears_pending() {
        let mut reporter = ProgressReporter::new(Flaky {
            offline: true,
            ..Default::default()
        });
        reporter.report("ana", "Green Line West", 1);
        reporter.store_mut().offline = false;
        assert!(reporter.report("ana", "Green Line West", 3));
        assert!(reporter.pending().is_empty());
        assert_eq!(reporter.level("ana", "Green Line West"), 3);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_unwritable_file_fails_the_write() {
        let path = std::env::temp_dir()
            .join(format!("trolley-games-missing-{}", std::process::id()))
            .join("progress.json");
        let mut progress = LocalProgress::open(&path);
        let err = progress.set_level("ana", "Green Line East", 1).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ProgressWriteFailed { ref user, ref line, .. }
                if user == "ana" && line == "Green Line East"
        ));

        let mut reporter = ProgressReporter::new(LocalProgress::open(&path));
        assert!(!reporter.report("ana", "Green Line East", 1));
        assert_eq!(reporter.pending().len(), 1);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_progress_file_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "trolley-games-progress-{}.json",
            std::process::id()
        ));
        let mut progress = LocalProgress::open(&path);
        progress.set_level("ana", "Orange Line East", 3).unwrap();

        let reopened = LocalProgress::open(&path);
        assert_eq!(reopened.level("ana", "Orange Line East").unwrap(), 3);
        let _ = std::fs::remove_file(&path);
    }
}
