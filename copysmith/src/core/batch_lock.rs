use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCK_FILE: &str = "slogan_lock.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct LockFile {
    slogans: Vec<String>,
}

/// Openers already used by earlier files of a batch.
///
/// Owned by the caller and shared by every file of one batch. Persistence is best effort:
/// an unreadable file loads as empty and failed writes only log a warning.
#[derive(Debug, Default)]
pub struct BatchLock {
    path: Option<PathBuf>,
    used: BTreeSet<String>,
}

fn lock_key(slogan: &str) -> String {
    slogan.trim().to_lowercase()
}

impl BatchLock {
    /// A lock that never touches the disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let used = match read_lock_file(&path) {
            Ok(slogans) => slogans,
            Err(e) => {
                if path.exists() {
                    log::warn!("Ignoring unreadable slogan lock {}: {}", path.display(), e);
                }
                BTreeSet::new()
            }
        };
        log::debug!("Loaded {} locked openers from {}", used.len(), path.display());
        Self { path: Some(path), used }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contains(&self, slogan: &str) -> bool {
        self.used.contains(&lock_key(slogan))
    }

    pub fn add(&mut self, slogan: &str) {
        let key = lock_key(slogan);
        if !key.is_empty() {
            self.used.insert(key);
        }
    }

    pub fn clear(&mut self) {
        self.used.clear();
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = LockFile {
            slogans: self.used.iter().cloned().collect(),
        };
        fs::write(path, serde_json::to_string_pretty(&payload)?)?;
        Ok(())
    }

    /// Records a slogan and flushes immediately so a crash keeps what was consumed.
    pub fn record(&mut self, slogan: &str) {
        self.add(slogan);
        if let Err(e) = self.save() {
            log::warn!("Failed to persist slogan lock: {}", e);
        }
    }
}

fn read_lock_file(path: &Path) -> Result<BTreeSet<String>> {
    let raw = fs::read_to_string(path)?;
    let file: LockFile = serde_json::from_str(&raw)?;
    Ok(file.slogans.iter().map(|s| lock_key(s)).filter(|s| !s.is_empty()).collect())
}

/// Picks the next opener.
///
/// Without a lock, openers are dealt from a shuffled deck that is refilled when empty, so a
/// run repeats nothing until the pool is used up. With a lock, openers already locked are
/// skipped; once every opener is locked the lock is cleared and the scan starts over.
pub fn pick_slogan<R: Rng>(
    pool: &[String],
    deck: &mut Vec<String>,
    rng: &mut R,
    lock: Option<&mut BatchLock>,
) -> String {
    if pool.is_empty() {
        return String::new();
    }

    let Some(lock) = lock else {
        if deck.is_empty() {
            deck.extend(pool.iter().cloned());
            deck.shuffle(rng);
        }
        return deck.pop().unwrap_or_default();
    };

    let mut order: Vec<&String> = pool.iter().collect();
    order.shuffle(rng);
    let picked = match order.iter().find(|s| !lock.contains(s)) {
        Some(s) => (*s).clone(),
        None => {
            log::warn!("All {} openers are locked, starting the lock over", pool.len());
            lock.clear();
            order[0].clone()
        }
    };
    lock.record(&picked);
    picked.trim().to_string()
}
