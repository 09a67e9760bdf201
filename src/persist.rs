use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::StatsConfig;
use crate::event::EventRecord;
use crate::records::{LineupRecord, PassRecord, SubstitutionRecord};
use crate::store::{EventLog, Snapshot};

const CACHE_DIR: &str = "polo_stats";
const CACHE_FILE: &str = "session.json";
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    events: Vec<EventRecord>,
    #[serde(default)]
    passes: Vec<PassRecord>,
    #[serde(default)]
    lineups: Vec<LineupRecord>,
    #[serde(default)]
    substitutions: Vec<SubstitutionRecord>,
}

/// A session restored from disk.
#[derive(Debug)]
pub struct CachedSession {
    pub saved_at: DateTime<Utc>,
    pub log: EventLog,
}

pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let cache = CacheFile {
        version: CACHE_VERSION,
        saved_at: Utc::now(),
        events: snapshot.events().to_vec(),
        passes: snapshot.passes().to_vec(),
        lineups: snapshot.lineups().to_vec(),
        substitutions: snapshot.substitutions().to_vec(),
    };
    let json = serde_json::to_string(&cache).context("serialize session")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename into {}", path.display()))?;
    debug!("saved session v{} to {}", snapshot.version, path.display());
    Ok(())
}

/// `Ok(None)` when there is no cache or it was written by another format
/// version. Records that no longer validate are dropped with a warning.
pub fn load_snapshot(path: &Path) -> Result<Option<CachedSession>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    let cache = serde_json::from_str::<CacheFile>(&raw)
        .with_context(|| format!("parse {}", path.display()))?;
    if cache.version != CACHE_VERSION {
        warn!(
            "ignoring session cache version {} (expected {CACHE_VERSION})",
            cache.version
        );
        return Ok(None);
    }

    let mut log = EventLog::new();
    let mut rejected = 0usize;
    for event in cache.events {
        rejected += usize::from(log.append_event(event).is_err());
    }
    for pass in cache.passes {
        rejected += usize::from(log.append_pass(pass).is_err());
    }
    for lineup in cache.lineups {
        rejected += usize::from(log.append_lineup(lineup).is_err());
    }
    for sub in cache.substitutions {
        rejected += usize::from(log.append_substitution(sub).is_err());
    }
    if rejected > 0 {
        warn!("dropped {rejected} invalid record(s) from {}", path.display());
    }
    Ok(Some(CachedSession {
        saved_at: cache.saved_at,
        log,
    }))
}

/// Removes the cache file. Returns whether one existed.
pub fn clear(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
    }
}

pub fn cache_path(config: &StatsConfig) -> Option<PathBuf> {
    if let Some(dir) = &config.cache_dir {
        return Some(dir.join(CACHE_FILE));
    }
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR).join(CACHE_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(CACHE_DIR)
            .join(CACHE_FILE),
    )
}
