use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::spotify::RawLibrary;

/// Snapshots older than this are refetched.
pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    cached_at: DateTime<Utc>,
    user_id: String,
    library: RawLibrary,
}

/// Per-user library snapshots cached as JSON under the platform cache dir.
pub struct LibraryCache {
    dir: PathBuf,
    ttl_hours: i64,
}

impl LibraryCache {
    pub fn open(ttl_hours: i64) -> Self {
        let dir = ProjectDirs::from("", "", crate::APP_NAME)
            .map(|d| d.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".deepcut-cache"));
        Self::at(dir, ttl_hours)
    }

    pub fn at(dir: impl Into<PathBuf>, ttl_hours: i64) -> Self {
        Self {
            dir: dir.into(),
            ttl_hours,
        }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        let safe: String = user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    /// Load a fresh snapshot, or None. Expired, missing, and unreadable
    /// entries all report as a miss; corruption is logged, never fatal.
    pub fn load(&self, user_id: &str, now: DateTime<Utc>) -> Option<RawLibrary> {
        let path = self.path_for(user_id);
        let data = fs::read_to_string(&path).ok()?;
        let envelope: CacheEnvelope = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Discarding corrupt cache entry {}: {e}", path.display());
                return None;
            }
        };

        let age = now.signed_duration_since(envelope.cached_at);
        if age.num_hours() >= self.ttl_hours {
            log::info!(
                "Cache for {user_id} is {}h old (ttl {}h), refetching",
                age.num_hours(),
                self.ttl_hours
            );
            return None;
        }
        log::info!("Using cached library for {user_id} ({}h old)", age.num_hours());
        Some(envelope.library)
    }

    pub fn save(&self, user_id: &str, library: &RawLibrary, now: DateTime<Utc>) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create cache dir {}", self.dir.display()))?;
        let envelope = CacheEnvelope {
            cached_at: now,
            user_id: user_id.to_string(),
            library: library.clone(),
        };
        let path = self.path_for(user_id);
        let json = serde_json::to_string(&envelope)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write cache entry {}", path.display()))?;
        log::debug!("Cached library for {user_id} at {}", path.display());
        Ok(())
    }

    /// Remove one user's entry, or every entry. Returns how many files went.
    pub fn clear(&self, user_id: Option<&str>) -> Result<usize> {
        match user_id {
            Some(user_id) => {
                let path = self.path_for(user_id);
                if path.exists() {
                    fs::remove_file(&path)
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                    Ok(1)
                } else {
                    Ok(0)
                }
            }
            None => self.clear_all(),
        }
    }

    fn clear_all(&self) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if is_cache_file(&path) {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn is_cache_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|e| e == "json")
}
