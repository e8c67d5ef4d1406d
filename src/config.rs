use std::path::PathBuf;

use anyhow::{Result, bail};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::cache::DEFAULT_TTL_HOURS;
use crate::scoring::weights::ScoreWeights;

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults — the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Spotify API client ID (falls back to SPOTIFY_CLIENT_ID env var).
    pub client_id: Option<String>,
    /// Spotify API client secret (falls back to SPOTIFY_CLIENT_SECRET env var).
    pub client_secret: Option<String>,
    /// Cache TTL in hours before re-fetching a library snapshot.
    pub cache_ttl_hours: i64,
    /// Scoring weight overrides (merged over built-in defaults).
    pub weights: ScoreWeights,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            cache_ttl_hours: DEFAULT_TTL_HOURS,
            weights: ScoreWeights::default(),
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/deepcut/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Resolve API credentials: config file first, then environment.
    pub fn credentials(&self) -> Result<(String, String)> {
        let id = self
            .client_id
            .clone()
            .or_else(|| std::env::var("SPOTIFY_CLIENT_ID").ok());
        let secret = self
            .client_secret
            .clone()
            .or_else(|| std::env::var("SPOTIFY_CLIENT_SECRET").ok());
        match (id, secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
            _ => bail!(
                "Spotify credentials not found. Set client_id/client_secret in the config \
                 file or the SPOTIFY_CLIENT_ID/SPOTIFY_CLIENT_SECRET environment variables."
            ),
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config() {
        let config: AppConfig = toml::from_str(
            r#"
            client_id = "abc"
            cache_ttl_hours = 48

            [weights.affinity]
            favorites = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.client_id.as_deref(), Some("abc"));
        assert!(config.client_secret.is_none());
        assert_eq!(config.cache_ttl_hours, 48);
        assert_eq!(config.weights.affinity.favorites, 40);
        // Untouched weights keep their defaults.
        assert_eq!(config.weights.affinity.cross_context, 10);
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.cache_ttl_hours, DEFAULT_TTL_HOURS);
        assert!(config.client_id.is_none());
    }
}
