use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::report::UserSummary;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

/// Playlists per page from the Web API.
const PLAYLIST_PAGE: usize = 50;
/// Tracks per page from the Web API.
const TRACK_PAGE: usize = 100;
/// Pause between paged requests to stay friendly with rate limits.
const PAGE_DELAY_MS: u64 = 100;

/// Track fields requested per playlist item — everything scoring needs,
/// nothing more.
const TRACK_FIELDS: &str = "items(added_at,is_local,track(id,name,popularity,\
artists(name),album(id,name,release_date,release_date_precision,total_tracks),\
external_urls)),next";

/// The raw library snapshot for one user: exactly what gets cached on disk
/// and what ingestion consumes. Kept close to the wire shape so a cached
/// snapshot can be re-processed after scoring logic changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLibrary {
    pub user: UserSummary,
    pub playlists: Vec<RawPlaylist>,
    /// Playlist ID → items, BTreeMap for a stable cached representation.
    pub playlist_tracks: BTreeMap<String, Vec<RawItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPlaylist {
    pub id: String,
    pub name: String,
    pub track_count: usize,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawItem {
    pub added_at: Option<String>,
    #[serde(default)]
    pub is_local: bool,
    pub track: Option<RawTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTrack {
    pub id: Option<String>,
    pub name: String,
    pub popularity: Option<u8>,
    #[serde(default)]
    pub artists: Vec<RawArtist>,
    pub album: Option<RawAlbum>,
    #[serde(default)]
    pub external_urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArtist {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAlbum {
    pub id: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub release_date_precision: Option<String>,
    pub total_tracks: Option<u32>,
}

// ── Web API response shapes (fetch only, never cached) ────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    display_name: Option<String>,
    followers: Option<Followers>,
    #[serde(default)]
    external_urls: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Followers {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    // Deleted playlists come back as null entries.
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    public: bool,
    tracks: Option<PlaylistTracksRef>,
    owner: Option<PlaylistOwner>,
}

#[derive(Debug, Deserialize)]
struct PlaylistTracksRef {
    total: usize,
}

#[derive(Debug, Deserialize)]
struct PlaylistOwner {
    id: String,
}

/// Minimal client-credentials Spotify Web API client. Public data only —
/// no OAuth browser flow, no listening history.
pub struct SpotifyClient {
    token: String,
}

impl SpotifyClient {
    /// Exchange app credentials for a bearer token.
    pub fn connect(client_id: &str, client_secret: &str) -> Result<Self> {
        let resp: TokenResponse = ureq::post(TOKEN_URL)
            .send_form([
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .context("Spotify token request failed")?
            .body_mut()
            .read_json()
            .context("Failed to parse Spotify token response")?;

        Ok(Self {
            token: resp.access_token,
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        ureq::get(url)
            .header("Authorization", &format!("Bearer {}", self.token))
            .call()
            .with_context(|| format!("Request failed: {url}"))?
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse response: {url}"))
    }

    /// Fetch a user's profile, public playlists, and every playlist's tracks.
    pub fn fetch_library(&self, user_id: &str) -> Result<RawLibrary> {
        let user = self.fetch_user(user_id)?;
        let playlists = self.fetch_playlists(user_id)?;
        if playlists.is_empty() {
            bail!("User {user_id} has no public playlists");
        }

        println!("Fetching tracks from {} playlists...", playlists.len());
        let pb = ProgressBar::new(playlists.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("  [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("static template")
                .progress_chars("##-"),
        );

        let mut playlist_tracks = BTreeMap::new();
        for playlist in &playlists {
            pb.set_message(playlist.name.chars().take(30).collect::<String>());
            match self.fetch_playlist_items(&playlist.id) {
                Ok(items) => {
                    playlist_tracks.insert(playlist.id.clone(), items);
                }
                Err(e) => {
                    // One broken playlist shouldn't sink the whole run.
                    log::warn!("Skipping playlist {} ({}): {e:#}", playlist.name, playlist.id);
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(RawLibrary {
            user,
            playlists,
            playlist_tracks,
        })
    }

    fn fetch_user(&self, user_id: &str) -> Result<UserSummary> {
        let user: UserResponse = self.get_json(&format!("{API_BASE}/users/{user_id}"))?;
        Ok(UserSummary {
            display_name: user.display_name.clone().unwrap_or_else(|| user.id.clone()),
            followers: user.followers.map(|f| f.total).unwrap_or(0),
            profile_url: user.external_urls.get("spotify").cloned().unwrap_or_default(),
            id: user.id,
        })
    }

    fn fetch_playlists(&self, user_id: &str) -> Result<Vec<RawPlaylist>> {
        let mut playlists = Vec::new();
        let mut offset = 0;

        loop {
            let url = format!(
                "{API_BASE}/users/{user_id}/playlists?limit={PLAYLIST_PAGE}&offset={offset}"
            );
            let page: Page<Option<PlaylistResponse>> = self.get_json(&url)?;
            if page.items.is_empty() {
                break;
            }

            for playlist in page.items.into_iter().flatten() {
                if !playlist.public {
                    continue;
                }
                let (Some(id), Some(name)) = (playlist.id, playlist.name) else {
                    continue;
                };
                playlists.push(RawPlaylist {
                    id,
                    name,
                    track_count: playlist.tracks.map(|t| t.total).unwrap_or(0),
                    owner: playlist.owner.map(|o| o.id).unwrap_or_default(),
                });
            }

            if page.next.is_none() {
                break;
            }
            offset += PLAYLIST_PAGE;
            thread::sleep(Duration::from_millis(PAGE_DELAY_MS));
        }

        Ok(playlists)
    }

    fn fetch_playlist_items(&self, playlist_id: &str) -> Result<Vec<RawItem>> {
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            let url = format!(
                "{API_BASE}/playlists/{playlist_id}/tracks?limit={TRACK_PAGE}&offset={offset}&fields={TRACK_FIELDS}"
            );
            let page: Page<RawItem> = self.get_json(&url)?;
            if page.items.is_empty() {
                break;
            }
            items.extend(page.items);

            if page.next.is_none() {
                break;
            }
            offset += TRACK_PAGE;
            thread::sleep(Duration::from_millis(PAGE_DELAY_MS));
        }

        Ok(items)
    }
}

/// Accept a bare user ID or a full profile URL.
pub fn normalize_user_id(input: &str) -> String {
    match input.split_once("spotify.com/user/") {
        Some((_, rest)) => rest
            .split(['?', '/'])
            .next()
            .unwrap_or(rest)
            .to_string(),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_profile_urls() {
        assert_eq!(normalize_user_id("1234567890"), "1234567890");
        assert_eq!(
            normalize_user_id("https://open.spotify.com/user/1234567890"),
            "1234567890"
        );
        assert_eq!(
            normalize_user_id("https://open.spotify.com/user/1234567890?si=abc"),
            "1234567890"
        );
        assert_eq!(
            normalize_user_id("https://open.spotify.com/user/1234567890/"),
            "1234567890"
        );
    }

    #[test]
    fn raw_item_tolerates_missing_fields() {
        // Old cached snapshots predate some fields; they must still load.
        let item: RawItem = serde_json::from_str(
            r#"{"added_at": null, "track": {"id": "t1", "name": "Song", "popularity": null}}"#,
        )
        .unwrap();
        assert!(!item.is_local);
        let track = item.track.unwrap();
        assert!(track.album.is_none());
        assert!(track.artists.is_empty());
    }
}
