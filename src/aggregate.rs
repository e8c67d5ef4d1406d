use std::collections::BTreeMap;

use serde::Serialize;

use crate::horizon::LibraryView;

/// Album is flagged a likely favorite above this many unique tracks...
pub const ALBUM_FAVORITE_TRACK_COUNT: usize = 5;
/// ...or above this completion ratio.
pub const ALBUM_FAVORITE_COMPLETION: f64 = 0.6;

/// Dedication bands over unique-track-per-artist count. Bands are inclusive
/// and cover every count >= 1; artists with zero surviving tracks are never
/// aggregated in the first place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FanLevel {
    Casual,
    Fan,
    BigFan,
    SuperFan,
}

impl FanLevel {
    pub fn from_unique_tracks(count: usize) -> Self {
        match count {
            n if n >= 15 => Self::SuperFan,
            n if n >= 8 => Self::BigFan,
            n if n >= 4 => Self::Fan,
            _ => Self::Casual,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SuperFan => "SUPER FAN",
            Self::BigFan => "Big Fan",
            Self::Fan => "Fan",
            Self::Casual => "Casual",
        }
    }
}

/// Per-artist rollup of surviving tracks.
#[derive(Debug, Clone)]
pub struct ArtistStats {
    pub name: String,
    pub unique_tracks: usize,
    pub total_appearances: usize,
    pub tracks: Vec<String>,
}

impl ArtistStats {
    pub fn fan_level(&self) -> FanLevel {
        FanLevel::from_unique_tracks(self.unique_tracks)
    }
}

/// Per-album rollup of surviving tracks, keyed by (album name, primary artist).
#[derive(Debug, Clone)]
pub struct AlbumStats {
    pub name: String,
    pub artist: String,
    pub total_appearances: usize,
    pub total_tracks_in_album: Option<u32>,
    pub tracks: Vec<String>,
}

impl AlbumStats {
    pub fn unique_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Fraction of the album's known tracks present in the library, clamped
    /// to [0, 1]. None when the catalog never reported the album's size.
    pub fn completion_ratio(&self) -> Option<f64> {
        match self.total_tracks_in_album {
            Some(total) if total > 0 => {
                Some((self.tracks.len() as f64 / total as f64).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }

    pub fn is_likely_favorite(&self) -> bool {
        self.unique_tracks() >= ALBUM_FAVORITE_TRACK_COUNT
            || self
                .completion_ratio()
                .is_some_and(|r| r >= ALBUM_FAVORITE_COMPLETION)
    }
}

/// Roll surviving tracks up per artist. Output order is deterministic
/// (keyed by name); ranking happens in the report assembler.
pub fn aggregate_artists(view: &LibraryView<'_>) -> Vec<ArtistStats> {
    let mut by_name: BTreeMap<&str, ArtistStats> = BTreeMap::new();

    for (track, surviving) in view.surviving_tracks() {
        for artist in &track.meta.artists {
            let stats = by_name.entry(artist.as_str()).or_insert_with(|| ArtistStats {
                name: artist.clone(),
                unique_tracks: 0,
                total_appearances: 0,
                tracks: Vec::new(),
            });
            if !stats.tracks.contains(&track.meta.name) {
                stats.tracks.push(track.meta.name.clone());
                stats.unique_tracks += 1;
            }
            stats.total_appearances += surviving.len();
        }
    }

    by_name.into_values().collect()
}

/// Roll surviving tracks up per album.
pub fn aggregate_albums(view: &LibraryView<'_>) -> Vec<AlbumStats> {
    let mut by_key: BTreeMap<(String, String), AlbumStats> = BTreeMap::new();

    for (track, surviving) in view.surviving_tracks() {
        if track.meta.album.name.is_empty() {
            continue;
        }
        let artist = track.primary_artist().unwrap_or("Unknown").to_string();
        let key = (track.meta.album.name.clone(), artist.clone());
        let stats = by_key.entry(key).or_insert_with(|| AlbumStats {
            name: track.meta.album.name.clone(),
            artist,
            total_appearances: 0,
            total_tracks_in_album: track.meta.album.total_tracks,
            tracks: Vec::new(),
        });
        if !stats.tracks.contains(&track.meta.name) {
            stats.tracks.push(track.meta.name.clone());
        }
        stats.total_appearances += surviving.len();
        // Backfill album size if the first track seen lacked it.
        if stats.total_tracks_in_album.is_none() {
            stats.total_tracks_in_album = track.meta.album.total_tracks;
        }
    }

    by_key.into_values().collect()
}
