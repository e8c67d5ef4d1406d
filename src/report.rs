use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{AlbumStats, ArtistStats};
use crate::classify::PlaylistClass;
use crate::horizon::LibraryView;
use crate::library::{Playlist, TrackIndex};

/// Profile of the analyzed user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub display_name: String,
    pub followers: u64,
    pub profile_url: String,
}

/// A scored track with every sub-metric that fed its scores, so rankings
/// stay explainable downstream.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub url: String,
    pub playlist_count: usize,
    pub in_favorites_playlist: bool,
    pub playlists: Vec<String>,
    pub context_labels: Vec<&'static str>,
    pub affinity_score: i64,
    pub versatility_score: i64,
    pub popularity: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub track: ScoredTrack,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlbumEntry {
    pub rank: usize,
    pub name: String,
    pub artist: String,
    pub track_count: usize,
    pub total_appearances: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_ratio: Option<f64>,
    pub is_likely_favorite: bool,
    pub tracks: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtistEntry {
    pub rank: usize,
    pub name: String,
    pub fan_level: &'static str,
    pub unique_tracks: usize,
    pub total_appearances: usize,
    pub tracks: Vec<String>,
}

/// Owned playlists grouped by classification label (names, sorted).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationSummary {
    pub favorites: Vec<String>,
    pub active: Vec<String>,
    pub archive: Vec<String>,
}

/// The complete analysis report: the stable, JSON-exportable shape every
/// rendering front end consumes. Field-for-field identical across runs with
/// identical inputs.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub user: UserSummary,
    pub total_playlists: usize,
    pub playlists_analyzed: usize,
    pub playlists_skipped_owner: usize,
    pub total_unique_tracks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon_cutoff: Option<DateTime<Utc>>,
    pub tracks_filtered: usize,
    pub tracks_missing_added_at: usize,
    pub metadata_conflicts: usize,
    pub playlist_classification: ClassificationSummary,
    pub likely_favorites: Vec<TrackEntry>,
    pub versatile_tracks: Vec<TrackEntry>,
    pub favorite_albums: Vec<AlbumEntry>,
    pub top_artists: Vec<ArtistEntry>,
    pub all_tracks: Vec<TrackEntry>,
}

fn rank_tracks(mut tracks: Vec<ScoredTrack>, key: fn(&ScoredTrack) -> i64, top_n: usize) -> Vec<TrackEntry> {
    // Descending score, then total appearances, then name (case-folded).
    tracks.sort_by(|a, b| {
        key(b)
            .cmp(&key(a))
            .then_with(|| b.playlist_count.cmp(&a.playlist_count))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    tracks.truncate(top_n);
    tracks
        .into_iter()
        .enumerate()
        .map(|(i, track)| TrackEntry { rank: i + 1, track })
        .collect()
}

/// Sort, rank, truncate, and emit the final report. All ordering here is
/// deterministic: every sort has a full tie-break chain down to a name.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    user: UserSummary,
    playlists: &[Playlist],
    classes: &BTreeMap<String, PlaylistClass>,
    index: &TrackIndex,
    view: &LibraryView<'_>,
    horizon_cutoff: Option<DateTime<Utc>>,
    scored: Vec<ScoredTrack>,
    mut artists: Vec<ArtistStats>,
    mut albums: Vec<AlbumStats>,
    top_n: usize,
) -> Report {
    let skipped_owner = playlists.iter().filter(|p| !p.owned).count();

    let mut classification = ClassificationSummary::default();
    for p in playlists.iter().filter(|p| p.owned) {
        match classes.get(&p.id) {
            Some(PlaylistClass::Favorites) => classification.favorites.push(p.name.clone()),
            Some(PlaylistClass::Active) => classification.active.push(p.name.clone()),
            Some(PlaylistClass::Archive) => classification.archive.push(p.name.clone()),
            _ => {}
        }
    }
    classification.favorites.sort();
    classification.active.sort();
    classification.archive.sort();

    // Affinity list considers tracks with repeat presence or a favorites
    // membership; versatility needs repeat presence outright.
    let favorites_pool: Vec<ScoredTrack> = scored
        .iter()
        .filter(|t| t.playlist_count > 1 || t.in_favorites_playlist)
        .cloned()
        .collect();
    let versatile_pool: Vec<ScoredTrack> = scored
        .iter()
        .filter(|t| t.playlist_count > 1)
        .cloned()
        .collect();

    let likely_favorites = rank_tracks(favorites_pool, |t| t.affinity_score, top_n);
    let versatile_tracks = rank_tracks(versatile_pool, |t| t.versatility_score, top_n);
    let all_tracks = rank_tracks(scored, |t| t.playlist_count as i64, top_n);

    artists.sort_by(|a, b| {
        b.unique_tracks
            .cmp(&a.unique_tracks)
            .then_with(|| b.total_appearances.cmp(&a.total_appearances))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    artists.truncate(top_n);
    let top_artists = artists
        .into_iter()
        .enumerate()
        .map(|(i, a)| ArtistEntry {
            rank: i + 1,
            fan_level: a.fan_level().label(),
            name: a.name,
            unique_tracks: a.unique_tracks,
            total_appearances: a.total_appearances,
            tracks: a.tracks,
        })
        .collect();

    albums.sort_by(|a, b| {
        b.unique_tracks()
            .cmp(&a.unique_tracks())
            .then_with(|| b.total_appearances.cmp(&a.total_appearances))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    albums.truncate(top_n);
    let favorite_albums = albums
        .into_iter()
        .enumerate()
        .map(|(i, a)| AlbumEntry {
            rank: i + 1,
            track_count: a.unique_tracks(),
            completion_ratio: a.completion_ratio(),
            is_likely_favorite: a.is_likely_favorite(),
            name: a.name,
            artist: a.artist,
            total_appearances: a.total_appearances,
            tracks: a.tracks,
        })
        .collect();

    Report {
        user,
        total_playlists: playlists.len(),
        playlists_analyzed: playlists.len() - skipped_owner,
        playlists_skipped_owner: skipped_owner,
        total_unique_tracks: index.len(),
        horizon_cutoff,
        tracks_filtered: view.horizon_filtered,
        tracks_missing_added_at: view.missing_added_at,
        metadata_conflicts: index.conflict_warnings(),
        playlist_classification: classification,
        likely_favorites,
        versatile_tracks,
        favorite_albums,
        top_artists,
        all_tracks,
    }
}
