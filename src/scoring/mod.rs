pub mod affinity;
pub mod versatility;
pub mod weights;

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::classify::PlaylistClass;
use crate::horizon::LibraryView;
use crate::library::{Membership, Playlist, Track};
use crate::scoring::weights::ScoreWeights;

/// Shared read-only context for both scorers: classifications, playlist
/// sizes, and the artist/album co-occurrence counts built from the surviving
/// view. The scorers hold no state of their own.
pub struct ScoreContext {
    classes: BTreeMap<String, PlaylistClass>,
    playlist_sizes: HashMap<String, usize>,
    artist_track_counts: HashMap<String, usize>,
    album_track_counts: HashMap<String, usize>,
    pub weights: ScoreWeights,
    pub now: DateTime<Utc>,
}

impl ScoreContext {
    /// Build the context from a horizon-filtered view. Only surviving tracks
    /// contribute to the artist/album counts, so a horizon narrows dedication
    /// and depth signals along with everything else.
    pub fn build(
        view: &LibraryView<'_>,
        playlists: &[Playlist],
        classes: BTreeMap<String, PlaylistClass>,
        weights: ScoreWeights,
        now: DateTime<Utc>,
    ) -> Self {
        let playlist_sizes = playlists
            .iter()
            .map(|p| (p.id.clone(), p.track_count))
            .collect();

        let mut artist_track_counts: HashMap<String, usize> = HashMap::new();
        let mut album_track_counts: HashMap<String, usize> = HashMap::new();
        for (track, _) in view.surviving_tracks() {
            for artist in &track.meta.artists {
                *artist_track_counts.entry(artist.clone()).or_insert(0) += 1;
            }
            if !track.meta.album.id.is_empty() {
                *album_track_counts.entry(track.meta.album.id.clone()).or_insert(0) += 1;
            }
        }

        Self {
            classes,
            playlist_sizes,
            artist_track_counts,
            album_track_counts,
            weights,
            now,
        }
    }

    pub fn class_of(&self, playlist_id: &str) -> PlaylistClass {
        self.classes
            .get(playlist_id)
            .copied()
            .unwrap_or(PlaylistClass::Unclassified)
    }

    pub fn playlist_size(&self, playlist_id: &str) -> Option<usize> {
        self.playlist_sizes.get(playlist_id).copied()
    }

    /// Unique surviving tracks credited to this artist.
    pub fn artist_tracks(&self, artist: &str) -> usize {
        self.artist_track_counts.get(artist).copied().unwrap_or(0)
    }

    /// Unique surviving tracks from this album.
    pub fn album_tracks(&self, album_id: &str) -> usize {
        self.album_track_counts.get(album_id).copied().unwrap_or(0)
    }
}

/// Does any surviving membership sit in a favorites-classified playlist?
pub fn in_favorites(memberships: &[&Membership], ctx: &ScoreContext) -> bool {
    memberships
        .iter()
        .any(|m| ctx.class_of(&m.playlist_id) == PlaylistClass::Favorites)
}

/// Earliest surviving added-at, if any membership carries one.
pub fn earliest_added(memberships: &[&Membership]) -> Option<DateTime<Utc>> {
    memberships.iter().filter_map(|m| m.added_at).min()
}

/// Latest surviving added-at, if any membership carries one.
pub fn latest_added(memberships: &[&Membership]) -> Option<DateTime<Utc>> {
    memberships.iter().filter_map(|m| m.added_at).max()
}

/// Highest shared-track count across a track's credited artists.
pub fn max_artist_dedication(track: &Track, ctx: &ScoreContext) -> usize {
    track
        .meta
        .artists
        .iter()
        .map(|a| ctx.artist_tracks(a))
        .max()
        .unwrap_or(0)
}
