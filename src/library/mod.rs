pub mod ingest;

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

/// Immutable descriptor for a track as reported by the catalog.
/// Everything here is an external fact — scores are always derived, never
/// written back.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMeta {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: AlbumRef,
    pub popularity: Option<u8>,
    pub release_date: Option<NaiveDate>,
    pub url: String,
}

/// The album a track belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumRef {
    pub id: String,
    pub name: String,
    /// Total tracks on the album per catalog metadata (None for old snapshots).
    pub total_tracks: Option<u32>,
}

/// One (track, playlist) pair. Created when a playlist scan observes the
/// track; never mutated afterwards. Horizon filtering excludes memberships at
/// the view level, it does not delete them.
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    pub playlist_id: String,
    pub added_at: Option<DateTime<Utc>>,
    pub position: u32,
}

/// A playlist as observed in the user's library. The classification label is
/// assigned separately (see `classify`) so the playlist itself stays
/// immutable after ingestion.
#[derive(Debug, Clone)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub track_count: usize,
    pub owned: bool,
}

/// An indexed track: catalog metadata plus every playlist membership seen.
#[derive(Debug, Clone)]
pub struct Track {
    pub meta: TrackMeta,
    // BTreeMap so iteration over memberships is deterministic.
    memberships: BTreeMap<String, Membership>,
}

impl Track {
    pub fn memberships(&self) -> impl Iterator<Item = &Membership> {
        self.memberships.values()
    }

    pub fn membership_count(&self) -> usize {
        self.memberships.len()
    }

    /// Primary artist (first credited), if any.
    pub fn primary_artist(&self) -> Option<&str> {
        self.meta.artists.first().map(|a| a.as_str())
    }
}

/// Deduplicated per-track aggregate over all playlist scans.
///
/// Tracks iterate in first-seen order for deterministic downstream ranking.
/// Re-ingesting the same (track, playlist, added-at) tuple is a no-op;
/// conflicting immutable metadata for a known ID is resolved last-write-wins
/// with a logged warning, never a fatal error.
#[derive(Debug, Default)]
pub struct TrackIndex {
    by_id: HashMap<String, usize>,
    tracks: Vec<Track>,
    conflict_warnings: usize,
}

impl TrackIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a track and attach/overwrite the membership for (track, playlist).
    pub fn ingest(
        &mut self,
        meta: TrackMeta,
        playlist_id: &str,
        added_at: Option<DateTime<Utc>>,
        position: u32,
    ) {
        let membership = Membership {
            playlist_id: playlist_id.to_string(),
            added_at,
            position,
        };

        match self.by_id.get(&meta.id) {
            Some(&idx) => {
                let track = &mut self.tracks[idx];
                if track.meta.name != meta.name || track.meta.popularity != meta.popularity {
                    log::warn!(
                        "Conflicting metadata for track {} (\"{}\" vs \"{}\"); keeping latest",
                        meta.id,
                        track.meta.name,
                        meta.name
                    );
                    self.conflict_warnings += 1;
                    track.meta = meta;
                }
                track.memberships.insert(playlist_id.to_string(), membership);
            }
            None => {
                self.by_id.insert(meta.id.clone(), self.tracks.len());
                let mut memberships = BTreeMap::new();
                memberships.insert(playlist_id.to_string(), membership);
                self.tracks.push(Track { meta, memberships });
            }
        }
    }

    /// All indexed tracks, in first-seen order.
    pub fn unique_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn get(&self, track_id: &str) -> Option<&Track> {
        self.by_id.get(track_id).map(|&idx| &self.tracks[idx])
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Number of conflicting-metadata observations recovered by
    /// last-write-wins during ingestion.
    pub fn conflict_warnings(&self) -> usize {
        self.conflict_warnings
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn meta(id: &str, name: &str, artist: &str, album: &str) -> TrackMeta {
        TrackMeta {
            id: id.to_string(),
            name: name.to_string(),
            artists: vec![artist.to_string()],
            album: AlbumRef {
                id: format!("alb-{album}"),
                name: album.to_string(),
                total_tracks: None,
            },
            popularity: Some(50),
            release_date: None,
            url: String::new(),
        }
    }

    pub fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{meta, ts};
    use super::*;

    #[test]
    fn ingest_is_idempotent() {
        let mut index = TrackIndex::new();
        let added = Some(ts("2023-01-15T12:30:00Z"));
        index.ingest(meta("t1", "Harvest Moon", "Neil Young", "Harvest Moon"), "p1", added, 0);
        index.ingest(meta("t1", "Harvest Moon", "Neil Young", "Harvest Moon"), "p1", added, 0);

        assert_eq!(index.len(), 1);
        let track = index.get("t1").unwrap();
        assert_eq!(track.membership_count(), 1);
        assert_eq!(index.conflict_warnings(), 0);
    }

    #[test]
    fn same_track_across_playlists_accumulates_memberships() {
        let mut index = TrackIndex::new();
        index.ingest(meta("t1", "Harvest Moon", "Neil Young", "Harvest Moon"), "p1", None, 0);
        index.ingest(meta("t1", "Harvest Moon", "Neil Young", "Harvest Moon"), "p2", None, 3);

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("t1").unwrap().membership_count(), 2);
    }

    #[test]
    fn conflicting_metadata_is_last_write_wins() {
        let mut index = TrackIndex::new();
        index.ingest(meta("t1", "Harvest Moon", "Neil Young", "Harvest Moon"), "p1", None, 0);
        index.ingest(meta("t1", "Harvest Moon (Remastered)", "Neil Young", "Harvest Moon"), "p2", None, 0);

        let track = index.get("t1").unwrap();
        assert_eq!(track.meta.name, "Harvest Moon (Remastered)");
        assert_eq!(index.conflict_warnings(), 1);
    }

    #[test]
    fn unique_tracks_iterate_in_first_seen_order() {
        let mut index = TrackIndex::new();
        index.ingest(meta("t3", "C", "X", "A"), "p1", None, 0);
        index.ingest(meta("t1", "A", "X", "A"), "p1", None, 1);
        index.ingest(meta("t2", "B", "X", "A"), "p1", None, 2);
        index.ingest(meta("t1", "A", "X", "A"), "p2", None, 0);

        let ids: Vec<&str> = index.unique_tracks().map(|t| t.meta.id.as_str()).collect();
        assert_eq!(ids, vec!["t3", "t1", "t2"]);
    }
}
