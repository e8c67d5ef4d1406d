use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::library::{Playlist, TrackIndex};

/// Name keywords that mark a playlist as holding the user's favorites.
/// Plain case-insensitive substring matches, first match wins.
pub const FAVORITES_KEYWORDS: &[&str] = &[
    "favorite", "favourit", "best", "top", "all time", "loved", "essential", "greatest", "classic",
];

/// Name keywords that mark a playlist as part of the active rotation.
pub const ACTIVITY_KEYWORDS: &[&str] = &["workout", "daily", "drive", "commute", "gym"];

/// Playlists below this size count as deliberately curated ("small").
pub const SMALL_PLAYLIST_THRESHOLD: usize = 50;

/// A playlist whose median added-at falls within this window is in active use.
pub const RECENT_ACTIVITY_DAYS: i64 = 180;

/// Classification label for a playlist. Assigned once, immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistClass {
    Favorites,
    Active,
    Archive,
    Unclassified,
}

impl PlaylistClass {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::Active => "active",
            Self::Archive => "archive",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Does the playlist name suggest it contains the user's favorites?
pub fn is_favorites_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    FAVORITES_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn is_activity_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    ACTIVITY_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Median added-at of a playlist's members. None when no member has a date.
fn median_added_at(added_ats: &[DateTime<Utc>]) -> Option<DateTime<Utc>> {
    if added_ats.is_empty() {
        return None;
    }
    let mut sorted = added_ats.to_vec();
    sorted.sort();
    Some(sorted[sorted.len() / 2])
}

/// Classify one playlist.
///
/// Single decision tree, evaluated once, precedence favorites > active >
/// archive. Non-owned playlists are never classified — they are excluded from
/// scoring entirely and only show up in the exclusion counters.
pub fn classify_playlist(
    playlist: &Playlist,
    member_added_ats: &[DateTime<Utc>],
    now: DateTime<Utc>,
) -> PlaylistClass {
    if !playlist.owned {
        return PlaylistClass::Unclassified;
    }

    if is_favorites_name(&playlist.name) {
        return PlaylistClass::Favorites;
    }

    let recently_touched = median_added_at(member_added_ats)
        .map(|median| median > now - Duration::days(RECENT_ACTIVITY_DAYS))
        .unwrap_or(false);
    let small = playlist.track_count < SMALL_PLAYLIST_THRESHOLD;

    if (small && recently_touched) || is_activity_name(&playlist.name) {
        return PlaylistClass::Active;
    }

    PlaylistClass::Archive
}

/// Classify every playlist against the index. Member added-at timestamps are
/// read from the unfiltered index so classification is independent of any
/// horizon applied later.
pub fn classify_playlists(
    playlists: &[Playlist],
    index: &TrackIndex,
    now: DateTime<Utc>,
) -> BTreeMap<String, PlaylistClass> {
    // Gather added-at timestamps per playlist.
    let mut added_by_playlist: HashMap<&str, Vec<DateTime<Utc>>> = HashMap::new();
    for track in index.unique_tracks() {
        for m in track.memberships() {
            if let Some(added) = m.added_at {
                added_by_playlist
                    .entry(m.playlist_id.as_str())
                    .or_default()
                    .push(added);
            }
        }
    }

    playlists
        .iter()
        .map(|p| {
            let added = added_by_playlist
                .get(p.id.as_str())
                .map(|v| v.as_slice())
                .unwrap_or(&[]);
            (p.id.clone(), classify_playlist(p, added, now))
        })
        .collect()
}
