use chrono::{DateTime, NaiveDate, Utc};

use crate::library::{AlbumRef, Playlist, TrackIndex, TrackMeta};
use crate::spotify::{RawLibrary, RawTrack};

/// What ingestion dropped on the floor, for the report's exclusion footer.
#[derive(Debug, Default, Clone, Copy)]
pub struct IngestStats {
    pub local_skipped: usize,
    pub malformed_skipped: usize,
}

/// Convert a raw snapshot into the track index and playlist roster.
///
/// Followed/collaborative playlists not owned by `target_user` stay in the
/// roster (the report counts them) but contribute nothing to the index.
/// Local files and tracks with no catalog ID are dropped and counted.
pub fn build_index(raw: &RawLibrary, target_user: &str) -> (TrackIndex, Vec<Playlist>, IngestStats) {
    let mut index = TrackIndex::new();
    let mut stats = IngestStats::default();

    let playlists: Vec<Playlist> = raw
        .playlists
        .iter()
        .map(|p| Playlist {
            id: p.id.clone(),
            name: p.name.clone(),
            track_count: p.track_count,
            owned: p.owner == target_user,
        })
        .collect();

    for playlist in playlists.iter().filter(|p| p.owned) {
        let Some(items) = raw.playlist_tracks.get(&playlist.id) else {
            continue;
        };
        for (position, item) in items.iter().enumerate() {
            if item.is_local {
                stats.local_skipped += 1;
                continue;
            }
            let Some(meta) = item.track.as_ref().and_then(track_meta) else {
                stats.malformed_skipped += 1;
                continue;
            };
            let added_at = item.added_at.as_deref().and_then(parse_added_at);
            index.ingest(meta, &playlist.id, added_at, position as u32);
        }
    }

    if stats.local_skipped + stats.malformed_skipped > 0 {
        log::debug!(
            "Ingestion skipped {} local and {} malformed items",
            stats.local_skipped,
            stats.malformed_skipped
        );
    }

    (index, playlists, stats)
}

fn track_meta(raw: &RawTrack) -> Option<TrackMeta> {
    let id = raw.id.as_ref()?.clone();
    let album = raw.album.as_ref();
    Some(TrackMeta {
        id,
        name: raw.name.clone(),
        artists: raw.artists.iter().map(|a| a.name.clone()).collect(),
        album: AlbumRef {
            id: album.and_then(|a| a.id.clone()).unwrap_or_default(),
            name: album.and_then(|a| a.name.clone()).unwrap_or_default(),
            total_tracks: album.and_then(|a| a.total_tracks),
        },
        popularity: raw.popularity,
        release_date: album.and_then(parse_release_date),
        url: raw.external_urls.get("spotify").cloned().unwrap_or_default(),
    })
}

fn parse_added_at(s: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            // Treated the same as a missing timestamp downstream.
            log::debug!("Unparseable added_at '{s}': {e}");
            None
        }
    }
}

/// The catalog reports release dates at day, month, or year precision.
/// Coarser precisions resolve to the first day of the period.
fn parse_release_date(album: &crate::spotify::RawAlbum) -> Option<NaiveDate> {
    let date = album.release_date.as_deref()?;
    let padded = match album.release_date_precision.as_deref() {
        Some("year") => format!("{date}-01-01"),
        Some("month") => format!("{date}-01"),
        _ => date.to_string(),
    };
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::report::UserSummary;
    use crate::spotify::{RawAlbum, RawArtist, RawItem, RawPlaylist};

    fn raw_track(id: Option<&str>, name: &str) -> RawTrack {
        RawTrack {
            id: id.map(String::from),
            name: name.to_string(),
            popularity: Some(50),
            artists: vec![RawArtist {
                name: "Artist".to_string(),
            }],
            album: Some(RawAlbum {
                id: Some("alb1".to_string()),
                name: Some("Album".to_string()),
                release_date: Some("2020-03-15".to_string()),
                release_date_precision: Some("day".to_string()),
                total_tracks: Some(10),
            }),
            external_urls: BTreeMap::new(),
        }
    }

    fn item(track: Option<RawTrack>, added_at: Option<&str>, is_local: bool) -> RawItem {
        RawItem {
            added_at: added_at.map(String::from),
            is_local,
            track,
        }
    }

    fn library(playlists: Vec<RawPlaylist>, tracks: BTreeMap<String, Vec<RawItem>>) -> RawLibrary {
        RawLibrary {
            user: UserSummary::default(),
            playlists,
            playlist_tracks: tracks,
        }
    }

    fn playlist(id: &str, owner: &str) -> RawPlaylist {
        RawPlaylist {
            id: id.to_string(),
            name: format!("Playlist {id}"),
            track_count: 1,
            owner: owner.to_string(),
        }
    }

    #[test]
    fn skips_local_and_malformed_items() {
        let items = vec![
            item(Some(raw_track(Some("t1"), "Good")), Some("2021-01-01T00:00:00Z"), false),
            item(Some(raw_track(None, "Local rip")), None, true),
            item(Some(raw_track(None, "No ID")), None, false),
            item(None, None, false),
        ];
        let raw = library(
            vec![playlist("p1", "me")],
            BTreeMap::from([("p1".to_string(), items)]),
        );

        let (index, playlists, stats) = build_index(&raw, "me");
        assert_eq!(index.len(), 1);
        assert_eq!(playlists.len(), 1);
        assert_eq!(stats.local_skipped, 1);
        assert_eq!(stats.malformed_skipped, 2);

        let track = index.get("t1").unwrap();
        assert_eq!(track.meta.release_date, Some(NaiveDate::from_ymd_opt(2020, 3, 15).unwrap()));
        assert!(track.memberships().next().unwrap().added_at.is_some());
    }

    #[test]
    fn unowned_playlists_stay_in_roster_but_not_in_index() {
        let raw = library(
            vec![playlist("p1", "me"), playlist("p2", "someone-else")],
            BTreeMap::from([
                (
                    "p1".to_string(),
                    vec![item(Some(raw_track(Some("t1"), "Mine")), None, false)],
                ),
                (
                    "p2".to_string(),
                    vec![item(Some(raw_track(Some("t2"), "Theirs")), None, false)],
                ),
            ]),
        );

        let (index, playlists, _) = build_index(&raw, "me");
        assert_eq!(playlists.iter().filter(|p| p.owned).count(), 1);
        assert_eq!(playlists.iter().filter(|p| !p.owned).count(), 1);
        assert!(index.get("t1").is_some());
        assert!(index.get("t2").is_none());
    }

    #[test]
    fn release_date_precision_pads_to_first_day() {
        let mut album = RawAlbum {
            id: None,
            name: None,
            release_date: Some("1973".to_string()),
            release_date_precision: Some("year".to_string()),
            total_tracks: None,
        };
        assert_eq!(
            parse_release_date(&album),
            Some(NaiveDate::from_ymd_opt(1973, 1, 1).unwrap())
        );

        album.release_date = Some("1973-06".to_string());
        album.release_date_precision = Some("month".to_string());
        assert_eq!(
            parse_release_date(&album),
            Some(NaiveDate::from_ymd_opt(1973, 6, 1).unwrap())
        );
    }

    #[test]
    fn bad_added_at_becomes_missing() {
        assert!(parse_added_at("not-a-date").is_none());
        assert!(parse_added_at("2021-05-01T12:30:00Z").is_some());
    }
}
