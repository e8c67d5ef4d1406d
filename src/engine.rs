use std::collections::BTreeSet;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::aggregate::{aggregate_albums, aggregate_artists};
use crate::classify::{PlaylistClass, classify_playlists};
use crate::horizon::{LibraryView, parse_horizon};
use crate::library::{Playlist, TrackIndex};
use crate::report::{Report, ScoredTrack, UserSummary, assemble};
use crate::scoring::weights::ScoreWeights;
use crate::scoring::{ScoreContext, affinity::affinity_score, versatility::versatility_score};

/// Default number of entries per ranked list.
pub const DEFAULT_TOP_N: usize = 50;

/// Errors rejected at the engine boundary, before any scoring runs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid horizon '{0}': use a number followed by y, m, or d (e.g. 1y, 6m, 30d)")]
    InvalidHorizon(String),
    #[error("top-n must be a positive integer")]
    InvalidTopN,
}

/// Caller-supplied knobs for one analysis run. `now` is explicit so repeated
/// runs over the same snapshot are byte-identical.
pub struct AnalysisOptions {
    pub top_n: usize,
    pub horizon: Option<String>,
    pub weights: ScoreWeights,
    pub now: DateTime<Utc>,
}

impl AnalysisOptions {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            horizon: None,
            weights: ScoreWeights::default(),
            now,
        }
    }
}

/// Run the full scoring/aggregation pipeline over a populated index.
///
/// Pure and synchronous: classify → horizon view → score → aggregate →
/// assemble. The index is only read, so several analyses (say, different
/// horizons) can run against one snapshot.
pub fn analyze(
    user: UserSummary,
    index: &TrackIndex,
    playlists: &[Playlist],
    opts: &AnalysisOptions,
) -> Result<Report, EngineError> {
    if opts.top_n == 0 {
        return Err(EngineError::InvalidTopN);
    }
    let cutoff = opts
        .horizon
        .as_deref()
        .map(|spec| parse_horizon(spec, opts.now))
        .transpose()?;

    let classes = classify_playlists(playlists, index, opts.now);
    let view = LibraryView::build(index, cutoff);
    let ctx = ScoreContext::build(&view, playlists, classes.clone(), opts.weights.clone(), opts.now);

    let playlist_names: HashMap<&str, &str> = playlists
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();

    let mut scored = Vec::new();
    for (track, surviving) in view.surviving_tracks() {
        let labels: BTreeSet<PlaylistClass> = surviving
            .iter()
            .map(|m| ctx.class_of(&m.playlist_id))
            .collect();
        scored.push(ScoredTrack {
            id: track.meta.id.clone(),
            name: track.meta.name.clone(),
            artists: track.meta.artists.clone(),
            album: track.meta.album.name.clone(),
            url: track.meta.url.clone(),
            playlist_count: surviving.len(),
            in_favorites_playlist: labels.contains(&PlaylistClass::Favorites),
            playlists: surviving
                .iter()
                .filter_map(|m| playlist_names.get(m.playlist_id.as_str()))
                .map(|n| n.to_string())
                .collect(),
            context_labels: labels.iter().map(|c| c.label()).collect(),
            affinity_score: affinity_score(track, surviving, &ctx),
            versatility_score: versatility_score(track, surviving, &ctx),
            popularity: track.meta.popularity,
        });
    }

    let artists = aggregate_artists(&view);
    let albums = aggregate_albums(&view);

    Ok(assemble(
        user, playlists, &classes, index, &view, cutoff, scored, artists, albums, opts.top_n,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::test_support::{meta, ts};
    use crate::library::TrackMeta;

    fn playlist(id: &str, name: &str, owned: bool) -> Playlist {
        Playlist {
            id: id.to_string(),
            name: name.to_string(),
            // Large enough to stay out of the small-playlist bands.
            track_count: 100,
            owned,
        }
    }

    fn with_popularity(m: TrackMeta, popularity: u8) -> TrackMeta {
        TrackMeta {
            popularity: Some(popularity),
            ..m
        }
    }

    /// An obscure track in "Favorites 2020" and "Gym", plus a popular track
    /// sitting in an archive playlist. The fixture the ranking scenarios share.
    fn fixture() -> (TrackIndex, Vec<Playlist>) {
        let mut index = TrackIndex::new();
        index.ingest(
            with_popularity(meta("t-deep", "Deep Cut", "Obscure Band", "Obscurities"), 10),
            "p-fav",
            Some(ts("2020-01-01T00:00:00Z")),
            0,
        );
        index.ingest(
            with_popularity(meta("t-deep", "Deep Cut", "Obscure Band", "Obscurities"), 10),
            "p-gym",
            Some(ts("2021-06-01T00:00:00Z")),
            0,
        );
        index.ingest(
            with_popularity(meta("t-hit", "Radio Hit", "Chart Band", "Smash"), 90),
            "p-dump",
            Some(ts("2016-05-01T00:00:00Z")),
            0,
        );
        let playlists = vec![
            playlist("p-fav", "Favorites 2020", true),
            playlist("p-gym", "Gym", true),
            playlist("p-dump", "2016 archive dump", true),
        ];
        (index, playlists)
    }

    fn now() -> DateTime<Utc> {
        ts("2021-07-01T00:00:00Z")
    }

    #[test]
    fn favorites_membership_outranks_raw_popularity() {
        let (index, playlists) = fixture();
        let report = analyze(
            UserSummary::default(),
            &index,
            &playlists,
            &AnalysisOptions::new(now()),
        )
        .unwrap();

        // t-deep: 2 playlists (+20), favorites (+25), cross-context (+10),
        // obscurity (+8), recent add (+10), 17-month added-at span (+15),
        // one active-rotation membership (+5).
        let top = &report.likely_favorites[0];
        assert_eq!(top.track.id, "t-deep");
        assert_eq!(top.track.affinity_score, 93);
        assert!(top.track.in_favorites_playlist);
        assert_eq!(top.track.context_labels, vec!["favorites", "active"]);

        // The chart hit never reaches the favorites list (single playlist,
        // no favorites membership) and its popularity works against it.
        assert!(report.likely_favorites.iter().all(|e| e.track.id != "t-hit"));
        let hit = report
            .all_tracks
            .iter()
            .find(|e| e.track.id == "t-hit")
            .unwrap();
        assert_eq!(hit.track.affinity_score, 10 - 8);
    }

    #[test]
    fn versatility_rewards_context_spread() {
        let (index, playlists) = fixture();
        let report = analyze(
            UserSummary::default(),
            &index,
            &playlists,
            &AnalysisOptions::new(now()),
        )
        .unwrap();

        // Presence 2×10, popularity 10 → nothing, two labels → +10.
        let top = &report.versatile_tracks[0];
        assert_eq!(top.track.id, "t-deep");
        assert_eq!(top.track.versatility_score, 30);
        // Single-playlist tracks never enter the versatility list.
        assert_eq!(report.versatile_tracks.len(), 1);
    }

    #[test]
    fn horizon_drops_old_memberships_from_every_signal() {
        let (index, playlists) = fixture();
        let mut opts = AnalysisOptions::new(now());
        opts.horizon = Some("6m".to_string());

        let report = analyze(UserSummary::default(), &index, &playlists, &opts).unwrap();

        assert!(report.horizon_cutoff.is_some());
        // The 2020 favorites add and the 2016 add both fall outside the window.
        assert_eq!(report.tracks_filtered, 2);

        // t-deep is down to its Gym membership: no favorites bonus, no
        // cross-context, no evergreen span. 10 + 8 + 10 + 5.
        let deep = report
            .all_tracks
            .iter()
            .find(|e| e.track.id == "t-deep")
            .unwrap();
        assert_eq!(deep.track.playlist_count, 1);
        assert_eq!(deep.track.affinity_score, 33);
        assert!(!deep.track.in_favorites_playlist);

        // Nothing qualifies for the favorites or versatility lists any more.
        assert!(report.likely_favorites.is_empty());
        assert!(report.versatile_tracks.is_empty());
        // t-hit lost its only membership and dropped out entirely.
        assert!(report.all_tracks.iter().all(|e| e.track.id != "t-hit"));
    }

    #[test]
    fn top_n_truncates_after_ranking() {
        let (mut index, playlists) = fixture();
        // A second favorites-playlist track so the affinity list has
        // something to truncate away.
        index.ingest(
            with_popularity(meta("t-also", "Also Loved", "Other Band", "Elsewhere"), 60),
            "p-fav",
            Some(ts("2020-02-01T00:00:00Z")),
            1,
        );
        let mut opts = AnalysisOptions::new(now());
        opts.top_n = 1;

        let report = analyze(UserSummary::default(), &index, &playlists, &opts).unwrap();
        assert_eq!(report.all_tracks.len(), 1);
        assert_eq!(report.all_tracks[0].rank, 1);
        assert_eq!(report.all_tracks[0].track.id, "t-deep");

        // The affinity list truncates the same way and keeps the top scorer.
        assert_eq!(report.likely_favorites.len(), 1);
        assert_eq!(report.likely_favorites[0].rank, 1);
        assert_eq!(report.likely_favorites[0].track.id, "t-deep");
        assert_eq!(report.likely_favorites[0].track.affinity_score, 93);
    }

    #[test]
    fn ties_break_on_case_folded_name() {
        let mut index = TrackIndex::new();
        index.ingest(meta("t2", "Beta", "X", "A"), "p1", None, 0);
        index.ingest(meta("t1", "alpha", "X", "A"), "p1", None, 1);
        let playlists = vec![playlist("p1", "2016 archive dump", true)];

        let report = analyze(
            UserSummary::default(),
            &index,
            &playlists,
            &AnalysisOptions::new(now()),
        )
        .unwrap();
        let names: Vec<&str> = report
            .all_tracks
            .iter()
            .map(|e| e.track.name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "Beta"]);
    }

    #[test]
    fn identical_inputs_yield_byte_identical_reports() {
        let (index, playlists) = fixture();
        let opts = AnalysisOptions::new(now());

        let a = analyze(UserSummary::default(), &index, &playlists, &opts).unwrap();
        let b = analyze(UserSummary::default(), &index, &playlists, &opts).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn empty_library_is_a_valid_report() {
        let index = TrackIndex::new();
        let report = analyze(
            UserSummary::default(),
            &index,
            &[],
            &AnalysisOptions::new(now()),
        )
        .unwrap();
        assert_eq!(report.total_unique_tracks, 0);
        assert!(report.likely_favorites.is_empty());
        assert!(report.top_artists.is_empty());
    }

    #[test]
    fn invalid_options_are_rejected_before_scoring() {
        let (index, playlists) = fixture();

        let mut opts = AnalysisOptions::new(now());
        opts.top_n = 0;
        assert!(matches!(
            analyze(UserSummary::default(), &index, &playlists, &opts),
            Err(EngineError::InvalidTopN)
        ));

        let mut opts = AnalysisOptions::new(now());
        opts.horizon = Some("6 months".to_string());
        assert!(matches!(
            analyze(UserSummary::default(), &index, &playlists, &opts),
            Err(EngineError::InvalidHorizon(_))
        ));
    }

    #[test]
    fn unowned_playlists_only_feed_the_counters() {
        let (index, mut playlists) = fixture();
        playlists.push(playlist("p-them", "Collaborative mix", false));

        let report = analyze(
            UserSummary::default(),
            &index,
            &playlists,
            &AnalysisOptions::new(now()),
        )
        .unwrap();
        assert_eq!(report.total_playlists, 4);
        assert_eq!(report.playlists_analyzed, 3);
        assert_eq!(report.playlists_skipped_owner, 1);
    }
}
