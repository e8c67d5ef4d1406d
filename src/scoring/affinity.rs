use chrono::{DateTime, NaiveDate, Utc};

use crate::classify::PlaylistClass;
use crate::library::{Membership, Track};
use crate::scoring::weights::AffinityWeights;
use crate::scoring::{
    ScoreContext, earliest_added, in_favorites, latest_added, max_artist_dedication,
};

/// Compute the affinity score for one surviving track.
///
/// The score is a sum of independent, individually capped signals evaluated
/// in a fixed order. Each signal is a named function below so it can be
/// tested in isolation; all magnitudes come from the `AffinityWeights` table.
pub fn affinity_score(track: &Track, surviving: &[&Membership], ctx: &ScoreContext) -> i64 {
    let w = &ctx.weights.affinity;
    let fav = in_favorites(surviving, ctx);
    let earliest = earliest_added(surviving);
    let latest = latest_added(surviving);

    let mut score = 0;
    score += playlist_count_signal(surviving.len(), w);
    score += favorites_signal(fav, w);
    score += cross_context_signal(fav, surviving.len(), w);
    score += artist_dedication_signal(max_artist_dedication(track, ctx), w);
    score += album_depth_signal(ctx.album_tracks(&track.meta.album.id), w);
    score += popularity_signal(track.meta.popularity, w);
    score += recency_signal(latest, ctx.now, w);
    score += early_adopter_signal(earliest, track.meta.release_date, w);
    score += evergreen_signal(earliest, latest, w);
    score += small_playlist_signal(surviving, ctx, w);
    score += active_rotation_signal(surviving, ctx, w);
    score
}

// ── Playlist count ────────────────────────────────────────────────────
// Super-linear base: genuine cross-playlist repetition outweighs volume
// inside a single playlist.
fn playlist_count_signal(count: usize, w: &AffinityWeights) -> i64 {
    match count {
        0 => 0,
        1 => w.one_playlist,
        2 => w.two_playlists,
        _ => w.three_plus_playlists,
    }
}

// ── Favorites membership ──────────────────────────────────────────────
fn favorites_signal(in_favorites: bool, w: &AffinityWeights) -> i64 {
    if in_favorites { w.favorites } else { 0 }
}

// ── Cross-context ─────────────────────────────────────────────────────
// In a favorites playlist AND at least one other playlist: a deliberate
// favorite, not a single-context keepsake.
fn cross_context_signal(in_favorites: bool, count: usize, w: &AffinityWeights) -> i64 {
    if in_favorites && count >= 2 { w.cross_context } else { 0 }
}

// ── Artist dedication ─────────────────────────────────────────────────
// Banded on the highest shared-track count across the track's artists.
fn artist_dedication_signal(shared_tracks: usize, w: &AffinityWeights) -> i64 {
    match shared_tracks {
        n if n >= 20 => w.dedication_20,
        n if n >= 15 => w.dedication_15,
        n if n >= 10 => w.dedication_10,
        n if n >= 6 => w.dedication_6,
        n if n >= 3 => w.dedication_3,
        _ => 0,
    }
}

// ── Album depth ───────────────────────────────────────────────────────
fn album_depth_signal(album_tracks: usize, w: &AffinityWeights) -> i64 {
    match album_tracks {
        n if n >= 5 => w.album_depth_5,
        n if n >= 3 => w.album_depth_3,
        _ => 0,
    }
}

// ── Obscurity bonus / mainstream penalty ──────────────────────────────
// Low catalog popularity is a stronger personal-taste signal; chart hits
// say little about the curator. Cutoffs are absolute, not library-relative.
fn popularity_signal(popularity: Option<u8>, w: &AffinityWeights) -> i64 {
    match popularity {
        Some(p) if p < 30 => w.obscurity_deep,
        Some(p) if p < 50 => w.obscurity_mild,
        Some(p) if p >= 85 => -w.mainstream_penalty_deep,
        Some(p) if p >= 75 => -w.mainstream_penalty_mild,
        _ => 0,
    }
}

// ── Recency ───────────────────────────────────────────────────────────
fn recency_signal(latest: Option<DateTime<Utc>>, now: DateTime<Utc>, w: &AffinityWeights) -> i64 {
    let Some(latest) = latest else { return 0 };
    let days = (now - latest).num_days();
    if days < 180 {
        w.recency_half_year
    } else if days < 365 {
        w.recency_year
    } else {
        0
    }
}

// ── Early adopter ─────────────────────────────────────────────────────
// Added within days of release means the user sought the track out rather
// than meeting it on a chart later.
fn early_adopter_signal(
    earliest: Option<DateTime<Utc>>,
    release_date: Option<NaiveDate>,
    w: &AffinityWeights,
) -> i64 {
    let (Some(earliest), Some(release)) = (earliest, release_date) else {
        return 0;
    };
    let days = (earliest.date_naive() - release).num_days();
    if (0..7).contains(&days) {
        w.early_adopter_week
    } else if (7..30).contains(&days) {
        w.early_adopter_month
    } else {
        0
    }
}

// ── Evergreen ─────────────────────────────────────────────────────────
// Added-at span over 6 months: the track keeps getting re-added instead of
// arriving in one bulk import.
fn evergreen_signal(
    earliest: Option<DateTime<Utc>>,
    latest: Option<DateTime<Utc>>,
    w: &AffinityWeights,
) -> i64 {
    let (Some(earliest), Some(latest)) = (earliest, latest) else {
        return 0;
    };
    if (latest - earliest).num_days() >= w.evergreen_span_days {
        w.evergreen
    } else {
        0
    }
}

// ── Small playlist ────────────────────────────────────────────────────
// Membership in a short, hand-curated playlist. Best single band applies,
// not one bonus per playlist.
fn small_playlist_signal(surviving: &[&Membership], ctx: &ScoreContext, w: &AffinityWeights) -> i64 {
    let smallest = surviving
        .iter()
        .filter_map(|m| ctx.playlist_size(&m.playlist_id))
        .min();
    match smallest {
        Some(n) if n < w.small_playlist_tight_max => w.small_playlist_tight,
        Some(n) if n < w.small_playlist_loose_max => w.small_playlist_loose,
        _ => 0,
    }
}

// ── Active rotation ───────────────────────────────────────────────────
fn active_rotation_signal(
    surviving: &[&Membership],
    ctx: &ScoreContext,
    w: &AffinityWeights,
) -> i64 {
    let active = surviving
        .iter()
        .filter(|m| ctx.class_of(&m.playlist_id) == PlaylistClass::Active)
        .count() as i64;
    active * w.active_rotation_each
}
