use std::collections::BTreeSet;

use crate::library::{Membership, Track};
use crate::scoring::ScoreContext;
use crate::scoring::weights::VersatilityWeights;

/// Compute the versatility score for one surviving track.
///
/// Fully decoupled from affinity: rewards broad playlist presence, mainstream
/// popularity, and spread across classification labels. A crowd pleaser can
/// score high here while scoring low on affinity, and vice versa.
pub fn versatility_score(track: &Track, surviving: &[&Membership], ctx: &ScoreContext) -> i64 {
    let w = &ctx.weights.versatility;
    playlist_presence_signal(surviving.len(), w)
        + popularity_signal(track.meta.popularity, w)
        + context_diversity_signal(surviving, ctx, w)
}

// ── Playlist presence ─────────────────────────────────────────────────
// Linear in raw surviving playlist count; no favorites-specific bonus.
fn playlist_presence_signal(count: usize, w: &VersatilityWeights) -> i64 {
    count as i64 * w.per_playlist
}

// ── Popularity ────────────────────────────────────────────────────────
// Inverse sign from affinity: mainstream appeal is the point here.
fn popularity_signal(popularity: Option<u8>, w: &VersatilityWeights) -> i64 {
    match popularity {
        Some(p) if p >= 60 => w.popularity_high,
        Some(p) if p >= 40 => w.popularity_mid,
        _ => 0,
    }
}

// ── Context diversity ─────────────────────────────────────────────────
// Distinct classification labels the track appears under. Spanning
// favorites + active + archive beats clustering in one label. Only kicks in
// once the track shows up in 2+ playlists.
fn context_diversity_signal(
    surviving: &[&Membership],
    ctx: &ScoreContext,
    w: &VersatilityWeights,
) -> i64 {
    if surviving.len() < 2 {
        return 0;
    }
    let labels: BTreeSet<_> = surviving
        .iter()
        .map(|m| ctx.class_of(&m.playlist_id))
        .collect();
    labels.len() as i64 * w.per_context_label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w() -> VersatilityWeights {
        VersatilityWeights::default()
    }

    #[test]
    fn presence_is_linear() {
        assert_eq!(playlist_presence_signal(1, &w()), 10);
        assert_eq!(playlist_presence_signal(4, &w()), 40);
    }

    #[test]
    fn popularity_rewards_mainstream() {
        assert_eq!(popularity_signal(Some(90), &w()), 10);
        assert_eq!(popularity_signal(Some(60), &w()), 10);
        assert_eq!(popularity_signal(Some(45), &w()), 5);
        assert_eq!(popularity_signal(Some(20), &w()), 0);
        assert_eq!(popularity_signal(None, &w()), 0);
    }
}
