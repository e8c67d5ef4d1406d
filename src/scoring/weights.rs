use serde::Deserialize;

/// Every bonus band used by the scorers, as named overridable configuration.
/// Defaults are the calibrated production values; a `[weights]` table in the
/// config file can override any subset.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
    pub affinity: AffinityWeights,
    pub versatility: VersatilityWeights,
}

/// Affinity signal table. Signals are additive and independently capped —
/// never multiplicative — so a score stays explainable as a sum of named
/// contributions.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AffinityWeights {
    /// Playlist-count base: super-linear so cross-playlist repetition beats
    /// single-playlist volume.
    pub one_playlist: i64,
    pub two_playlists: i64,
    pub three_plus_playlists: i64,

    /// Flat bonus for any surviving membership in a favorites playlist.
    pub favorites: i64,
    /// Favorites membership plus at least one other playlist.
    pub cross_context: i64,

    /// Artist dedication bands (shared surviving tracks per artist).
    pub dedication_3: i64,
    pub dedication_6: i64,
    pub dedication_10: i64,
    pub dedication_15: i64,
    pub dedication_20: i64,

    /// Album depth bands (co-occurring surviving tracks from the album).
    pub album_depth_3: i64,
    pub album_depth_5: i64,

    /// Popularity cutoffs are absolute catalog scores, not library-relative.
    pub obscurity_deep: i64,
    pub obscurity_mild: i64,
    pub mainstream_penalty_mild: i64,
    pub mainstream_penalty_deep: i64,

    /// Latest surviving added-at within the window.
    pub recency_half_year: i64,
    pub recency_year: i64,

    /// Earliest add relative to release date.
    pub early_adopter_week: i64,
    pub early_adopter_month: i64,

    /// Surviving added-at span of 6+ months (sustained re-addition).
    pub evergreen: i64,
    pub evergreen_span_days: i64,

    /// Best single small-playlist bonus (deliberate curation signal).
    pub small_playlist_tight: i64,
    pub small_playlist_loose: i64,
    pub small_playlist_tight_max: usize,
    pub small_playlist_loose_max: usize,

    /// Per surviving membership in an active-rotation playlist.
    pub active_rotation_each: i64,
}

impl Default for AffinityWeights {
    fn default() -> Self {
        Self {
            one_playlist: 10,
            two_playlists: 20,
            three_plus_playlists: 35,
            favorites: 25,
            cross_context: 10,
            dedication_3: 2,
            dedication_6: 4,
            dedication_10: 6,
            dedication_15: 8,
            dedication_20: 10,
            album_depth_3: 8,
            album_depth_5: 15,
            obscurity_deep: 8,
            obscurity_mild: 4,
            mainstream_penalty_mild: 4,
            mainstream_penalty_deep: 8,
            recency_half_year: 10,
            recency_year: 5,
            early_adopter_week: 15,
            early_adopter_month: 8,
            evergreen: 15,
            evergreen_span_days: 180,
            small_playlist_tight: 12,
            small_playlist_loose: 6,
            small_playlist_tight_max: 30,
            small_playlist_loose_max: 50,
            active_rotation_each: 5,
        }
    }
}

/// Versatility signal table. Popularity carries the inverse sign from
/// affinity's treatment: crowd pleasers score up, not down.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct VersatilityWeights {
    pub per_playlist: i64,
    pub popularity_high: i64,
    pub popularity_mid: i64,
    /// Per distinct classification label among surviving memberships.
    pub per_context_label: i64,
}

impl Default for VersatilityWeights {
    fn default() -> Self {
        Self {
            per_playlist: 10,
            popularity_high: 10,
            popularity_mid: 5,
            per_context_label: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let weights: ScoreWeights = toml::from_str(
            r#"
            [affinity]
            favorites = 40
            [versatility]
            per_playlist = 3
            "#,
        )
        .unwrap();

        assert_eq!(weights.affinity.favorites, 40);
        assert_eq!(weights.affinity.cross_context, 10);
        assert_eq!(weights.versatility.per_playlist, 3);
        assert_eq!(weights.versatility.per_context_label, 5);
    }

    #[test]
    fn empty_table_is_all_defaults() {
        let weights: ScoreWeights = toml::from_str("").unwrap();
        assert_eq!(weights, ScoreWeights::default());
    }
}
