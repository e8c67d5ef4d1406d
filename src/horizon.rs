use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::engine::EngineError;
use crate::library::{Membership, Track, TrackIndex};

// Number + unit, e.g. "1y", "6m", "30d".
static HORIZON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)([ymd])$").unwrap());

/// Parse a horizon duration string ("1y", "6m", "30d") into a cutoff
/// timestamp relative to `now`. Months are 30 days, years 365, matching the
/// catalog's own coarse duration conventions.
///
/// Fails fast with a descriptive error so a bad horizon never reaches the
/// scoring pass. Horizons too large for the timestamp arithmetic are invalid,
/// not a panic.
pub fn parse_horizon(spec: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, EngineError> {
    let invalid = || EngineError::InvalidHorizon(spec.to_string());
    let normalized = spec.trim().to_lowercase();
    let caps = HORIZON_RE.captures(&normalized).ok_or_else(invalid)?;

    let value: i64 = caps[1].parse().map_err(|_| invalid())?;
    let days = match &caps[2] {
        "y" => value.checked_mul(365),
        "m" => value.checked_mul(30),
        "d" => Some(value),
        _ => unreachable!("regex restricts the unit"),
    }
    .ok_or_else(invalid)?;

    let duration = Duration::try_days(days).ok_or_else(invalid)?;
    now.checked_sub_signed(duration).ok_or_else(invalid)
}

/// Read-only view of the index with horizon filtering applied.
///
/// Exclusion is view-level: the underlying index is untouched, so the same
/// populated index can back multiple views with different horizons. Tracks
/// whose memberships are all excluded keep an empty entry here and simply
/// drop out of ranked output.
pub struct LibraryView<'a> {
    index: &'a TrackIndex,
    surviving: HashMap<&'a str, Vec<&'a Membership>>,
    /// Memberships excluded because added-at predates the cutoff.
    pub horizon_filtered: usize,
    /// Memberships excluded because added-at is absent while a horizon is set.
    pub missing_added_at: usize,
}

impl<'a> LibraryView<'a> {
    pub fn build(index: &'a TrackIndex, cutoff: Option<DateTime<Utc>>) -> Self {
        let mut surviving: HashMap<&str, Vec<&Membership>> = HashMap::new();
        let mut horizon_filtered = 0;
        let mut missing_added_at = 0;

        for track in index.unique_tracks() {
            let mut kept = Vec::new();
            for m in track.memberships() {
                match (cutoff, m.added_at) {
                    (Some(_), None) => missing_added_at += 1,
                    (Some(cut), Some(added)) if added < cut => horizon_filtered += 1,
                    _ => kept.push(m),
                }
            }
            surviving.insert(track.meta.id.as_str(), kept);
        }

        Self {
            index,
            surviving,
            horizon_filtered,
            missing_added_at,
        }
    }

    /// Surviving memberships for a track (empty when fully filtered out).
    pub fn surviving(&self, track_id: &str) -> &[&'a Membership] {
        self.surviving
            .get(track_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Tracks with at least one surviving membership, in first-seen order.
    pub fn surviving_tracks(&self) -> impl Iterator<Item = (&'a Track, &[&'a Membership])> {
        self.index.unique_tracks().filter_map(|track| {
            let kept = self.surviving(&track.meta.id);
            if kept.is_empty() { None } else { Some((track, kept)) }
        })
    }
}
