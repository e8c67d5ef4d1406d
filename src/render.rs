use crate::report::{AlbumEntry, ArtistEntry, Report, TrackEntry};

/// Rows shown per table on the terminal; the JSON export carries the full
/// ranked lists.
const DISPLAY_ROWS: usize = 15;

/// Print the full analysis report as fixed-width tables.
pub fn print_report(report: &Report) {
    println!();
    println!("Library analysis for {}", report.user.display_name);
    println!("{}", "=".repeat(60));
    println!(
        "Playlists: {} analyzed, {} skipped (not owned) | Unique tracks: {}",
        report.playlists_analyzed, report.playlists_skipped_owner, report.total_unique_tracks
    );
    if let Some(cutoff) = report.horizon_cutoff {
        println!(
            "Horizon: tracks added since {} ({} filtered out, {} missing add dates)",
            cutoff.format("%Y-%m-%d"),
            report.tracks_filtered,
            report.tracks_missing_added_at
        );
    }
    println!();

    print_classification(report);

    if !report.likely_favorites.is_empty() {
        println!("Likely favorites (by affinity):");
        println!();
        print_track_table(&report.likely_favorites, "Affinity", |t| t.affinity_score);
        println!();
    }

    if !report.versatile_tracks.is_empty() {
        println!("Most versatile tracks:");
        println!();
        print_track_table(&report.versatile_tracks, "Versat", |t| t.versatility_score);
        println!();
    }

    let repeats: Vec<&TrackEntry> = report
        .all_tracks
        .iter()
        .filter(|e| e.track.playlist_count > 1)
        .collect();
    if !repeats.is_empty() {
        print_frequency_table(&repeats);
        println!();
    }

    if !report.favorite_albums.is_empty() {
        print_album_table(&report.favorite_albums);
        println!();
    }

    if !report.top_artists.is_empty() {
        print_artist_table(&report.top_artists);
        println!();
    }

    if report.metadata_conflicts > 0 {
        println!(
            "Note: {} tracks had conflicting metadata across playlists (last seen wins).",
            report.metadata_conflicts
        );
    }
}

fn print_classification(report: &Report) {
    let c = &report.playlist_classification;
    println!(
        "Playlist classification: {} favorites, {} active, {} archive",
        c.favorites.len(),
        c.active.len(),
        c.archive.len()
    );
    if !c.favorites.is_empty() {
        println!("  Favorites: {}", c.favorites.join(", "));
    }
    println!();
}

fn print_track_table(
    entries: &[TrackEntry],
    score_label: &str,
    score: fn(&crate::report::ScoredTrack) -> i64,
) {
    println!(
        "{:>3} {:<30} {:<20} {:>8} {:>6} {:>4}  {}",
        "#", "Song", "Artist", score_label, "Lists", "Pop", "Contexts"
    );
    println!("{}", "-".repeat(90));

    for entry in entries.iter().take(DISPLAY_ROWS) {
        let t = &entry.track;
        let artist = t.artists.first().map(String::as_str).unwrap_or("?");
        let pop = t.popularity.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        let fav = if t.in_favorites_playlist { " *" } else { "" };
        println!(
            "{:>3} {:<30} {:<20} {:>8} {:>6} {:>4}  {}{}",
            entry.rank,
            truncate(&t.name, 30),
            truncate(artist, 20),
            score(t),
            t.playlist_count,
            pop,
            t.context_labels.join("/"),
            fav,
        );
    }

    if entries.iter().any(|e| e.track.in_favorites_playlist) {
        println!();
        println!("* = appears in a favorites playlist");
    }
    if entries.len() > DISPLAY_ROWS {
        println!("({} more in JSON export)", entries.len() - DISPLAY_ROWS);
    }
}

fn print_frequency_table(entries: &[&TrackEntry]) {
    println!("Tracks appearing in the most playlists:");
    println!();
    println!("{:>3} {:<30} {:<20} {:>6}  {}", "#", "Song", "Artist", "Lists", "Playlists");
    println!("{}", "-".repeat(90));

    for entry in entries.iter().take(DISPLAY_ROWS) {
        let t = &entry.track;
        let artist = t.artists.first().map(String::as_str).unwrap_or("?");
        println!(
            "{:>3} {:<30} {:<20} {:>6}  {}",
            entry.rank,
            truncate(&t.name, 30),
            truncate(artist, 20),
            t.playlist_count,
            truncate(&t.playlists.join(", "), 40),
        );
    }
}

fn print_album_table(albums: &[AlbumEntry]) {
    println!("Albums you keep coming back to:");
    println!();
    println!(
        "{:>3} {:<30} {:<20} {:>6} {:>6} {:>6}",
        "#", "Album", "Artist", "Tracks", "Plays", "Compl"
    );
    println!("{}", "-".repeat(78));

    for a in albums.iter().take(DISPLAY_ROWS) {
        let completion = a
            .completion_ratio
            .map(|r| format!("{:.0}%", r * 100.0))
            .unwrap_or_else(|| "-".into());
        let marker = if a.is_likely_favorite { " *" } else { "" };
        println!(
            "{:>3} {:<30} {:<20} {:>6} {:>6} {:>6}{}",
            a.rank,
            truncate(&a.name, 30),
            truncate(&a.artist, 20),
            a.track_count,
            a.total_appearances,
            completion,
            marker,
        );
    }
    println!();
    println!("* = likely favorite album");
}

fn print_artist_table(artists: &[ArtistEntry]) {
    println!("Top artists:");
    println!();
    println!(
        "{:>3} {:<25} {:<10} {:>7} {:>6}",
        "#", "Artist", "Level", "Tracks", "Plays"
    );
    println!("{}", "-".repeat(56));

    for a in artists.iter().take(DISPLAY_ROWS) {
        println!(
            "{:>3} {:<25} {:<10} {:>7} {:>6}",
            a.rank,
            truncate(&a.name, 25),
            a.fan_level,
            a.unique_tracks,
            a.total_appearances,
        );
    }
}

/// Truncate long names for table columns, char-safe.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long track title here", 10), "a very ...");
        // Multibyte names must not split inside a char.
        assert_eq!(truncate("日本語のタイトルすごく長い曲名です", 10), "日本語のタイト...");
    }
}
