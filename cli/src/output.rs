//! Plain-text rendering of store state.

use std::fmt::Write as _;

use sugoi_app::validation::FieldErrors;
use sugoi_client::{Anime, AnimeDetails, SeasonData, WatchlistItem};

/// One line per anime: `id  score  title`
pub fn anime_list(items: &[Anime]) -> String {
    let mut out = String::new();
    for anime in items {
        let score = anime.score.map_or_else(|| "  - ".to_string(), |s| format!("{s:4.2}"));
        let _ = writeln!(out, "{:>6}  {score}  {}", anime.id, anime.title);
    }
    out
}

/// Season map grouped under headings
pub fn season(data: &SeasonData) -> String {
    let mut out = String::new();
    for (group, items) in data.iter().filter(|(_, items)| !items.is_empty()) {
        let _ = writeln!(out, "{group} ({})", items.len());
        out.push_str(&anime_list(items));
    }
    out
}

/// Detail page
pub fn details(details: &AnimeDetails) -> String {
    let anime = &details.anime;
    let mut out = format!("{} [{}]\n", anime.title, anime.id);
    if let Some(english) = &details.english_title {
        let _ = writeln!(out, "English: {english}");
    }
    let fields = [
        ("Type", anime.kind.clone()),
        ("Status", anime.status.clone()),
        ("Episodes", anime.episodes.map(|e| e.to_string())),
        ("Score", anime.score.map(|s| format!("{s:.2}"))),
        ("Aired", details.aired.clone()),
        ("Rating", details.rating.clone()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            let _ = writeln!(out, "{label}: {value}");
        }
    }
    if !anime.genres.is_empty() {
        let _ = writeln!(out, "Genres: {}", anime.genres.join(", "));
    }
    if !details.studios.is_empty() {
        let studios: Vec<&str> = details.studios.keys().map(String::as_str).collect();
        let _ = writeln!(out, "Studios: {}", studios.join(", "));
    }
    if let Some(synopsis) = &anime.synopsis {
        let _ = write!(out, "\n{synopsis}\n");
    }
    out
}

/// Watchlist entries
pub fn watchlist(items: &[WatchlistItem]) -> String {
    let mut out = String::new();
    for item in items {
        let title = item.title.as_deref().unwrap_or("(untitled)");
        let status = item.status.as_deref().unwrap_or("-");
        let _ = writeln!(out, "{:>6}  {status:<12}  {title}", item.anime_id);
    }
    out
}

/// `field: message` lines
pub fn field_errors(errors: &FieldErrors) -> String {
    let mut out = String::new();
    for (field, message) in errors {
        let _ = writeln!(out, "  {field}: {message}");
    }
    out
}
