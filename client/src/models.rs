//! Wire types for the anime API
//!
//! Every list endpoint answers `{ data: [...], meta: { page, limit, totalPages,
//! totalResults } }`, every single-resource endpoint `{ data: ... }`.
//! Fields the client does not interpret are kept in `extra` so nothing the
//! backend sends is lost on a round trip through state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend anime identifier
pub type AnimeId = u64;

/// `{ data }` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Payload
    pub data: T,
}

/// `{ data? }` envelope for endpoints whose payload is optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionalEnvelope<T> {
    /// Payload, absent on some backends
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// `{ data, meta }` envelope of list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// One page of items
    pub data: Vec<T>,
    /// Paging metadata; absent on a few list endpoints
    #[serde(default = "Option::default")]
    pub meta: Option<PageMeta>,
}

/// Paging metadata as sent by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMeta {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Number of pages
    pub total_pages: u32,
    /// Number of items across all pages
    pub total_results: u32,
}

/// Weekly broadcast slot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Broadcast {
    /// Day name, e.g. `"Mondays"` or `"Monday"`
    pub day: Option<String>,
    /// Local time, e.g. `"23:00"`
    pub time: Option<String>,
}

/// Anime summary as shown in lists and grids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anime {
    /// Identifier
    pub id: AnimeId,
    /// Display title
    pub title: String,
    /// Cover image
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    /// `TV`, `Movie`, `OVA`, `ONA`, `Special`...
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Average score out of 10
    #[serde(default)]
    pub score: Option<f64>,
    /// Airing status
    #[serde(default)]
    pub status: Option<String>,
    /// Episode count, unknown while airing
    #[serde(default)]
    pub episodes: Option<u32>,
    /// Synopsis
    #[serde(default)]
    pub synopsis: Option<String>,
    /// Genre names
    #[serde(default)]
    pub genres: Vec<String>,
    /// Broadcast slot (schedule endpoint)
    #[serde(default)]
    pub broadcast: Option<Broadcast>,
    /// Carried over from a previous season (season endpoints)
    #[serde(default)]
    pub continuing: Option<bool>,
    /// Everything else the backend sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Anime {
    /// Minimal anime, used by fixtures and the CLI
    #[must_use]
    pub fn new(id: AnimeId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: None,
            kind: None,
            score: None,
            status: None,
            episodes: None,
            synopsis: None,
            genres: Vec::new(),
            broadcast: None,
            continuing: None,
            extra: Map::new(),
        }
    }

    /// Set the media type
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the broadcast day
    #[must_use]
    pub fn with_broadcast_day(mut self, day: impl Into<String>) -> Self {
        self.broadcast = Some(Broadcast {
            day: Some(day.into()),
            time: None,
        });
        self
    }

    /// Broadcast day, if the backend sent one
    #[must_use]
    pub fn broadcast_day(&self) -> Option<&str> {
        self.broadcast.as_ref()?.day.as_deref()
    }
}

/// Full anime record from `/anime/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeDetails {
    /// Summary fields
    #[serde(flatten)]
    pub anime: Anime,
    /// English title
    #[serde(default)]
    pub english_title: Option<String>,
    /// Studio name → studio info
    #[serde(default)]
    pub studios: BTreeMap<String, Value>,
    /// Age rating
    #[serde(default)]
    pub rating: Option<String>,
    /// Episode duration
    #[serde(default)]
    pub duration: Option<String>,
    /// Airing period
    #[serde(default)]
    pub aired: Option<String>,
    /// Theme tags
    #[serde(default)]
    pub themes: Vec<String>,
    /// Trailer link
    #[serde(default)]
    pub trailer_url_youtube: Option<String>,
}

impl From<Anime> for AnimeDetails {
    fn from(anime: Anime) -> Self {
        Self {
            anime,
            english_title: None,
            studios: BTreeMap::new(),
            rating: None,
            duration: None,
            aired: None,
            themes: Vec::new(),
            trailer_url_youtube: None,
        }
    }
}

/// Seasonal listing: group name (`"TV (New)"`, `"ONA"`...) → anime
pub type SeasonData = BTreeMap<String, Vec<Anime>>;

/// Weekly schedule in either shape the backend uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schedule {
    /// Day name → anime
    ByDay(BTreeMap<String, Vec<Anime>>),
    /// Flat list keyed by each entry's `broadcast.day`
    Flat(Vec<Anime>),
}

impl Default for Schedule {
    fn default() -> Self {
        Self::Flat(Vec::new())
    }
}

/// Week days as the schedule page names them
pub const WEEK_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Schedule tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDay<'a> {
    /// Every entry
    All,
    /// A named day
    Day(&'a str),
    /// Entries whose broadcast day is not a week day
    Other,
    /// Entries without a broadcast day
    Unknown,
}

impl Schedule {
    /// Entries for one tab
    #[must_use]
    pub fn for_day(&self, day: ScheduleDay<'_>) -> Vec<&Anime> {
        match self {
            Self::ByDay(days) => match day {
                ScheduleDay::All => days.values().flatten().collect(),
                ScheduleDay::Day(name) => days.get(name).map(|list| list.iter().collect()).unwrap_or_default(),
                ScheduleDay::Other => days.get("Other").map(|list| list.iter().collect()).unwrap_or_default(),
                ScheduleDay::Unknown => days.get("Unknown").map(|list| list.iter().collect()).unwrap_or_default(),
            },
            Self::Flat(list) => list.iter().filter(|anime| Self::matches(anime, day)).collect(),
        }
    }

    /// Number of entries for one tab
    #[must_use]
    pub fn count_for_day(&self, day: ScheduleDay<'_>) -> usize {
        self.for_day(day).len()
    }

    fn matches(anime: &Anime, day: ScheduleDay<'_>) -> bool {
        let broadcast = anime.broadcast_day().map(str::to_lowercase);
        match (day, broadcast) {
            (ScheduleDay::All, _) => true,
            (ScheduleDay::Unknown, broadcast) => broadcast.is_none(),
            (ScheduleDay::Other, Some(b)) => !WEEK_DAYS.iter().any(|d| d.to_lowercase() == b),
            (ScheduleDay::Day(name), Some(b)) => name.to_lowercase() == b,
            (ScheduleDay::Other | ScheduleDay::Day(_), None) => false,
        }
    }
}

/// Catalog listings served under `/anime/<path>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CatalogCategory {
    /// `/anime/top`
    Top,
    /// `/anime/top-airing`
    TopAiring,
    /// `/anime/top-upcoming`
    TopUpcoming,
    /// `/anime/top-tv`
    TopTv,
    /// `/anime/top-movies`
    TopMovies,
    /// `/anime/top-ova`
    TopOva,
    /// `/anime/top-ona`
    TopOna,
    /// `/anime/top-special`
    TopSpecial,
    /// `/anime/most-popular`
    MostPopular,
    /// `/anime/most-favorited`
    MostFavorited,
}

impl CatalogCategory {
    /// Every catalog, in display order
    pub const ALL: [Self; 10] = [
        Self::Top,
        Self::TopAiring,
        Self::TopUpcoming,
        Self::TopTv,
        Self::TopMovies,
        Self::TopOva,
        Self::TopOna,
        Self::TopSpecial,
        Self::MostPopular,
        Self::MostFavorited,
    ];

    /// Path segment under `/anime`
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::TopAiring => "top-airing",
            Self::TopUpcoming => "top-upcoming",
            Self::TopTv => "top-tv",
            Self::TopMovies => "top-movies",
            Self::TopOva => "top-ova",
            Self::TopOna => "top-ona",
            Self::TopSpecial => "top-special",
            Self::MostPopular => "most-popular",
            Self::MostFavorited => "most-favorited",
        }
    }

    /// Parse a path segment
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.path() == path)
    }

    /// Map a view-all page slug to its catalog
    #[must_use]
    pub fn from_view_all(slug: &str) -> Option<Self> {
        match slug {
            "airing" => Some(Self::TopAiring),
            "upcoming" => Some(Self::TopUpcoming),
            "popular" => Some(Self::MostPopular),
            "top-rated" => Some(Self::Top),
            "movies" => Some(Self::TopMovies),
            _ => None,
        }
    }
}

impl fmt::Display for CatalogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Search filters
///
/// Unset filters are `None`/empty, never missing, so resetting is a total
/// overwrite with [`SearchFilters::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Media type
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Minimum score
    pub score: Option<f64>,
    /// Airing status
    pub status: Option<String>,
    /// Genres, all required
    pub genre: Vec<String>,
    /// Target demographic
    pub demographic: Option<String>,
    /// Include adult titles
    pub adult: bool,
    /// Aired on or after (`YYYY-MM-DD`)
    pub start_date: Option<String>,
    /// Aired on or before (`YYYY-MM-DD`)
    pub end_date: Option<String>,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            kind: None,
            score: None,
            status: None,
            genre: Vec::new(),
            demographic: None,
            adult: true,
            start_date: None,
            end_date: None,
        }
    }
}

/// Change to a single filter field
#[derive(Debug, Clone, PartialEq)]
pub enum FilterUpdate {
    /// Media type
    Kind(Option<String>),
    /// Minimum score
    Score(Option<f64>),
    /// Airing status
    Status(Option<String>),
    /// Genres
    Genre(Vec<String>),
    /// Demographic
    Demographic(Option<String>),
    /// Adult titles
    Adult(bool),
    /// Start date
    StartDate(Option<String>),
    /// End date
    EndDate(Option<String>),
}

impl SearchFilters {
    /// Apply a single-field update
    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Kind(v) => self.kind = v,
            FilterUpdate::Score(v) => self.score = v,
            FilterUpdate::Status(v) => self.status = v,
            FilterUpdate::Genre(v) => self.genre = v,
            FilterUpdate::Demographic(v) => self.demographic = v,
            FilterUpdate::Adult(v) => self.adult = v,
            FilterUpdate::StartDate(v) => self.start_date = v,
            FilterUpdate::EndDate(v) => self.end_date = v,
        }
    }

    /// Copy every set field of `issued` over `self`
    pub fn merge_set(&mut self, issued: &Self) {
        if issued.kind.is_some() {
            self.kind.clone_from(&issued.kind);
        }
        if issued.score.is_some() {
            self.score = issued.score;
        }
        if issued.status.is_some() {
            self.status.clone_from(&issued.status);
        }
        if !issued.genre.is_empty() {
            self.genre.clone_from(&issued.genre);
        }
        if issued.demographic.is_some() {
            self.demographic.clone_from(&issued.demographic);
        }
        self.adult = issued.adult;
        if issued.start_date.is_some() {
            self.start_date.clone_from(&issued.start_date);
        }
        if issued.end_date.is_some() {
            self.end_date.clone_from(&issued.end_date);
        }
    }

    /// Query-string pairs for the set filters only
    ///
    /// `adult` is always sent; genres are comma-joined.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);

        if let Some(kind) = non_empty(&self.kind) {
            pairs.push(("type", kind));
        }
        if let Some(score) = self.score.filter(|s| *s > 0.0) {
            pairs.push(("score", score.to_string()));
        }
        if let Some(status) = non_empty(&self.status) {
            pairs.push(("status", status));
        }
        if let Some(demographic) = non_empty(&self.demographic) {
            pairs.push(("demographic", demographic));
        }
        pairs.push(("adult", self.adult.to_string()));
        if let Some(start) = non_empty(&self.start_date) {
            pairs.push(("startDate", start));
        }
        if let Some(end) = non_empty(&self.end_date) {
            pairs.push(("endDate", end));
        }
        if !self.genre.is_empty() {
            pairs.push(("genre", self.genre.join(",")));
        }
        pairs
    }
}

/// Login form body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Registration form body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Email verification body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyEmailRequest {
    /// Address being verified
    pub email: String,
    /// Six-digit code
    pub otp: String,
}

/// Password change body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdate {
    /// Current password
    pub current_password: String,
    /// New password
    pub new_password: String,
}

/// Profile change body
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend identifier
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Premium subscription
    #[serde(default)]
    pub is_premium: bool,
    /// Everything else the backend sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Minimal profile, used by fixtures
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            is_premium: false,
            extra: Map::new(),
        }
    }
}

/// `data` of a successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginData {
    /// Bearer token
    pub token: String,
    /// Profile of the signed-in user
    #[serde(rename = "data")]
    pub user: UserProfile,
}

/// `data` of a successful resend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendData {
    /// Resends left in the current window
    pub attempts_left: u32,
    /// Seconds until the next resend is allowed
    pub next_resend_available_in: u64,
}

/// `data` of a successful password reset
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResetPasswordData {
    /// Fresh bearer token, when the backend signs the user in
    #[serde(default)]
    pub token: Option<String>,
}

/// Bodies that only carry a human message
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ack {
    /// Human message
    #[serde(default)]
    pub message: Option<String>,
}

/// Watchlist entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    /// Anime this entry tracks
    pub anime_id: AnimeId,
    /// Title snapshot
    #[serde(default)]
    pub title: Option<String>,
    /// Cover snapshot
    #[serde(default)]
    pub image_url: Option<String>,
    /// `watching`, `completed`, `plan_to_watch`...
    #[serde(default)]
    pub status: Option<String>,
    /// Everything else the backend sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WatchlistItem {
    /// Entry with only an id and status
    #[must_use]
    pub fn new(anime_id: AnimeId, status: impl Into<String>) -> Self {
        Self {
            anime_id,
            title: None,
            image_url: None,
            status: Some(status.into()),
            extra: Map::new(),
        }
    }
}

/// Watchlist entry change
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistUpdate {
    /// New status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Episodes watched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes_watched: Option<u32>,
    /// Personal score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Watch-history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Anime watched
    pub anime_id: AnimeId,
    /// Episode watched
    #[serde(default)]
    pub episode: Option<u32>,
    /// When it was watched
    #[serde(default)]
    pub watched_at: Option<String>,
    /// Everything else the backend sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
