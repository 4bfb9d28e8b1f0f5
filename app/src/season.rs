//! Season helpers for the seasonal browser.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use sugoi_client::models::{Anime, SeasonData};

/// Anime broadcast season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    /// January to March
    Winter,
    /// April to June
    Spring,
    /// July to September
    Summer,
    /// October to December
    Fall,
}

impl Season {
    /// Every season in calendar order
    pub const ALL: [Self; 4] = [Self::Winter, Self::Spring, Self::Summer, Self::Fall];

    /// Season containing `month` (1-12)
    #[must_use]
    pub const fn for_month(month: u32) -> Self {
        match month {
            1..=3 => Self::Winter,
            4..=6 => Self::Spring,
            7..=9 => Self::Summer,
            _ => Self::Fall,
        }
    }

    /// Season at `now`
    #[must_use]
    pub fn current(now: DateTime<Utc>) -> Self {
        Self::for_month(now.month())
    }

    /// Path segment the backend expects
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Fall => "fall",
        }
    }

    /// Capitalized name for display
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall => "Fall",
        }
    }

    /// Parse a season name, ignoring case
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|season| season.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Years offered by the season picker: next year down to `start`
#[must_use]
pub fn year_range(now: DateTime<Utc>, start: i32) -> Vec<i32> {
    (start..=now.year() + 1).rev().collect()
}

/// Tabs of the seasonal page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeasonGroup {
    /// TV series premiering this season
    TvNew,
    /// TV series carried over
    TvContinuing,
    /// Web releases
    Ona,
    /// Video releases
    Ova,
    /// Films
    Movie,
    /// Specials
    Special,
}

impl SeasonGroup {
    /// Every group in display order
    pub const ALL: [Self; 6] = [
        Self::TvNew,
        Self::TvContinuing,
        Self::Ona,
        Self::Ova,
        Self::Movie,
        Self::Special,
    ];

    /// Key of this group in the backend's season map
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::TvNew => "TV (New)",
            Self::TvContinuing => "TV (Continuing)",
            Self::Ona => "ONA",
            Self::Ova => "OVA",
            Self::Movie => "Movie",
            Self::Special => "Special",
        }
    }

    /// Whether an anime belongs to this group by its type fields
    #[must_use]
    pub fn matches(self, anime: &Anime) -> bool {
        let kind = anime.kind.as_deref();
        match self {
            Self::TvNew => kind == Some("TV") && anime.continuing == Some(false),
            Self::TvContinuing => kind == Some("TV") && anime.continuing == Some(true),
            Self::Ona => kind == Some("ONA"),
            Self::Ova => kind == Some("OVA"),
            Self::Movie => kind == Some("Movie"),
            Self::Special => kind == Some("Special"),
        }
    }

    /// Entries of this group
    ///
    /// Uses the backend's own grouping when it has a key for this group,
    /// otherwise filters every entry by type.
    #[must_use]
    pub fn select(self, data: &SeasonData) -> Vec<&Anime> {
        if let Some(list) = data.get(self.key()) {
            return list.iter().collect();
        }
        data.values().flatten().filter(|anime| self.matches(anime)).collect()
    }
}

impl fmt::Display for SeasonGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(year: i32, month: u32) -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(year, month, 15)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc())
            .unwrap_or_default()
    }

    #[test]
    fn test_for_month_boundaries() {
        assert_eq!(Season::for_month(1), Season::Winter);
        assert_eq!(Season::for_month(3), Season::Winter);
        assert_eq!(Season::for_month(4), Season::Spring);
        assert_eq!(Season::for_month(9), Season::Summer);
        assert_eq!(Season::for_month(10), Season::Fall);
        assert_eq!(Season::current(at(2025, 12)), Season::Fall);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(Season::parse("SUMMER"), Some(Season::Summer));
        assert_eq!(Season::parse("monsoon"), None);
        assert_eq!(Season::Fall.to_string(), "Fall");
    }

    #[test]
    fn test_year_range_includes_next_year() {
        let years = year_range(at(2025, 5), 2022);
        assert_eq!(years, vec![2026, 2025, 2024, 2023, 2022]);
    }

    #[test]
    fn test_group_select_prefers_backend_grouping() {
        let mut data = SeasonData::new();
        data.insert("TV (New)".to_string(), vec![Anime::new(1, "A").with_kind("TV")]);
        data.insert(
            "Other".to_string(),
            vec![
                Anime::new(2, "B").with_kind("Movie"),
                Anime::new(3, "C").with_kind("ONA"),
            ],
        );

        assert_eq!(SeasonGroup::TvNew.select(&data).len(), 1);
        assert_eq!(SeasonGroup::Movie.select(&data)[0].id, 2);
        assert!(SeasonGroup::Special.select(&data).is_empty());
    }

    #[test]
    fn test_tv_groups_split_on_continuing() {
        let mut fresh = Anime::new(1, "Fresh").with_kind("TV");
        fresh.continuing = Some(false);
        let mut carried = Anime::new(2, "Carried").with_kind("TV");
        carried.continuing = Some(true);

        assert!(SeasonGroup::TvNew.matches(&fresh));
        assert!(!SeasonGroup::TvNew.matches(&carried));
        assert!(SeasonGroup::TvContinuing.matches(&carried));
    }
}
