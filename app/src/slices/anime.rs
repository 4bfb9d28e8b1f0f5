//! Anime catalog slice.
//!
//! Ten catalog listings, the current and a selected season, the weekly
//! schedule, one detail page and the paginated view-all grid.
//!
//! # View-all paging
//!
//! The view-all grid fetches page 1 with `is_loading` and every later page
//! with `is_loading_more`. [`AnimeAction::LoadMoreViewAll`] is a no-op unless
//! [`Pagination::can_load_more`] holds. A 404 answering page > 1 ends the
//! stream without an error.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use sugoi_client::{
    classify, Anime, AnimeDetails, AnimeId, ApiError, CatalogCategory, Paginated, Schedule,
    SeasonData, SugoiApi,
};
use sugoi_core::effect::Effect;
use sugoi_core::reducer::Reducer;
use sugoi_core::{smallvec, SmallVec};

use crate::config::AppConfig;
use crate::environment::AppEnvironment;
use crate::pagination::{PagedList, Pagination};
use crate::request::{LoadMode, RequestState, RequestToken};
use crate::season::Season;

/// Message for a failed catalog fetch without a server message
#[must_use]
pub const fn catalog_fallback(category: CatalogCategory) -> &'static str {
    match category {
        CatalogCategory::Top => "Failed to fetch top anime",
        CatalogCategory::TopAiring => "Failed to fetch top airing anime",
        CatalogCategory::TopUpcoming => "Failed to fetch top upcoming anime",
        CatalogCategory::TopTv => "Failed to fetch top TV anime",
        CatalogCategory::TopMovies => "Failed to fetch top movies",
        CatalogCategory::TopOva => "Failed to fetch top OVA anime",
        CatalogCategory::TopOna => "Failed to fetch top ONA anime",
        CatalogCategory::TopSpecial => "Failed to fetch top special anime",
        CatalogCategory::MostPopular => "Failed to fetch most popular anime",
        CatalogCategory::MostFavorited => "Failed to fetch most favorited anime",
    }
}

/// Non-catalog request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimeRequest {
    /// Current season
    CurrentSeason,
    /// Selected season
    Season,
    /// Weekly schedule
    Schedule,
    /// Detail page
    Details,
}

impl AnimeRequest {
    /// Message shown when the backend sends none
    #[must_use]
    pub const fn fallback(self) -> &'static str {
        match self {
            Self::CurrentSeason => "Failed to fetch current season anime",
            Self::Season => "Failed to fetch season anime",
            Self::Schedule => "Failed to fetch anime schedule",
            Self::Details => "Failed to fetch anime details",
        }
    }
}

/// The view-all grid
#[derive(Debug, Clone, PartialEq)]
pub struct ViewAllState {
    /// Slug of the category shown (`airing`, `upcoming`, `popular`, `top-rated`, `movies`)
    pub category: Option<String>,
    /// Accumulated pages
    pub list: RequestState<PagedList<Anime>>,
    /// Paging counters
    pub pagination: Pagination,
}

impl Default for ViewAllState {
    fn default() -> Self {
        Self {
            category: None,
            list: RequestState::default(),
            pagination: Pagination::new(AppConfig::default().view_all_page_size),
        }
    }
}

/// Anime state
#[derive(Debug, Clone, PartialEq)]
pub struct AnimeState {
    /// One listing per catalog
    pub catalogs: BTreeMap<CatalogCategory, RequestState<Vec<Anime>>>,
    /// Counters of the last catalog fetched
    pub pagination: Pagination,
    /// Current season, grouped
    pub current_season: RequestState<SeasonData>,
    /// Season picked in the seasonal browser
    pub selected_season: Option<(i32, Season)>,
    /// Selected season, grouped
    pub season: RequestState<SeasonData>,
    /// Weekly schedule
    pub schedule: RequestState<Schedule>,
    /// Detail page
    pub details: RequestState<Option<AnimeDetails>>,
    /// View-all grid
    pub view_all: ViewAllState,
}

impl Default for AnimeState {
    fn default() -> Self {
        Self {
            catalogs: CatalogCategory::ALL
                .into_iter()
                .map(|category| (category, RequestState::default()))
                .collect(),
            pagination: Pagination::new(AppConfig::default().catalog_page_size),
            current_season: RequestState::default(),
            selected_season: None,
            season: RequestState::default(),
            schedule: RequestState::default(),
            details: RequestState::default(),
            view_all: ViewAllState::default(),
        }
    }
}

impl AnimeState {
    /// Items of one catalog
    #[must_use]
    pub fn catalog(&self, category: CatalogCategory) -> &[Anime] {
        self.catalogs
            .get(&category)
            .map(|request| request.data.as_slice())
            .unwrap_or_default()
    }

    /// Request state of one catalog
    #[must_use]
    pub fn catalog_request(&self, category: CatalogCategory) -> Option<&RequestState<Vec<Anime>>> {
        self.catalogs.get(&category)
    }

    fn catalog_mut(&mut self, category: CatalogCategory) -> &mut RequestState<Vec<Anime>> {
        self.catalogs.entry(category).or_default()
    }
}

/// Anime actions
#[derive(Debug, Clone, PartialEq)]
pub enum AnimeAction {
    /// Fetch one page of a catalog
    FetchCatalog {
        /// Catalog
        category: CatalogCategory,
        /// 1-based page
        page: u32,
    },
    /// Fetch the current season
    FetchCurrentSeason,
    /// Fetch a given season
    FetchSeason {
        /// Year
        year: i32,
        /// Season
        season: Season,
    },
    /// Fetch the weekly schedule
    FetchSchedule,
    /// Fetch one detail page
    FetchDetails {
        /// Anime
        id: AnimeId,
    },
    /// Fetch a page of the view-all grid
    FetchViewAll {
        /// View-all slug
        category: String,
        /// 1-based page
        page: u32,
    },
    /// Fetch the next view-all page if allowed
    LoadMoreViewAll,
    /// Clear the view-all grid
    ResetViewAll,
    /// Drop the detail page
    ClearDetails,
    /// Drop every error
    ClearError,

    /// Catalog page arrived
    CatalogLoaded {
        /// Catalog
        category: CatalogCategory,
        /// Request it answers
        token: RequestToken,
        /// Page requested
        page: u32,
        /// Items and counters
        result: Paginated<Anime>,
    },
    /// Catalog fetch failed
    CatalogFailed {
        /// Catalog
        category: CatalogCategory,
        /// Request that failed
        token: RequestToken,
        /// Cause
        error: ApiError,
    },
    /// Current season arrived
    CurrentSeasonLoaded {
        /// Request it answers
        token: RequestToken,
        /// Grouped anime
        data: SeasonData,
    },
    /// Selected season arrived
    SeasonLoaded {
        /// Request it answers
        token: RequestToken,
        /// Grouped anime
        data: SeasonData,
    },
    /// Schedule arrived
    ScheduleLoaded {
        /// Request it answers
        token: RequestToken,
        /// Schedule
        schedule: Schedule,
    },
    /// Detail page arrived
    DetailsLoaded {
        /// Request it answers
        token: RequestToken,
        /// Details
        details: Box<AnimeDetails>,
    },
    /// Season, schedule or detail fetch failed
    Failed {
        /// Request that failed
        token: RequestToken,
        /// What it was
        request: AnimeRequest,
        /// Cause
        error: ApiError,
    },
    /// View-all page arrived
    ViewAllLoaded {
        /// Request it answers
        token: RequestToken,
        /// Page requested
        page: u32,
        /// Items and counters
        result: Paginated<Anime>,
    },
    /// View-all fetch failed
    ViewAllFailed {
        /// Request that failed
        token: RequestToken,
        /// Page requested
        page: u32,
        /// Cause
        error: ApiError,
    },
}

/// Anime reducer
#[derive(Debug, Clone)]
pub struct AnimeReducer<Api> {
    _phantom: PhantomData<fn() -> Api>,
}

impl<Api> AnimeReducer<Api> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<Api> Default for AnimeReducer<Api> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Api: SugoiApi> AnimeReducer<Api> {
    fn fetch_view_all(
        state: &mut AnimeState,
        slug: String,
        page: u32,
        env: &AppEnvironment<Api>,
    ) -> SmallVec<[Effect<AnimeAction>; 4]> {
        let view_all = &mut state.view_all;

        if view_all.category.as_deref() != Some(slug.as_str()) {
            view_all.list.cancel();
            view_all.list.data.clear();
            view_all.pagination.reset();
            view_all.category = Some(slug.clone());
        }

        let token = view_all.list.begin(LoadMode::for_page(page));

        let Some(category) = CatalogCategory::from_view_all(&slug) else {
            view_all.list.fail(token, "Invalid category");
            return SmallVec::new();
        };

        let limit = env.config.view_all_page_size;
        view_all.pagination.limit = limit;
        let api = env.api.clone();
        smallvec![Effect::future(async move {
            Some(match api.catalog(category, page, limit).await {
                Ok(result) => AnimeAction::ViewAllLoaded { token, page, result },
                Err(error) => AnimeAction::ViewAllFailed { token, page, error },
            })
        })]
    }
}

impl<Api: SugoiApi> Reducer for AnimeReducer<Api> {
    type State = AnimeState;
    type Action = AnimeAction;
    type Environment = AppEnvironment<Api>;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Requests
            // ═══════════════════════════════════════════════════════════════
            AnimeAction::FetchCatalog { category, page } => {
                let token = state.catalog_mut(category).begin(LoadMode::Initial);
                let limit = env.config.catalog_page_size;
                state.pagination.limit = limit;
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.catalog(category, page, limit).await {
                        Ok(result) => AnimeAction::CatalogLoaded {
                            category,
                            token,
                            page,
                            result,
                        },
                        Err(error) => AnimeAction::CatalogFailed {
                            category,
                            token,
                            error,
                        },
                    })
                })]
            },

            AnimeAction::FetchCurrentSeason => {
                let token = state.current_season.begin(LoadMode::Initial);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.current_season().await {
                        Ok(data) => AnimeAction::CurrentSeasonLoaded { token, data },
                        Err(error) => AnimeAction::Failed {
                            token,
                            request: AnimeRequest::CurrentSeason,
                            error,
                        },
                    })
                })]
            },

            AnimeAction::FetchSeason { year, season } => {
                state.selected_season = Some((year, season));
                let token = state.season.begin(LoadMode::Initial);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.season(year, season.as_str()).await {
                        Ok(data) => AnimeAction::SeasonLoaded { token, data },
                        Err(error) => AnimeAction::Failed {
                            token,
                            request: AnimeRequest::Season,
                            error,
                        },
                    })
                })]
            },

            AnimeAction::FetchSchedule => {
                let token = state.schedule.begin(LoadMode::Initial);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.schedule().await {
                        Ok(schedule) => AnimeAction::ScheduleLoaded { token, schedule },
                        Err(error) => AnimeAction::Failed {
                            token,
                            request: AnimeRequest::Schedule,
                            error,
                        },
                    })
                })]
            },

            AnimeAction::FetchDetails { id } => {
                let token = state.details.begin(LoadMode::Initial);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.details(id).await {
                        Ok(details) => AnimeAction::DetailsLoaded {
                            token,
                            details: Box::new(details),
                        },
                        Err(error) => AnimeAction::Failed {
                            token,
                            request: AnimeRequest::Details,
                            error,
                        },
                    })
                })]
            },

            // ═══════════════════════════════════════════════════════════════
            // View-all grid
            // ═══════════════════════════════════════════════════════════════
            AnimeAction::FetchViewAll { category, page } => {
                Self::fetch_view_all(state, category, page, env)
            },

            AnimeAction::LoadMoreViewAll => {
                let view_all = &state.view_all;
                let Some(category) = view_all.category.clone() else {
                    return SmallVec::new();
                };
                if !view_all
                    .pagination
                    .can_load_more(view_all.list.is_loading, view_all.list.is_loading_more)
                {
                    tracing::debug!(
                        page = view_all.pagination.page,
                        total_pages = view_all.pagination.total_pages,
                        "View-all load more skipped"
                    );
                    return SmallVec::new();
                }
                let page = view_all.pagination.next_page();
                Self::fetch_view_all(state, category, page, env)
            },

            AnimeAction::ResetViewAll => {
                let view_all = &mut state.view_all;
                view_all.list.cancel();
                view_all.list.data.clear();
                view_all.pagination.reset();
                SmallVec::new()
            },

            AnimeAction::ClearDetails => {
                state.details.data = None;
                SmallVec::new()
            },

            AnimeAction::ClearError => {
                for request in state.catalogs.values_mut() {
                    request.clear_error();
                }
                state.current_season.clear_error();
                state.season.clear_error();
                state.schedule.clear_error();
                state.details.clear_error();
                state.view_all.list.clear_error();
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Settlements
            // ═══════════════════════════════════════════════════════════════
            AnimeAction::CatalogLoaded {
                category,
                token,
                page,
                result,
            } => {
                if state.catalog_mut(category).succeed(token, result.data) {
                    state.pagination.record(page, result.meta.as_ref());
                }
                SmallVec::new()
            },

            AnimeAction::CatalogFailed {
                category,
                token,
                error,
            } => {
                state
                    .catalog_mut(category)
                    .fail(token, error.message_or(catalog_fallback(category)));
                SmallVec::new()
            },

            AnimeAction::CurrentSeasonLoaded { token, data } => {
                state.current_season.succeed(token, data);
                SmallVec::new()
            },

            AnimeAction::SeasonLoaded { token, data } => {
                state.season.succeed(token, data);
                SmallVec::new()
            },

            AnimeAction::ScheduleLoaded { token, schedule } => {
                state.schedule.succeed(token, schedule);
                SmallVec::new()
            },

            AnimeAction::DetailsLoaded { token, details } => {
                state.details.succeed(token, Some(*details));
                SmallVec::new()
            },

            AnimeAction::Failed {
                token,
                request,
                error,
            } => {
                let message = error.message_or(request.fallback());
                match request {
                    AnimeRequest::CurrentSeason => state.current_season.fail(token, message),
                    AnimeRequest::Season => state.season.fail(token, message),
                    AnimeRequest::Schedule => state.schedule.fail(token, message),
                    AnimeRequest::Details => state.details.fail(token, message),
                };
                SmallVec::new()
            },

            AnimeAction::ViewAllLoaded { token, page, result } => {
                let view_all = &mut state.view_all;
                if view_all
                    .list
                    .succeed_with(token, |list| list.apply_page(page, result.data))
                {
                    view_all.pagination.record(page, result.meta.as_ref());
                }
                SmallVec::new()
            },

            AnimeAction::ViewAllFailed { token, page, error } => {
                let view_all = &mut state.view_all;
                if page > 1 && classify(&error).is_end_of_list() {
                    if view_all.list.settle(token) {
                        tracing::debug!(page, "View-all exhausted");
                        view_all.pagination.mark_exhausted();
                    }
                    return SmallVec::new();
                }
                let fallback = view_all.category.as_deref().map_or_else(
                    || "Failed to fetch anime".to_string(),
                    |slug| format!("Failed to fetch {slug} anime"),
                );
                view_all.list.fail(token, error.message_or(&fallback));
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::slices::test_support::{env, env_with};
    use sugoi_client::mocks::MockApi;
    use sugoi_testing::helpers::run_effects;
    use sugoi_testing::{assertions, ReducerTest};

    type Slice = AnimeReducer<MockApi>;

    fn titles(count: u64) -> Vec<Anime> {
        (1..=count).map(|id| Anime::new(id, format!("Anime {id}"))).collect()
    }

    async fn dispatch(
        reducer: &Slice,
        state: &mut AnimeState,
        env: &AppEnvironment<MockApi>,
        action: AnimeAction,
    ) {
        let effects = reducer.reduce(state, action, env);
        for feedback in run_effects(effects).await {
            let _ = reducer.reduce(state, feedback, env);
        }
    }

    #[tokio::test]
    async fn test_fetch_catalog_records_pagination() {
        let api = MockApi::new().with_catalog(CatalogCategory::TopAiring, titles(45));
        let (env, _) = env_with(api);
        let reducer = Slice::new();
        let mut state = AnimeState::default();

        dispatch(
            &reducer,
            &mut state,
            &env,
            AnimeAction::FetchCatalog {
                category: CatalogCategory::TopAiring,
                page: 1,
            },
        )
        .await;

        assert_eq!(state.catalog(CatalogCategory::TopAiring).len(), 20);
        assert!(state.catalog(CatalogCategory::Top).is_empty());
        assert_eq!(state.pagination.total_pages, 3);
        assert_eq!(state.pagination.total_results, 45);
        assert_eq!(env.api.calls(), vec!["catalog top-airing page=1 limit=20"]);
    }

    #[tokio::test]
    async fn test_catalog_page_size_follows_config() {
        let api = MockApi::new().with_catalog(CatalogCategory::Top, titles(45));
        let (env, _) = env_with(api);
        let env = env.with_config(AppConfig::default().with_catalog_page_size(15));
        let reducer = Slice::new();
        let mut state = AnimeState::default();
        assert_eq!(state.pagination.limit, AppConfig::default().catalog_page_size);

        dispatch(
            &reducer,
            &mut state,
            &env,
            AnimeAction::FetchCatalog {
                category: CatalogCategory::Top,
                page: 1,
            },
        )
        .await;

        assert_eq!(state.catalog(CatalogCategory::Top).len(), 15);
        assert_eq!(state.pagination.limit, 15);
        assert_eq!(state.pagination.total_pages, 3);
        assert_eq!(env.api.calls(), vec!["catalog top page=1 limit=15"]);
    }

    #[tokio::test]
    async fn test_catalog_failure_uses_category_fallback() {
        let (env, _) = env_with(MockApi::new());
        env.api.fail_next(
            "catalog",
            ApiError::Status {
                status: 502,
                message: None,
            },
        );
        let reducer = Slice::new();
        let mut state = AnimeState::default();

        dispatch(
            &reducer,
            &mut state,
            &env,
            AnimeAction::FetchCatalog {
                category: CatalogCategory::TopMovies,
                page: 1,
            },
        )
        .await;

        let request = state.catalog_request(CatalogCategory::TopMovies).unwrap();
        assert_eq!(request.error.as_deref(), Some("Failed to fetch top movies"));
        assert!(!request.is_busy());
    }

    #[test]
    fn test_invalid_view_all_category_makes_no_call() {
        let env = env();
        let api = env.api.clone();

        ReducerTest::new(Slice::new())
            .with_env(env)
            .given_state(AnimeState::default())
            .when_action(AnimeAction::FetchViewAll {
                category: "classics".to_string(),
                page: 1,
            })
            .then_state(|state| {
                assert_eq!(state.view_all.list.error.as_deref(), Some("Invalid category"));
                assert!(!state.view_all.list.is_busy());
            })
            .then_effects(assertions::assert_no_effects)
            .run();

        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_view_all_later_page_sets_loading_more() {
        let mut state = AnimeState::default();
        state.view_all.category = Some("airing".to_string());
        state.view_all.pagination.page = 1;
        state.view_all.pagination.total_pages = 4;

        ReducerTest::new(Slice::new())
            .with_env(env())
            .given_state(state)
            .when_action(AnimeAction::LoadMoreViewAll)
            .then_state(|state| {
                assert!(state.view_all.list.is_loading_more);
                assert!(!state.view_all.list.is_loading);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_load_more_guarded_while_loading() {
        let mut state = AnimeState::default();
        state.view_all.category = Some("airing".to_string());
        state.view_all.pagination.total_pages = 4;
        state.view_all.list.begin(LoadMode::Initial);

        ReducerTest::new(Slice::new())
            .with_env(env())
            .given_state(state)
            .when_action(AnimeAction::LoadMoreViewAll)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_view_all_pages_and_404_exhaustion() {
        let api = MockApi::new().with_catalog(CatalogCategory::MostPopular, titles(50));
        let (env, _) = env_with(api);
        let reducer = Slice::new();
        let mut state = AnimeState::default();

        dispatch(
            &reducer,
            &mut state,
            &env,
            AnimeAction::FetchViewAll {
                category: "popular".to_string(),
                page: 1,
            },
        )
        .await;
        assert_eq!(state.view_all.list.data.len(), 24);
        assert_eq!(state.view_all.pagination.total_pages, 3);

        dispatch(&reducer, &mut state, &env, AnimeAction::LoadMoreViewAll).await;
        assert_eq!(state.view_all.list.data.len(), 48);

        dispatch(&reducer, &mut state, &env, AnimeAction::LoadMoreViewAll).await;
        assert_eq!(state.view_all.list.data.len(), 50);
        assert!(state.view_all.pagination.is_exhausted());

        // Counters claiming one more page than the backend serves
        state.view_all.pagination.total_pages = 4;
        dispatch(&reducer, &mut state, &env, AnimeAction::LoadMoreViewAll).await;
        assert_eq!(state.view_all.list.error, None);
        assert!(!state.view_all.list.is_busy());
        assert_eq!(state.view_all.list.data.len(), 50);
        assert_eq!(state.view_all.pagination.page, state.view_all.pagination.total_pages);

        let calls_before = env.api.call_count("catalog");
        dispatch(&reducer, &mut state, &env, AnimeAction::LoadMoreViewAll).await;
        assert_eq!(env.api.call_count("catalog"), calls_before);
    }

    #[tokio::test]
    async fn test_view_all_category_change_resets_grid() {
        let api = MockApi::new()
            .with_catalog(CatalogCategory::TopAiring, titles(30))
            .with_catalog(CatalogCategory::TopUpcoming, titles(3));
        let (env, _) = env_with(api);
        let reducer = Slice::new();
        let mut state = AnimeState::default();

        dispatch(
            &reducer,
            &mut state,
            &env,
            AnimeAction::FetchViewAll {
                category: "airing".to_string(),
                page: 1,
            },
        )
        .await;
        dispatch(
            &reducer,
            &mut state,
            &env,
            AnimeAction::FetchViewAll {
                category: "upcoming".to_string(),
                page: 1,
            },
        )
        .await;

        assert_eq!(state.view_all.list.data.len(), 3);
        assert_eq!(state.view_all.pagination.total_pages, 1);
    }

    #[test]
    fn test_stale_details_discarded() {
        let reducer = Slice::new();
        let env = env();
        let mut state = AnimeState::default();

        let first = state.details.begin(LoadMode::Initial);
        let _ = reducer.reduce(&mut state, AnimeAction::FetchDetails { id: 2 }, &env);

        let _ = reducer.reduce(
            &mut state,
            AnimeAction::DetailsLoaded {
                token: first,
                details: Box::new(AnimeDetails::from(Anime::new(1, "Old"))),
            },
            &env,
        );

        assert_eq!(state.details.data, None);
        assert!(state.details.is_loading);
    }

    #[tokio::test]
    async fn test_missing_details_keep_server_message() {
        let (env, _) = env_with(MockApi::new());
        let reducer = Slice::new();
        let mut state = AnimeState::default();

        dispatch(&reducer, &mut state, &env, AnimeAction::FetchDetails { id: 77 }).await;

        assert_eq!(state.details.error.as_deref(), Some("Anime not found"));
    }

    #[tokio::test]
    async fn test_fetch_season_tracks_selection() {
        let mut data = SeasonData::new();
        data.insert("TV (New)".to_string(), titles(2));
        let (env, _) = env_with(MockApi::new().with_season(2024, "fall", data));
        let reducer = Slice::new();
        let mut state = AnimeState::default();

        dispatch(
            &reducer,
            &mut state,
            &env,
            AnimeAction::FetchSeason {
                year: 2024,
                season: Season::Fall,
            },
        )
        .await;

        assert_eq!(state.selected_season, Some((2024, Season::Fall)));
        assert_eq!(state.season.data.get("TV (New)").map(Vec::len), Some(2));
        assert!(state.current_season.data.is_empty());
    }
}
