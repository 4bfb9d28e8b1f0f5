//! Search slice.
//!
//! Paginated results with infinite scroll, typeahead suggestions, recent
//! queries and the filter panel.

use std::marker::PhantomData;

use sugoi_client::{classify, Anime, ApiError, FilterUpdate, Paginated, SearchFilters, SugoiApi};
use sugoi_core::effect::Effect;
use sugoi_core::reducer::Reducer;
use sugoi_core::{smallvec, SmallVec};

use crate::config::AppConfig;
use crate::environment::AppEnvironment;
use crate::pagination::{PagedList, Pagination};
use crate::request::{LoadMode, RequestState, RequestToken};
use crate::slices::{persist, restore};

/// Message for a failed search without a server message
pub const SEARCH_FAILED: &str = "Search failed";

/// Search state
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    /// Accumulated result pages
    pub results: RequestState<PagedList<Anime>>,
    /// Query the results belong to
    pub query: String,
    /// Paging counters
    pub pagination: Pagination,
    /// Most recent first, no duplicates
    pub recent_searches: Vec<String>,
    /// Typeahead suggestions
    pub suggestions: RequestState<Vec<Anime>>,
    /// Filter panel
    pub active_filters: SearchFilters,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            results: RequestState::default(),
            query: String::new(),
            pagination: Pagination::new(AppConfig::default().search_page_size),
            recent_searches: Vec::new(),
            suggestions: RequestState::default(),
            active_filters: SearchFilters::default(),
        }
    }
}

/// Search actions
#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    /// Fetch one page of results
    Search {
        /// Query text
        query: String,
        /// 1-based page
        page: u32,
        /// Filters to send; `None` sends the active filters
        filters: Option<SearchFilters>,
    },
    /// Fetch the next page of the current query if allowed
    LoadMore,
    /// Set the query without searching
    SetQuery(String),
    /// Drop results, query and counters
    ClearResults,
    /// Drop results and counters, keeping the query
    ResetPagination,
    /// Drop the error
    ClearError,
    /// Fetch typeahead suggestions
    FetchSuggestions(String),
    /// Drop suggestions
    ClearSuggestions,
    /// Remember a query
    AddRecentSearch(String),
    /// Load remembered queries
    LoadRecentSearches,
    /// Forget remembered queries
    ClearRecentSearches,
    /// Change one filter
    SetFilter(FilterUpdate),
    /// Restore every filter to its default
    ResetFilters,

    /// Result page arrived
    SearchLoaded {
        /// Request it answers
        token: RequestToken,
        /// Query sent
        query: String,
        /// Page requested
        page: u32,
        /// Filters sent
        filters: SearchFilters,
        /// Items and counters
        result: Paginated<Anime>,
    },
    /// Result fetch failed
    SearchFailed {
        /// Request that failed
        token: RequestToken,
        /// Page requested
        page: u32,
        /// Cause
        error: ApiError,
    },
    /// Suggestions arrived
    SuggestionsLoaded {
        /// Request it answers
        token: RequestToken,
        /// Suggestions
        items: Vec<Anime>,
    },
    /// Suggestion fetch failed
    SuggestionsFailed {
        /// Request that failed
        token: RequestToken,
    },
}

impl SearchAction {
    /// First page of `query` with the active filters
    #[must_use]
    pub fn search(query: impl Into<String>) -> Self {
        Self::Search {
            query: query.into(),
            page: 1,
            filters: None,
        }
    }
}

/// Prepend `query` unless already present, keeping at most `capacity`
fn remember(recent: &mut Vec<String>, query: &str, capacity: usize) -> bool {
    if query.is_empty() || recent.iter().any(|q| q == query) {
        return false;
    }
    recent.insert(0, query.to_string());
    recent.truncate(capacity);
    true
}

/// Search reducer
#[derive(Debug, Clone)]
pub struct SearchReducer<Api> {
    _phantom: PhantomData<fn() -> Api>,
}

impl<Api> SearchReducer<Api> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<Api> Default for SearchReducer<Api> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Api: SugoiApi> SearchReducer<Api> {
    fn fetch(
        state: &mut SearchState,
        query: String,
        page: u32,
        filters: SearchFilters,
        env: &AppEnvironment<Api>,
    ) -> SmallVec<[Effect<SearchAction>; 4]> {
        let token = state.results.begin(LoadMode::for_page(page));
        tracing::debug!(%query, page, "Searching");

        let limit = env.config.search_page_size;
        state.pagination.limit = limit;
        let api = env.api.clone();
        smallvec![Effect::future(async move {
            Some(match api.search(&query, page, limit, &filters).await {
                Ok(result) => SearchAction::SearchLoaded {
                    token,
                    query,
                    page,
                    filters,
                    result,
                },
                Err(error) => SearchAction::SearchFailed { token, page, error },
            })
        })]
    }

    fn persist_recent(state: &SearchState, env: &AppEnvironment<Api>) {
        persist(
            "recent searches",
            env.session.set_recent_searches(&state.recent_searches),
        );
    }
}

impl<Api: SugoiApi> Reducer for SearchReducer<Api> {
    type State = SearchState;
    type Action = SearchAction;
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
            // Results
            // ═══════════════════════════════════════════════════════════════
            SearchAction::Search {
                query,
                page,
                filters,
            } => {
                let filters = filters.unwrap_or_else(|| state.active_filters.clone());
                Self::fetch(state, query, page, filters, env)
            },

            SearchAction::LoadMore => {
                if !state
                    .pagination
                    .can_load_more(state.results.is_loading, state.results.is_loading_more)
                {
                    return SmallVec::new();
                }
                let page = state.pagination.next_page();
                let query = state.query.clone();
                let filters = state.active_filters.clone();
                Self::fetch(state, query, page, filters, env)
            },

            SearchAction::SearchLoaded {
                token,
                query,
                page,
                filters,
                result,
            } => {
                if !state
                    .results
                    .succeed_with(token, |list| list.apply_page(page, result.data))
                {
                    return SmallVec::new();
                }
                state.pagination.record(page, result.meta.as_ref());
                state.active_filters.merge_set(&filters);
                if remember(&mut state.recent_searches, &query, env.config.recent_search_capacity) {
                    Self::persist_recent(state, env);
                }
                state.query = query;
                SmallVec::new()
            },

            SearchAction::SearchFailed { token, page, error } => {
                if page > 1 && classify(&error).is_end_of_list() {
                    if state.results.settle(token) {
                        tracing::debug!(page, "Search results exhausted");
                        state.pagination.mark_exhausted();
                    }
                    return SmallVec::new();
                }
                state.results.fail(token, error.message_or(SEARCH_FAILED));
                SmallVec::new()
            },

            SearchAction::SetQuery(query) => {
                state.query = query;
                SmallVec::new()
            },

            SearchAction::ClearResults => {
                state.results.cancel();
                state.results.data.clear();
                state.query.clear();
                state.pagination.reset();
                SmallVec::new()
            },

            SearchAction::ResetPagination => {
                state.results.cancel();
                state.results.data.clear();
                state.pagination.reset();
                SmallVec::new()
            },

            SearchAction::ClearError => {
                state.results.clear_error();
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Suggestions
            // ═══════════════════════════════════════════════════════════════
            SearchAction::FetchSuggestions(query) => {
                let query = query.trim().to_string();
                if query.is_empty() {
                    state.suggestions.cancel();
                    state.suggestions.data.clear();
                    return SmallVec::new();
                }

                let token = state.suggestions.begin(LoadMode::Initial);
                let api = env.api.clone();
                let limit = env.config.suggestion_count;
                smallvec![Effect::future(async move {
                    Some(
                        match api.search(&query, 1, limit, &SearchFilters::default()).await {
                            Ok(result) => SearchAction::SuggestionsLoaded {
                                token,
                                items: result.data,
                            },
                            Err(error) => {
                                tracing::debug!(%error, "Suggestions unavailable");
                                SearchAction::SuggestionsFailed { token }
                            },
                        },
                    )
                })]
            },

            SearchAction::SuggestionsLoaded { token, items } => {
                state.suggestions.succeed(token, items);
                SmallVec::new()
            },

            SearchAction::SuggestionsFailed { token } => {
                state.suggestions.succeed(token, Vec::new());
                SmallVec::new()
            },

            SearchAction::ClearSuggestions => {
                state.suggestions.cancel();
                state.suggestions.data.clear();
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Recent searches
            // ═══════════════════════════════════════════════════════════════
            SearchAction::AddRecentSearch(query) => {
                if remember(&mut state.recent_searches, &query, env.config.recent_search_capacity) {
                    Self::persist_recent(state, env);
                }
                SmallVec::new()
            },

            SearchAction::LoadRecentSearches => {
                state.recent_searches = restore("recent searches", env.session.recent_searches());
                SmallVec::new()
            },

            SearchAction::ClearRecentSearches => {
                state.recent_searches.clear();
                persist("recent searches", env.session.clear_recent_searches());
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Filters
            // ═══════════════════════════════════════════════════════════════
            SearchAction::SetFilter(update) => {
                state.active_filters.apply(update);
                SmallVec::new()
            },

            SearchAction::ResetFilters => {
                state.active_filters = SearchFilters::default();
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

    type Slice = SearchReducer<MockApi>;

    fn titles(count: u64) -> Vec<Anime> {
        (1..=count).map(|id| Anime::new(id, format!("Naruto {id}"))).collect()
    }

    async fn dispatch(
        reducer: &Slice,
        state: &mut SearchState,
        env: &AppEnvironment<MockApi>,
        action: SearchAction,
    ) {
        let effects = reducer.reduce(state, action, env);
        for feedback in run_effects(effects).await {
            let _ = reducer.reduce(state, feedback, env);
        }
    }

    #[tokio::test]
    async fn test_search_then_load_more() {
        let (env, _) = env_with(MockApi::new().with_search_results("naruto", titles(45)));
        let reducer = Slice::new();
        let mut state = SearchState::default();

        dispatch(&reducer, &mut state, &env, SearchAction::search("naruto")).await;
        assert_eq!(state.results.data.len(), 20);
        assert_eq!(state.query, "naruto");
        assert_eq!(state.pagination.total_pages, 3);
        assert_eq!(state.recent_searches, vec!["naruto"]);

        dispatch(&reducer, &mut state, &env, SearchAction::LoadMore).await;
        dispatch(&reducer, &mut state, &env, SearchAction::LoadMore).await;
        dispatch(&reducer, &mut state, &env, SearchAction::LoadMore).await;

        assert_eq!(state.results.data.len(), 45);
        assert_eq!(env.api.call_count("search"), 3);
        assert_eq!(env.session.recent_searches().unwrap(), vec!["naruto"]);
    }

    #[tokio::test]
    async fn test_not_found_on_load_more_is_exhaustion() {
        let (env, _) = env_with(MockApi::new());
        let reducer = Slice::new();
        let mut state = SearchState {
            query: "naruto".to_string(),
            ..SearchState::default()
        };
        state.pagination.page = 2;
        state.pagination.total_pages = 7;
        env.api.fail_next(
            "search",
            ApiError::Status {
                status: 404,
                message: Some("Page not found".to_string()),
            },
        );

        dispatch(&reducer, &mut state, &env, SearchAction::LoadMore).await;

        assert_eq!(state.results.error, None);
        assert!(!state.results.is_busy());
        assert_eq!(state.pagination.page, state.pagination.total_pages);
        assert!(!state.pagination.can_load_more(false, false));
    }

    #[tokio::test]
    async fn test_first_page_failure_is_an_error() {
        let (env, _) = env_with(MockApi::new());
        env.api.fail_next("search", ApiError::Network("connection reset".to_string()));
        let reducer = Slice::new();
        let mut state = SearchState::default();

        dispatch(&reducer, &mut state, &env, SearchAction::search("bleach")).await;

        assert_eq!(state.results.error.as_deref(), Some(SEARCH_FAILED));
        assert!(state.recent_searches.is_empty());
    }

    #[test]
    fn test_load_more_is_noop_when_exhausted() {
        let mut state = SearchState::default();
        state.pagination.page = 3;
        state.pagination.total_pages = 3;

        ReducerTest::new(Slice::new())
            .with_env(env())
            .given_state(state)
            .when_action(SearchAction::LoadMore)
            .then_state(|state| assert!(!state.results.is_busy()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_search_merges_issued_filters() {
        let (env, _) = env_with(MockApi::new());
        let reducer = Slice::new();
        let mut state = SearchState::default();
        state.active_filters.status = Some("airing".to_string());

        let issued = SearchFilters {
            kind: Some("TV".to_string()),
            ..SearchFilters::default()
        };
        dispatch(
            &reducer,
            &mut state,
            &env,
            SearchAction::Search {
                query: "one piece".to_string(),
                page: 1,
                filters: Some(issued),
            },
        )
        .await;

        assert_eq!(state.active_filters.kind.as_deref(), Some("TV"));
        assert_eq!(state.active_filters.status.as_deref(), Some("airing"));
    }

    #[test]
    fn test_reset_filters_restores_defaults() {
        let reducer = Slice::new();
        let env = env();
        let mut state = SearchState::default();

        for update in [
            FilterUpdate::Kind(Some("Movie".to_string())),
            FilterUpdate::Score(Some(8.0)),
            FilterUpdate::Genre(vec!["Action".to_string()]),
            FilterUpdate::Adult(false),
            FilterUpdate::EndDate(Some("2020-01-01".to_string())),
        ] {
            let _ = reducer.reduce(&mut state, SearchAction::SetFilter(update), &env);
        }
        assert!(!state.active_filters.adult);

        let _ = reducer.reduce(&mut state, SearchAction::ResetFilters, &env);
        assert_eq!(state.active_filters, SearchFilters::default());
        assert!(state.active_filters.adult);
    }

    #[test]
    fn test_recent_searches_dedup_and_cap() {
        let reducer = Slice::new();
        let env = env();
        let mut state = SearchState::default();

        for query in ["a", "b", "c", "a", "d", "e", "f"] {
            let _ = reducer.reduce(&mut state, SearchAction::AddRecentSearch(query.to_string()), &env);
        }

        assert_eq!(state.recent_searches, vec!["f", "e", "d", "c", "b"]);
        assert_eq!(env.session.recent_searches().unwrap(), state.recent_searches);

        let mut reloaded = SearchState::default();
        let _ = reducer.reduce(&mut reloaded, SearchAction::LoadRecentSearches, &env);
        assert_eq!(reloaded.recent_searches, state.recent_searches);

        let _ = reducer.reduce(&mut state, SearchAction::ClearRecentSearches, &env);
        assert!(env.session.recent_searches().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_suggestion_failure_clears_silently() {
        let (env, _) = env_with(MockApi::new().with_search_results("fr", titles(9)));
        let reducer = Slice::new();
        let mut state = SearchState::default();

        dispatch(&reducer, &mut state, &env, SearchAction::FetchSuggestions("fr".to_string())).await;
        assert_eq!(state.suggestions.data.len(), 4);
        assert!(env.api.calls().contains(&"search fr page=1 limit=4".to_string()));

        env.api.fail_next("search", ApiError::Network("offline".to_string()));
        dispatch(&reducer, &mut state, &env, SearchAction::FetchSuggestions("fri".to_string())).await;
        assert!(state.suggestions.data.is_empty());
        assert_eq!(state.suggestions.error, None);
    }

    #[test]
    fn test_clear_results_resets_query_and_counters() {
        let reducer = Slice::new();
        let env = env();
        let mut state = SearchState {
            query: "naruto".to_string(),
            ..SearchState::default()
        };
        state.results.data.apply_page(1, titles(3));
        state.pagination.page = 2;

        let _ = reducer.reduce(&mut state, SearchAction::ResetPagination, &env);
        assert!(state.results.data.is_empty());
        assert_eq!(state.query, "naruto");
        assert_eq!(state.pagination, Pagination::new(env.config.search_page_size));

        let _ = reducer.reduce(&mut state, SearchAction::ClearResults, &env);
        assert!(state.query.is_empty());
    }
}
