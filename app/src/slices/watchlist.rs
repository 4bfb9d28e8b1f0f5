//! Watchlist slice: the user's watchlist and watch history.
//!
//! Fetches go through the list's [`RequestState`], so only the latest fetch
//! lands. Changes are tracked apart in [`WatchlistState::saving`] and apply
//! whenever they settle, so quick successive edits never cancel each other.

use std::marker::PhantomData;

use sugoi_client::models::{HistoryEntry, WatchlistUpdate};
use sugoi_client::{AnimeId, ApiError, SugoiApi, WatchlistItem};
use sugoi_core::effect::Effect;
use sugoi_core::reducer::Reducer;
use sugoi_core::{smallvec, SmallVec};

use crate::environment::AppEnvironment;
use crate::request::{KeyedRequests, LoadMode, RequestState, RequestToken};

/// Kind of watchlist request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WatchlistOp {
    /// Load the watchlist
    Fetch,
    /// Add an entry
    Add,
    /// Change an entry
    Update,
    /// Drop an entry
    Remove,
    /// Load the history
    FetchHistory,
    /// Record an episode
    UpdateHistory,
}

impl WatchlistOp {
    /// Message shown when the backend sends none
    #[must_use]
    pub const fn fallback(self) -> &'static str {
        match self {
            Self::Fetch => "Failed to fetch watchlist",
            Self::Add => "Failed to add to watchlist",
            Self::Update => "Failed to update watchlist item",
            Self::Remove => "Failed to remove from watchlist",
            Self::FetchHistory => "Failed to fetch watch history",
            Self::UpdateHistory => "Failed to update watch history",
        }
    }

    const fn is_history(self) -> bool {
        matches!(self, Self::FetchHistory | Self::UpdateHistory)
    }

    /// Changes, as opposed to fetches
    #[must_use]
    pub const fn is_write(self) -> bool {
        !matches!(self, Self::Fetch | Self::FetchHistory)
    }
}

/// Watchlist state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchlistState {
    /// Watchlist entries
    pub watchlist: RequestState<Vec<WatchlistItem>>,
    /// Watched episodes
    pub history: RequestState<Vec<HistoryEntry>>,
    /// Changes in flight
    pub saving: KeyedRequests<WatchlistOp>,
}

impl WatchlistState {
    /// Whether a change is in flight
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving.is_loading()
    }

    fn error_mut(&mut self, op: WatchlistOp) -> &mut Option<String> {
        if op.is_history() {
            &mut self.history.error
        } else {
            &mut self.watchlist.error
        }
    }

    /// Start a change, clearing the error of the list it touches
    fn begin_write(&mut self, op: WatchlistOp) -> RequestToken {
        *self.error_mut(op) = None;
        self.saving.begin(op)
    }
}

/// Watchlist actions
#[derive(Debug, Clone, PartialEq)]
pub enum WatchlistAction {
    /// Load the watchlist
    Fetch,
    /// Add an entry
    Add(WatchlistItem),
    /// Change an entry
    Update {
        /// Entry to change
        anime_id: AnimeId,
        /// Fields to change
        update: WatchlistUpdate,
    },
    /// Drop an entry
    Remove {
        /// Entry to drop
        anime_id: AnimeId,
    },
    /// Load the history
    FetchHistory,
    /// Record an episode
    UpdateHistory(HistoryEntry),
    /// Drop the errors of both lists
    ClearError,

    /// Full watchlist from a fetch
    Loaded {
        /// Request the list answers
        token: RequestToken,
        /// Entries
        items: Vec<WatchlistItem>,
    },
    /// Entry added; the backend answers with the full list
    Added {
        /// Request the list answers
        token: RequestToken,
        /// Entries
        items: Vec<WatchlistItem>,
    },
    /// One entry changed
    ItemUpdated {
        /// Request the entry answers
        token: RequestToken,
        /// New entry
        item: WatchlistItem,
    },
    /// One entry removed
    Removed {
        /// Request the removal answers
        token: RequestToken,
        /// Entry removed
        anime_id: AnimeId,
    },
    /// Full history from a fetch
    HistoryLoaded {
        /// Request the list answers
        token: RequestToken,
        /// Entries
        entries: Vec<HistoryEntry>,
    },
    /// Episode recorded; the backend answers with the full history
    HistoryUpdated {
        /// Request the list answers
        token: RequestToken,
        /// Entries
        entries: Vec<HistoryEntry>,
    },
    /// Any request failed
    Failed {
        /// Request that failed
        token: RequestToken,
        /// What it was
        op: WatchlistOp,
        /// Cause
        error: ApiError,
    },
}

/// Watchlist reducer
#[derive(Debug, Clone)]
pub struct WatchlistReducer<Api> {
    _phantom: PhantomData<fn() -> Api>,
}

impl<Api> WatchlistReducer<Api> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<Api> Default for WatchlistReducer<Api> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Api: SugoiApi> Reducer for WatchlistReducer<Api> {
    type State = WatchlistState;
    type Action = WatchlistAction;
    type Environment = AppEnvironment<Api>;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            WatchlistAction::Fetch => {
                let token = state.watchlist.begin(LoadMode::Initial);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.watchlist().await {
                        Ok(items) => WatchlistAction::Loaded { token, items },
                        Err(error) => WatchlistAction::Failed {
                            token,
                            op: WatchlistOp::Fetch,
                            error,
                        },
                    })
                })]
            },

            WatchlistAction::Add(item) => {
                let token = state.begin_write(WatchlistOp::Add);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.add_to_watchlist(&item).await {
                        Ok(items) => WatchlistAction::Added { token, items },
                        Err(error) => WatchlistAction::Failed {
                            token,
                            op: WatchlistOp::Add,
                            error,
                        },
                    })
                })]
            },

            WatchlistAction::Update { anime_id, update } => {
                let token = state.begin_write(WatchlistOp::Update);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.update_watchlist_item(anime_id, &update).await {
                        Ok(item) => WatchlistAction::ItemUpdated { token, item },
                        Err(error) => WatchlistAction::Failed {
                            token,
                            op: WatchlistOp::Update,
                            error,
                        },
                    })
                })]
            },

            WatchlistAction::Remove { anime_id } => {
                let token = state.begin_write(WatchlistOp::Remove);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.remove_from_watchlist(anime_id).await {
                        Ok(_) => WatchlistAction::Removed { token, anime_id },
                        Err(error) => WatchlistAction::Failed {
                            token,
                            op: WatchlistOp::Remove,
                            error,
                        },
                    })
                })]
            },

            WatchlistAction::FetchHistory => {
                let token = state.history.begin(LoadMode::Initial);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.watch_history().await {
                        Ok(entries) => WatchlistAction::HistoryLoaded { token, entries },
                        Err(error) => WatchlistAction::Failed {
                            token,
                            op: WatchlistOp::FetchHistory,
                            error,
                        },
                    })
                })]
            },

            WatchlistAction::UpdateHistory(entry) => {
                let token = state.begin_write(WatchlistOp::UpdateHistory);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.update_watch_history(&entry).await {
                        Ok(entries) => WatchlistAction::HistoryUpdated { token, entries },
                        Err(error) => WatchlistAction::Failed {
                            token,
                            op: WatchlistOp::UpdateHistory,
                            error,
                        },
                    })
                })]
            },

            WatchlistAction::ClearError => {
                state.watchlist.clear_error();
                state.history.clear_error();
                SmallVec::new()
            },

            WatchlistAction::Loaded { token, items } => {
                state.watchlist.succeed(token, items);
                SmallVec::new()
            },

            WatchlistAction::Added { token, items } => {
                state.saving.settle(WatchlistOp::Add, token);
                state.watchlist.data = items;
                SmallVec::new()
            },

            WatchlistAction::ItemUpdated { token, item } => {
                state.saving.settle(WatchlistOp::Update, token);
                let items = &mut state.watchlist.data;
                if let Some(existing) = items.iter_mut().find(|i| i.anime_id == item.anime_id) {
                    *existing = item;
                }
                SmallVec::new()
            },

            WatchlistAction::Removed { token, anime_id } => {
                state.saving.settle(WatchlistOp::Remove, token);
                state.watchlist.data.retain(|i| i.anime_id != anime_id);
                SmallVec::new()
            },

            WatchlistAction::HistoryLoaded { token, entries } => {
                state.history.succeed(token, entries);
                SmallVec::new()
            },

            WatchlistAction::HistoryUpdated { token, entries } => {
                state.saving.settle(WatchlistOp::UpdateHistory, token);
                state.history.data = entries;
                SmallVec::new()
            },

            WatchlistAction::Failed { token, op, error } => {
                tracing::debug!(?op, %error, "Watchlist request failed");
                let message = error.message_or(op.fallback());
                if op.is_write() {
                    if state.saving.settle(op, token) {
                        *state.error_mut(op) = Some(message);
                    }
                } else if op.is_history() {
                    state.history.fail(token, message);
                } else {
                    state.watchlist.fail(token, message);
                }
                SmallVec::new()
            },
        }
    }
}
