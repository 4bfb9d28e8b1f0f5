//! Async request lifecycle
//!
//! Every data-fetching operation goes requested → succeeded | failed. A
//! [`RequestState`] hands out a [`RequestToken`] when a request begins and
//! only accepts the settlement carrying the latest token, so a slow
//! response that lost a race cannot overwrite a newer one.
//!
//! Slices whose operations are unrelated to each other use
//! [`KeyedRequests`] instead: each operation kind keeps its own latest
//! token, so one kind of request never supersedes another.

use std::collections::BTreeMap;
use std::fmt::Debug;

/// Whether a request starts a stream or extends one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// First page, or a non-paginated fetch
    Initial,
    /// Page > 1 of an existing stream
    More,
}

impl LoadMode {
    /// Mode for fetching `page` of a paginated stream
    #[must_use]
    pub const fn for_page(page: u32) -> Self {
        if page > 1 { Self::More } else { Self::Initial }
    }
}

/// Identifies one in-flight request
///
/// Carried by the settlement action so the reducer can tell whether the
/// response is still wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    generation: u64,
    mode: LoadMode,
}

impl RequestToken {
    /// How the request was started
    #[must_use]
    pub const fn mode(self) -> LoadMode {
        self.mode
    }

    /// Generation number
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// Data plus loading and error flags for one request stream
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<T> {
    /// Last successful payload
    pub data: T,
    /// Initial fetch in flight
    pub is_loading: bool,
    /// Incremental fetch in flight
    pub is_loading_more: bool,
    /// Human-readable failure of the last request
    pub error: Option<String>,
    generation: u64,
}

impl<T: Default> Default for RequestState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> RequestState<T> {
    /// Idle state holding `data`
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self {
            data,
            is_loading: false,
            is_loading_more: false,
            error: None,
            generation: 0,
        }
    }

    /// Start a request, superseding any request still in flight
    ///
    /// Clears the error and raises exactly one loading flag.
    pub fn begin(&mut self, mode: LoadMode) -> RequestToken {
        self.generation += 1;
        self.error = None;
        self.is_loading = mode == LoadMode::Initial;
        self.is_loading_more = mode == LoadMode::More;
        RequestToken {
            generation: self.generation,
            mode,
        }
    }

    /// Whether `token` belongs to the latest request
    #[must_use]
    pub const fn is_current(&self, token: RequestToken) -> bool {
        token.generation == self.generation
    }

    /// Whether any request is in flight
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.is_loading || self.is_loading_more
    }

    /// Latest generation handed out
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Settle the request `token` belongs to
    ///
    /// Returns `false` and changes nothing when the token is stale.
    pub fn settle(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            tracing::warn!(
                stale = token.generation,
                current = self.generation,
                "Discarding stale response"
            );
            return false;
        }
        self.is_loading = false;
        self.is_loading_more = false;
        true
    }

    /// Settle successfully, replacing the payload
    pub fn succeed(&mut self, token: RequestToken, data: T) -> bool {
        self.succeed_with(token, |current| *current = data)
    }

    /// Settle successfully, updating the payload in place
    pub fn succeed_with(&mut self, token: RequestToken, update: impl FnOnce(&mut T)) -> bool {
        if !self.settle(token) {
            return false;
        }
        update(&mut self.data);
        true
    }

    /// Settle with a failure message
    pub fn fail(&mut self, token: RequestToken, message: impl Into<String>) -> bool {
        if !self.settle(token) {
            return false;
        }
        self.error = Some(message.into());
        true
    }

    /// Abandon whatever is in flight without recording an outcome
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.is_loading = false;
        self.is_loading_more = false;
    }

    /// Drop the error
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Lifecycle of several independent request kinds sharing one banner error
///
/// A request only supersedes earlier requests of the same key. Settling
/// always retires the request; whether its outcome is still wanted is for
/// the caller to decide from the returned flag.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRequests<K> {
    /// Human-readable failure of the last current request
    pub error: Option<String>,
    generation: u64,
    latest: BTreeMap<K, u64>,
    in_flight: BTreeMap<u64, K>,
}

impl<K> Default for KeyedRequests<K> {
    fn default() -> Self {
        Self {
            error: None,
            generation: 0,
            latest: BTreeMap::new(),
            in_flight: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy + Debug> KeyedRequests<K> {
    /// Start a request of kind `key`, superseding earlier ones of that kind
    pub fn begin(&mut self, key: K) -> RequestToken {
        self.generation += 1;
        self.error = None;
        self.latest.insert(key, self.generation);
        self.in_flight.insert(self.generation, key);
        RequestToken {
            generation: self.generation,
            mode: LoadMode::Initial,
        }
    }

    /// Whether `token` belongs to the latest request of kind `key`
    #[must_use]
    pub fn is_current(&self, key: K, token: RequestToken) -> bool {
        self.latest.get(&key) == Some(&token.generation)
    }

    /// Whether any request is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Whether a request of kind `key` is in flight
    #[must_use]
    pub fn is_pending(&self, key: K) -> bool {
        self.in_flight.values().any(|pending| *pending == key)
    }

    /// Retire the request `token` belongs to
    ///
    /// Returns `false` when a newer request of kind `key` has started or
    /// the kind was invalidated since.
    pub fn settle(&mut self, key: K, token: RequestToken) -> bool {
        self.in_flight.remove(&token.generation);
        if self.is_current(key, token) {
            return true;
        }
        tracing::warn!(
            ?key,
            stale = token.generation,
            current = ?self.latest.get(&key),
            "Superseded response"
        );
        false
    }

    /// Retire with a failure; the message is kept only for a current request
    pub fn fail(&mut self, key: K, token: RequestToken, message: impl Into<String>) -> bool {
        if !self.settle(key, token) {
            return false;
        }
        self.error = Some(message.into());
        true
    }

    /// Make every in-flight request of kind `key` stale
    pub fn invalidate(&mut self, key: K) {
        self.latest.remove(&key);
    }

    /// Make every in-flight request stale
    pub fn cancel(&mut self) {
        self.latest.clear();
        self.in_flight.clear();
    }

    /// Drop the error
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_sets_one_flag_and_clears_error() {
        let mut state: RequestState<Vec<u32>> = RequestState::default();
        state.error = Some("old".to_string());

        state.begin(LoadMode::More);

        assert!(state.is_loading_more);
        assert!(!state.is_loading);
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_settlement_clears_both_flags() {
        let mut state: RequestState<Vec<u32>> = RequestState::default();

        let token = state.begin(LoadMode::Initial);
        assert!(state.succeed(token, vec![1]));
        assert!(!state.is_busy());

        let token = state.begin(LoadMode::More);
        assert!(state.fail(token, "Search failed"));
        assert!(!state.is_busy());
        assert_eq!(state.error.as_deref(), Some("Search failed"));
        assert_eq!(state.data, vec![1]);
    }

    #[test]
    fn test_stale_settlement_discarded() {
        let mut state: RequestState<Vec<u32>> = RequestState::default();

        let first = state.begin(LoadMode::Initial);
        let second = state.begin(LoadMode::Initial);

        assert!(!state.succeed(first, vec![1]));
        assert!(state.is_loading);
        assert!(state.succeed(second, vec![2]));
        assert!(!state.fail(first, "late failure"));
        assert_eq!(state.data, vec![2]);
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_cancel_orphans_in_flight_request() {
        let mut state: RequestState<u32> = RequestState::default();
        let token = state.begin(LoadMode::Initial);

        state.cancel();

        assert!(!state.is_busy());
        assert!(!state.succeed(token, 7));
        assert_eq!(state.data, 0);
    }

    #[test]
    fn test_keyed_requests_do_not_supersede_other_keys() {
        let mut requests: KeyedRequests<&str> = KeyedRequests::default();

        let login = requests.begin("login");
        let forgot = requests.begin("forgot");
        assert!(requests.is_current("login", login));
        assert!(requests.is_pending("login"));

        assert!(requests.settle("forgot", forgot));
        assert!(requests.is_loading());
        assert!(requests.settle("login", login));
        assert!(!requests.is_loading());
    }

    #[test]
    fn test_keyed_requests_same_key_supersedes() {
        let mut requests: KeyedRequests<&str> = KeyedRequests::default();

        let first = requests.begin("user");
        let second = requests.begin("user");

        assert!(!requests.fail("user", first, "late failure"));
        assert_eq!(requests.error, None);
        assert!(requests.is_loading());
        assert!(requests.fail("user", second, "Not authorized"));
        assert_eq!(requests.error.as_deref(), Some("Not authorized"));
        assert!(!requests.is_loading());
    }

    #[test]
    fn test_keyed_invalidate_and_cancel() {
        let mut requests: KeyedRequests<&str> = KeyedRequests::default();

        let user = requests.begin("user");
        let logout = requests.begin("logout");
        requests.invalidate("user");
        assert!(!requests.settle("user", user));
        assert!(requests.is_current("logout", logout));

        requests.cancel();
        assert!(!requests.is_loading());
        assert!(!requests.settle("logout", logout));
    }

    #[test]
    fn test_load_mode_for_page() {
        assert_eq!(LoadMode::for_page(1), LoadMode::Initial);
        assert_eq!(LoadMode::for_page(2), LoadMode::More);
    }
}
