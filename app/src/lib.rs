//! # Sugoi App
//!
//! Client-side state for the Sugoi anime client: domain slices over a single
//! [`AppState`], composed into one [`AppReducer`] and driven by a
//! [`Store`](sugoi_runtime::Store).
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sugoi_app::slices::search::SearchAction;
//! use sugoi_app::{app_store, forward_session_events, AppAction, AppEnvironment};
//! use sugoi_client::{ApiClient, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = SessionStore::in_memory();
//!     let client = ApiClient::from_env(session.clone());
//!     let events = client.session_events();
//!
//!     let store = Arc::new(app_store(AppEnvironment::new(client, session)));
//!     forward_session_events(Arc::clone(&store), events);
//!
//!     let mut handle = store
//!         .send(AppAction::Search(SearchAction::search("naruto")))
//!         .await?;
//!     handle.wait().await;
//!
//!     let titles = store
//!         .state(|s| s.search.results.data.items().iter().map(|a| a.title.clone()).collect::<Vec<_>>())
//!         .await;
//!     println!("{titles:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`request`]: request lifecycle with stale-response protection
//! - [`pagination`]: page bookkeeping and incremental appends
//! - [`slices`]: anime, auth, search, watchlist, ui and verification
//! - [`validation`]: form checks that run before any request
//! - [`season`]: season and schedule helpers

pub mod app;
pub mod config;
pub mod environment;
pub mod pagination;
pub mod request;
pub mod season;
pub mod slices;
pub mod validation;

pub use app::{
    app_store, forward_session_events, AppAction, AppReducer, AppState, AppStore,
    CoordinatorReducer,
};
pub use config::AppConfig;
pub use environment::AppEnvironment;
pub use pagination::{Keyed, PagedList, Pagination};
pub use request::{KeyedRequests, LoadMode, RequestState, RequestToken};
pub use season::{Season, SeasonGroup};
pub use validation::{Field, FieldErrors, ValidationError};
