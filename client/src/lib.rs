//! # Sugoi API Client
//!
//! HTTP adapter, durable session storage and wire models for the Sugoi
//! anime API.
//!
//! ## Example
//!
//! ```no_run
//! use sugoi_client::{AnimeApi, ApiClient, CatalogCategory, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Base URL from SUGOI_API_URL, token kept in memory
//!     let client = ApiClient::from_env(SessionStore::in_memory());
//!
//!     let page = client.catalog(CatalogCategory::TopAiring, 1, 20).await?;
//!     for anime in page.data {
//!         println!("{} ({:?})", anime.title, anime.score);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Bearer token attached from the [`SessionStore`]
//! - 401 interception with a [`SessionEvent::Expired`] broadcast
//! - A single [`classify`] function for free-text backend failures
//! - [`MemoryStorage`] and [`FileStorage`] backends
//! - An in-memory [`MockApi`](mocks::MockApi) for tests

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod http;
pub mod mocks;
pub mod models;
pub mod session;
pub mod storage;

// Re-export main types for convenience
pub use api::{AnimeApi, ApiResult, AuthApi, SugoiApi, UserApi};
pub use classify::{classify, FailureKind, RetryAfter};
pub use config::ClientConfig;
pub use error::{ApiError, StorageError, StorageResult};
pub use http::{ApiClient, SessionEvent};
pub use models::{
    Anime, AnimeDetails, AnimeId, CatalogCategory, FilterUpdate, PageMeta, Paginated, Schedule,
    ScheduleDay, SearchFilters, SeasonData, UserProfile, WatchlistItem,
};
pub use session::{ResendCooldownRecord, SessionStore, ThemeMode};
pub use storage::{FileStorage, MemoryStorage, Storage};
