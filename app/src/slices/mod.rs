//! Domain slices.
//!
//! Each slice owns one subtree of [`AppState`](crate::app::AppState) and is a
//! [`Reducer`](sugoi_core::Reducer) over that subtree. Requests run as
//! `Effect::Future`s whose settlement comes back as a `*Loaded`/`*Succeeded`
//! or `*Failed` action carrying the [`RequestToken`](crate::request::RequestToken)
//! it was started with.
//!
//! Durable client state is written synchronously through
//! [`SessionStore`](sugoi_client::SessionStore) while reducing; a failed
//! write is logged and never fails the action.

pub mod anime;
pub mod auth;
pub mod search;
pub mod ui;
pub mod verification;
pub mod watchlist;

use sugoi_client::StorageResult;

/// Log a failed storage write
pub(crate) fn persist(what: &'static str, result: StorageResult<()>) {
    if let Err(error) = result {
        tracing::warn!(%error, what, "Failed to persist client state");
    }
}

/// Read durable state, logging and falling back to the default on failure
pub(crate) fn restore<T: Default>(what: &'static str, result: StorageResult<T>) -> T {
    result.unwrap_or_else(|error| {
        tracing::warn!(%error, what, "Failed to read client state");
        T::default()
    })
}
