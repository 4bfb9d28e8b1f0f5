//! Pagination and infinite-scroll coordinator
//!
//! [`Pagination`] mirrors the backend's page metadata and answers whether
//! another page may be requested. [`PagedList`] merges fetched pages into one
//! list, remembering where each page starts so a page can be re-applied.

use std::collections::HashSet;
use std::hash::Hash;

use sugoi_client::models::{Anime, AnimeId, PageMeta};

/// Items with a stable identity
pub trait Keyed {
    /// Identity type
    type Key: Eq + Hash + Clone;

    /// Identity of this item
    fn key(&self) -> Self::Key;
}

impl Keyed for Anime {
    type Key = AnimeId;

    fn key(&self) -> AnimeId {
        self.id
    }
}

/// Paging counters of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Last page loaded (1-based)
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Pages available, 0 until the first response
    pub total_pages: u32,
    /// Items available
    pub total_results: u32,
}

impl Pagination {
    /// Counters reset to page 1
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total_pages: 0,
            total_results: 0,
        }
    }

    /// `page < total_pages && !is_loading && !is_loading_more`
    #[must_use]
    pub const fn can_load_more(&self, is_loading: bool, is_loading_more: bool) -> bool {
        self.page < self.total_pages && !is_loading && !is_loading_more
    }

    /// Page a load-more request should fetch
    #[must_use]
    pub const fn next_page(&self) -> u32 {
        self.page + 1
    }

    /// Whether the last page has been reached
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.page >= self.total_pages
    }

    /// Record a successful fetch of `page`
    ///
    /// Without metadata only the page counter moves.
    pub fn record(&mut self, page: u32, meta: Option<&PageMeta>) {
        self.page = page.max(1);
        if let Some(meta) = meta {
            if meta.limit > 0 {
                self.limit = meta.limit;
            }
            self.total_pages = meta.total_pages;
            self.total_results = meta.total_results;
        }
    }

    /// Treat the stream as ended at the current page
    ///
    /// Used when a load-more request answers 404: the backend signals the end
    /// of the list through status instead of metadata.
    pub fn mark_exhausted(&mut self) {
        self.total_pages = self.page;
    }

    /// Back to page 1, keeping the page size
    pub fn reset(&mut self) {
        *self = Self::new(self.limit);
    }
}

/// A list assembled from sequential pages
///
/// Applying page `n` truncates back to the end of page `n - 1` before
/// appending, so page 1 replaces, page `n + 1` appends and re-applying page
/// `n` is idempotent. Items whose key already appears earlier in the list
/// are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedList<T> {
    items: Vec<T>,
    page_starts: Vec<usize>,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page_starts: Vec::new(),
        }
    }
}

impl<T: Keyed> PagedList<T> {
    /// Empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `page` into the list
    ///
    /// A page beyond the next expected one is appended as the next page.
    pub fn apply_page(&mut self, page: u32, items: Vec<T>) {
        let index = (page.max(1) - 1) as usize;
        let index = index.min(self.page_starts.len());

        if let Some(&start) = self.page_starts.get(index) {
            self.items.truncate(start);
        }
        self.page_starts.truncate(index);
        self.page_starts.push(self.items.len());

        let mut seen: HashSet<T::Key> = self.items.iter().map(Keyed::key).collect();
        self.items.extend(items.into_iter().filter(|item| seen.insert(item.key())));
    }

    /// Drop every page
    pub fn clear(&mut self) {
        self.items.clear();
        self.page_starts.clear();
    }

    /// Items in display order
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no page has contributed items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of pages applied
    #[must_use]
    pub fn pages_loaded(&self) -> usize {
        self.page_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(u32);

    impl Keyed for Item {
        type Key = u32;

        fn key(&self) -> u32 {
            self.0
        }
    }

    fn items(ids: &[u32]) -> Vec<Item> {
        ids.iter().copied().map(Item).collect()
    }

    #[test]
    fn test_page_one_replaces_and_next_page_appends() {
        let mut list = PagedList::new();
        list.apply_page(1, items(&[1, 2]));
        list.apply_page(2, items(&[3, 4]));
        assert_eq!(list.items(), items(&[1, 2, 3, 4]).as_slice());

        list.apply_page(1, items(&[9]));
        assert_eq!(list.items(), items(&[9]).as_slice());
        assert_eq!(list.pages_loaded(), 1);
    }

    #[test]
    fn test_reapplying_page_is_idempotent() {
        let mut list = PagedList::new();
        list.apply_page(1, items(&[1, 2]));
        list.apply_page(2, items(&[3, 4]));
        list.apply_page(2, items(&[3, 4]));
        assert_eq!(list.items(), items(&[1, 2, 3, 4]).as_slice());
    }

    #[test]
    fn test_overlapping_pages_deduplicated() {
        let mut list = PagedList::new();
        list.apply_page(1, items(&[1, 2, 3]));
        list.apply_page(2, items(&[3, 4, 4, 5]));
        assert_eq!(list.items(), items(&[1, 2, 3, 4, 5]).as_slice());
    }

    #[test]
    fn test_can_load_more_predicate() {
        let mut pagination = Pagination::new(20);
        assert!(!pagination.can_load_more(false, false));

        pagination.record(1, Some(&PageMeta {
            page: 1,
            limit: 20,
            total_pages: 5,
            total_results: 90,
        }));
        assert!(pagination.can_load_more(false, false));
        assert!(!pagination.can_load_more(true, false));
        assert!(!pagination.can_load_more(false, true));

        pagination.record(5, None);
        assert!(!pagination.can_load_more(false, false));
        assert_eq!(pagination.total_results, 90);
    }

    #[test]
    fn test_mark_exhausted() {
        let mut pagination = Pagination::new(20);
        pagination.record(2, Some(&PageMeta {
            page: 2,
            limit: 20,
            total_pages: 7,
            total_results: 140,
        }));

        pagination.mark_exhausted();

        assert_eq!(pagination.page, pagination.total_pages);
        assert!(pagination.is_exhausted());
        assert!(!pagination.can_load_more(false, false));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Up to 6 pages of up to 8 distinct ids each
        fn arb_pages() -> impl Strategy<Value = Vec<Vec<u32>>> {
            prop::collection::vec(prop::collection::hash_set(0u32..200, 0..8), 1..6)
                .prop_map(|pages| pages.into_iter().map(|p| p.into_iter().collect()).collect())
        }

        proptest! {
            /// Re-fetching the last page reproduces the sequentially built list
            #[test]
            fn refetch_last_page_is_idempotent(pages in arb_pages()) {
                let mut list = PagedList::new();
                for (i, page) in pages.iter().enumerate() {
                    list.apply_page(u32::try_from(i + 1).unwrap_or(u32::MAX), items(page));
                }
                let sequential = list.clone();

                let last = pages.len();
                list.apply_page(u32::try_from(last).unwrap_or(u32::MAX), items(&pages[last - 1]));

                prop_assert_eq!(list, sequential);
            }

            /// No key ever appears twice
            #[test]
            fn keys_are_unique(pages in arb_pages()) {
                let mut list = PagedList::new();
                for (i, page) in pages.iter().enumerate() {
                    list.apply_page(u32::try_from(i + 1).unwrap_or(u32::MAX), items(page));
                }

                let mut seen = HashSet::new();
                prop_assert!(list.items().iter().all(|item| seen.insert(item.0)));
            }

            /// Page 1 always replaces whatever was loaded
            #[test]
            fn first_page_replaces(pages in arb_pages(), fresh in prop::collection::hash_set(0u32..200, 0..8)) {
                let mut list = PagedList::new();
                for (i, page) in pages.iter().enumerate() {
                    list.apply_page(u32::try_from(i + 1).unwrap_or(u32::MAX), items(page));
                }

                let fresh: Vec<u32> = fresh.into_iter().collect();
                list.apply_page(1, items(&fresh));

                let expected = items(&fresh);
                prop_assert_eq!(list.items(), expected.as_slice());
                prop_assert_eq!(list.pages_loaded(), 1);
            }
        }
    }
}
