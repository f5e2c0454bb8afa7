//! Feed ingestion: pagination, normalization, shelf folding, title sort.

use serde::Serialize;
use tracing::debug;

use shelfsync_core::{Error, Result};

use crate::rss::{parse_feed_page, RawItem};

/// Fixed feed page size. A page holding fewer items is the final page.
pub const PAGE_SIZE: usize = 100;

const DEFAULT_BASE_URL: &str = "https://www.goodreads.com";

/// Sentinel shelf label present for every user.
const ALL_SHELF: &str = "all";

/// A normalized book entry. Derived from the feed on every fetch, never
/// persisted. Field names match the wire contract.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Book {
    pub title: String,
    pub id: String,
    /// Shelf label(s) as the feed's comma-separated string.
    #[serde(rename = "shelve")]
    pub shelves: String,
    pub author: String,
}

/// Ordered, deduplicated set of shelf labels, seeded with `all`.
#[derive(Debug, Clone)]
pub struct ShelfSet {
    labels: Vec<String>,
}

impl ShelfSet {
    pub fn new() -> Self {
        Self {
            labels: vec![ALL_SHELF.to_string()],
        }
    }

    /// Insert a label, preserving first-seen order and suppressing
    /// duplicates and empties.
    pub fn insert(&mut self, label: &str) {
        let label = label.trim();
        if label.is_empty() {
            return;
        }
        if !self.labels.iter().any(|l| l == label) {
            self.labels.push(label.to_string());
        }
    }

    /// Fold in a comma-separated shelf string from one feed item.
    pub fn fold_item_shelves(&mut self, shelves: &str) {
        for label in shelves.split(',') {
            self.insert(label);
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.labels
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}

impl Default for ShelfSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetches and normalizes a user's public book feed.
pub struct FeedIngester {
    client: reqwest::Client,
    base_url: String,
}

impl FeedIngester {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the ingester at a different host (tests use a local mock).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch every feed page for a user and return the normalized books and
    /// the folded shelf set.
    ///
    /// Pagination stops exactly when a page yields fewer than [`PAGE_SIZE`]
    /// items. Books are sorted by title (case-folded, stable).
    pub async fn fetch_all_books(&self, user_id: &str) -> Result<(Vec<Book>, Vec<String>)> {
        let mut books = Vec::new();
        let mut shelves = ShelfSet::new();
        let mut page = 1u32;

        loop {
            let items = self.fetch_page(user_id, page).await?;
            let count = items.len();
            debug!("feed page {} for {}: {} items", page, user_id, count);

            for item in items {
                books.push(normalize(&item, &mut shelves));
            }

            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        books.sort_by_key(|b| b.title.to_lowercase());
        Ok((books, shelves.into_vec()))
    }

    async fn fetch_page(&self, user_id: &str, page: u32) -> Result<Vec<RawItem>> {
        // The first page is the bare feed URL; later pages add the query.
        let url = if page == 1 {
            format!("{}/review/list_rss/{}", self.base_url, user_id)
        } else {
            format!("{}/review/list_rss/{}?page={}", self.base_url, user_id, page)
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::FeedFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::FeedFetch(format!(
                "feed returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::FeedFetch(e.to_string()))?;
        parse_feed_page(&body)
    }
}

impl Default for FeedIngester {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(item: &RawItem, shelves: &mut ShelfSet) -> Book {
    let item_shelves = item.user_shelves.clone().unwrap_or_default();
    shelves.fold_item_shelves(&item_shelves);

    Book {
        title: item.title.clone().unwrap_or_default(),
        id: item.book_id.clone().unwrap_or_default(),
        shelves: item_shelves,
        author: item.author_name.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, id: &str, shelves: &str) -> RawItem {
        RawItem {
            title: Some(title.to_string()),
            book_id: Some(id.to_string()),
            user_shelves: Some(shelves.to_string()),
            author_name: Some("Author".to_string()),
        }
    }

    #[test]
    fn shelf_set_always_contains_all_and_dedupes() {
        let mut set = ShelfSet::new();
        set.fold_item_shelves("to-read, favourites");
        set.fold_item_shelves(" favourites ,to-read");
        set.fold_item_shelves("");

        assert_eq!(set.as_slice(), &["all", "to-read", "favourites"]);
    }

    #[test]
    fn normalize_keeps_the_raw_shelf_string() {
        let mut shelves = ShelfSet::new();
        let book = normalize(&item("Dune", "1", "sci-fi, to-read"), &mut shelves);
        assert_eq!(book.shelves, "sci-fi, to-read");
        assert_eq!(shelves.as_slice(), &["all", "sci-fi", "to-read"]);
    }

    #[test]
    fn books_sort_case_insensitively_and_stably() {
        let mut shelves = ShelfSet::new();
        let mut books: Vec<Book> = [
            item("zebra", "1", ""),
            item("Apple", "2", ""),
            item("apple", "3", ""),
            item("Banana", "4", ""),
        ]
        .iter()
        .map(|i| normalize(i, &mut shelves))
        .collect();

        books.sort_by_key(|b| b.title.to_lowercase());

        let order: Vec<(&str, &str)> = books
            .iter()
            .map(|b| (b.title.as_str(), b.id.as_str()))
            .collect();
        // Equal keys keep feed order: "Apple" (2) before "apple" (3).
        assert_eq!(
            order,
            vec![("Apple", "2"), ("apple", "3"), ("Banana", "4"), ("zebra", "1")]
        );
    }
}
