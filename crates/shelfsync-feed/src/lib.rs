//! Public feed ingestion — fetches a user's paginated RSS book feed,
//! normalizes entries, and folds shelf labels.

pub mod ingest;
pub mod rss;

pub use ingest::{Book, FeedIngester, ShelfSet, PAGE_SIZE};
