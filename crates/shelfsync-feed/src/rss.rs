//! RSS document shapes for the third-party book feed.
//!
//! The feed is plain RSS 2.0 with site-specific item extensions
//! (`book_id`, `user_shelves`, `author_name`). Unknown elements are
//! ignored during deserialization.

use serde::Deserialize;

use shelfsync_core::{Error, Result};

#[derive(Debug, Deserialize)]
pub struct Rss {
    pub channel: Channel,
}

#[derive(Debug, Deserialize)]
pub struct Channel {
    #[serde(default, rename = "item")]
    pub items: Vec<RawItem>,
}

/// One raw feed entry before normalization.
#[derive(Debug, Default, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub book_id: Option<String>,
    #[serde(default)]
    pub user_shelves: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
}

/// Parse a feed page into its raw items.
pub fn parse_feed_page(xml: &str) -> Result<Vec<RawItem>> {
    let rss: Rss =
        quick_xml::de::from_str(xml).map_err(|e| Error::FeedFetch(format!("parse: {}", e)))?;
    Ok(rss.channel.items)
}
