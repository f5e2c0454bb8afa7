//! Shared application state.

use std::sync::Arc;

use shelfsync_core::ShelfSyncConfig;
use shelfsync_feed::FeedIngester;
use shelfsync_store::{IdentityLocks, SessionStore};
use shelfsync_sync::{ProgressSyncer, SessionManager};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: ShelfSyncConfig,
    pub store: Arc<SessionStore>,
    /// Serializes operations per identity. Both connect and sync key their
    /// guard on the login username, so they cannot overlap for one person.
    pub locks: IdentityLocks,
    pub sessions: SessionManager,
    pub syncer: ProgressSyncer,
    pub feed: FeedIngester,
}

impl AppState {
    pub fn new(
        config: ShelfSyncConfig,
        store: Arc<SessionStore>,
        sessions: SessionManager,
        syncer: ProgressSyncer,
        feed: FeedIngester,
    ) -> Self {
        Self {
            config,
            store,
            locks: IdentityLocks::new(),
            sessions,
            syncer,
            feed,
        }
    }
}
