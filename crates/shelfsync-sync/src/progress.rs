//! Authenticated progress writes via session replay.
//!
//! Relaunches the persisted browser session headless, lifts the live
//! cookies and anti-forgery token from the authenticated profile page, and
//! issues one write request per book. Per-item failures are tallied, not
//! thrown; only setup failures abort the whole operation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use shelfsync_browser::driver::cookie_header;
use shelfsync_browser::{BrowserDriver, BrowserSession, LaunchOptions};
use shelfsync_core::{Error, Result};
use shelfsync_store::{ProfileRoot, SessionStore};

const DEFAULT_BASE_URL: &str = "https://www.goodreads.com";

const CSRF_META: &str = "meta[name=\"csrf-token\"]";

/// One progress-sync request.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub user_id: String,
    pub book_ids: Vec<String>,
    /// Progress percentages, parallel to `book_ids`.
    pub progress: Vec<f64>,
}

/// Aggregated result of a sync. Only the most recent failure is retained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOutcome {
    pub success_count: usize,
    pub last_error: Option<String>,
}

impl SyncOutcome {
    /// Human-readable summary used by the HTTP surface.
    pub fn message(&self) -> String {
        match &self.last_error {
            Some(err) => format!("Synced {} Books successfully\n{}", self.success_count, err),
            None => format!("Synced {} Books successfully", self.success_count),
        }
    }
}

/// Extension point for the per-item write loop.
///
/// Writes stay sequential in input order (the last-error-wins aggregation
/// depends on it); the policy only controls per-item retries.
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            retry_attempts: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Replays a stored session to push reading progress upstream.
pub struct ProgressSyncer {
    driver: Arc<dyn BrowserDriver>,
    store: Arc<SessionStore>,
    profiles: ProfileRoot,
    client: reqwest::Client,
    base_url: String,
    policy: SyncPolicy,
}

impl ProgressSyncer {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        store: Arc<SessionStore>,
        profiles: ProfileRoot,
    ) -> Self {
        Self {
            driver,
            store,
            profiles,
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            policy: SyncPolicy::default(),
        }
    }

    /// Point the syncer at a different host (tests use a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Push progress for each requested book, sequentially, in input order.
    pub async fn sync_progress(&self, request: &SyncRequest) -> Result<SyncOutcome> {
        let identity = self
            .store
            .get(&request.user_id)?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        if request.book_ids.is_empty() {
            return Err(Error::Validation("Missing books id".to_string()));
        }
        if request.progress.len() != request.book_ids.len() {
            return Err(Error::Validation("Missing books progress".to_string()));
        }

        let options = LaunchOptions::new(self.profiles.dir_for(&identity.username), true);
        let session = self
            .driver
            .launch(options)
            .await
            .map_err(|e| Error::Sync(e.to_string()))?;

        let (cookies, token) = match self.read_auth_artifacts(session.as_ref(), &request.user_id).await
        {
            Ok(artifacts) => artifacts,
            Err(err) => {
                if let Err(close_err) = session.close().await {
                    warn!("Browser close after sync setup failure: {}", close_err);
                }
                return Err(err);
            }
        };

        let mut outcome = SyncOutcome::default();
        for (book_id, percent) in request.book_ids.iter().zip(request.progress.iter()) {
            self.write_one(&cookies, &token, book_id, *percent, &mut outcome)
                .await;
        }

        if let Err(e) = session.close().await {
            warn!("Browser close after sync: {}", e);
        }

        Ok(outcome)
    }

    /// Steps 1-2: navigate the authenticated profile page and lift the
    /// cookies plus anti-forgery token. Failures here abort the operation.
    async fn read_auth_artifacts(
        &self,
        session: &dyn BrowserSession,
        user_id: &str,
    ) -> Result<(String, String)> {
        let sync_err = |e: shelfsync_browser::BrowserError| Error::Sync(e.to_string());

        session
            .navigate(&format!("{}/user/show/{}", self.base_url, user_id))
            .await
            .map_err(sync_err)?;
        let cookies = session.cookies().await.map_err(sync_err)?;
        let token = session.attribute(CSRF_META, "content").await.map_err(sync_err)?;

        Ok((cookie_header(&cookies), token))
    }

    /// One per-book write, honoring the retry policy. Never fails the loop:
    /// a terminal non-200 or transport error overwrites `last_error`.
    async fn write_one(
        &self,
        cookies: &str,
        token: &str,
        book_id: &str,
        percent: f64,
        outcome: &mut SyncOutcome,
    ) {
        let mut attempt = 0u32;
        loop {
            match self.send_write(cookies, token, book_id, percent).await {
                // The write endpoint signals success with 200 only; other
                // 2xx responses mean the update was not applied.
                Ok(status) if status == reqwest::StatusCode::OK => {
                    outcome.success_count += 1;
                    return;
                }
                Ok(status) => {
                    if attempt < self.policy.retry_attempts {
                        attempt += 1;
                        tokio::time::sleep(self.policy.retry_backoff).await;
                        continue;
                    }
                    debug!("write for book {} failed: HTTP {}", book_id, status);
                    outcome.last_error = Some(format!("Error on Book {}: {}", book_id, status));
                    return;
                }
                Err(e) => {
                    if attempt < self.policy.retry_attempts {
                        attempt += 1;
                        tokio::time::sleep(self.policy.retry_backoff).await;
                        continue;
                    }
                    outcome.last_error = Some(format!("Error on Book {}: {}", book_id, e));
                    return;
                }
            }
        }
    }

    async fn send_write(
        &self,
        cookies: &str,
        token: &str,
        book_id: &str,
        percent: f64,
    ) -> std::result::Result<reqwest::StatusCode, reqwest::Error> {
        let percent = format_percent(percent);
        let response = self
            .client
            .post(format!("{}/user_status.json", self.base_url))
            .header("cookie", cookies)
            .header("x-csrf-token", token)
            .header("x-requested-with", "XMLHttpRequest")
            .form(&[
                ("user_status[book_id]", book_id),
                ("user_status[body]", ""),
                ("user_status[percent]", percent.as_str()),
            ])
            .send()
            .await?;
        Ok(response.status())
    }
}

/// Render whole-number percentages without a trailing `.0`.
fn format_percent(percent: f64) -> String {
    if percent.fract() == 0.0 {
        format!("{}", percent as i64)
    } else {
        percent.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_message_formats() {
        let ok = SyncOutcome {
            success_count: 2,
            last_error: None,
        };
        assert_eq!(ok.message(), "Synced 2 Books successfully");

        let partial = SyncOutcome {
            success_count: 1,
            last_error: Some("Error on Book b2: 404 Not Found".to_string()),
        };
        assert_eq!(
            partial.message(),
            "Synced 1 Books successfully\nError on Book b2: 404 Not Found"
        );
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(50.0), "50");
        assert_eq!(format_percent(100.0), "100");
        assert_eq!(format_percent(33.5), "33.5");
    }
}
