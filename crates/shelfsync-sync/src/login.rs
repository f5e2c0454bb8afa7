//! Interactive login against the third-party site.
//!
//! Drives the sign-in UI in a headed browser bound to the user's profile
//! directory, derives the stable external user id from the authenticated
//! profile menu, and persists the identity. Any failure rolls the profile
//! directory and store entry back so a half-created session never survives.

use std::sync::Arc;

use tracing::{info, warn};

use shelfsync_browser::{BrowserDriver, BrowserSession, LaunchOptions};
use shelfsync_core::{codec, Error, Result};
use shelfsync_store::{ExternalIdentity, ProfileRoot, SessionStore};

const DEFAULT_BASE_URL: &str = "https://www.goodreads.com";

const SIGN_IN_BUTTON: &str = ".authPortalSignInButton";
const EMAIL_FIELD: &str = "#ap_email.auth-required-field";
const PASSWORD_FIELD: &str = "#ap_password.auth-required-field";
const SUBMIT_BUTTON: &str = "#signInSubmit";
const PROFILE_MENU: &str = ".dropdown__trigger--profileMenu";

/// Establishes and persists authenticated sessions.
pub struct SessionManager {
    driver: Arc<dyn BrowserDriver>,
    store: Arc<SessionStore>,
    profiles: ProfileRoot,
    base_url: String,
}

impl SessionManager {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        store: Arc<SessionStore>,
        profiles: ProfileRoot,
    ) -> Self {
        Self {
            driver,
            store,
            profiles,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the manager at a different host (tests use a scripted driver,
    /// so this only affects the URLs it records).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Log in as `username` and return the discovered external user id.
    ///
    /// `secret` arrives in its transmitted (encoded) form. With
    /// `force = false`, an existing stored identity whose profile directory
    /// is still on disk is reused without launching a browser; otherwise the
    /// old profile is discarded and a clean login is performed.
    pub async fn authenticate(
        &self,
        username: &str,
        secret: &str,
        force: bool,
    ) -> Result<String> {
        if username.trim().is_empty() || secret.is_empty() {
            return Err(Error::Validation("Missing user or pass".to_string()));
        }

        if !force {
            if let Some(existing) = self.store.find_by_username(username)? {
                if self.profiles.exists(username) {
                    info!(
                        "Reusing stored session {} for {}",
                        existing.external_user_id, username
                    );
                    return Ok(existing.external_user_id);
                }
            }
        }

        let password = codec::decode(secret);

        // Destructive by design: any previous session for this username is
        // discarded before the new attempt.
        self.profiles
            .remove(username)
            .map_err(|e| Error::Authentication(e.to_string()))?;

        let options = LaunchOptions::new(self.profiles.dir_for(username), false);
        let session = self
            .driver
            .launch(options)
            .await
            .map_err(|e| Error::Authentication(e.to_string()))?;

        let mut attempted_id: Option<String> = None;
        match self
            .drive_login(session.as_ref(), username, secret, &password, &mut attempted_id)
            .await
        {
            Ok(user_id) => {
                info!("Authenticated {} as external user {}", username, user_id);
                Ok(user_id)
            }
            Err(err) => {
                self.rollback(session.as_ref(), username, attempted_id.as_deref())
                    .await;
                match err {
                    Error::Authentication(_) => Err(err),
                    other => Err(Error::Authentication(other.to_string())),
                }
            }
        }
    }

    /// The fallible portion of the login flow: UI interaction, identifier
    /// extraction, persistence, browser shutdown.
    async fn drive_login(
        &self,
        session: &dyn BrowserSession,
        username: &str,
        secret: &str,
        password: &str,
        attempted_id: &mut Option<String>,
    ) -> Result<String> {
        let auth = |e: shelfsync_browser::BrowserError| Error::Authentication(e.to_string());

        session
            .navigate(&format!("{}/user/sign_in", self.base_url))
            .await
            .map_err(auth)?;
        session.click(SIGN_IN_BUTTON).await.map_err(auth)?;
        session.fill(EMAIL_FIELD, username).await.map_err(auth)?;
        session.fill(PASSWORD_FIELD, password).await.map_err(auth)?;
        session.click(SUBMIT_BUTTON).await.map_err(auth)?;

        let href = session.attribute(PROFILE_MENU, "href").await.map_err(auth)?;
        let user_id = extract_external_id(&href).ok_or_else(|| {
            Error::Authentication(format!("could not derive user id from {}", href))
        })?;
        *attempted_id = Some(user_id.clone());

        self.store.put(&ExternalIdentity {
            external_user_id: user_id.clone(),
            username: username.to_string(),
            secret: secret.to_string(),
        })?;

        session
            .close()
            .await
            .map_err(|e| Error::Authentication(format!("browser close: {}", e)))?;

        Ok(user_id)
    }

    /// Best-effort cleanup after a failed attempt. Must not mask the
    /// original error.
    async fn rollback(
        &self,
        session: &dyn BrowserSession,
        username: &str,
        attempted_id: Option<&str>,
    ) {
        if let Err(e) = session.close().await {
            warn!("Rollback browser close failed: {}", e);
        }
        self.profiles.remove_best_effort(username);
        if let Some(id) = attempted_id {
            if let Err(e) = self.store.delete(id) {
                warn!("Rollback store delete for {} failed: {}", id, e);
            }
        }
    }
}

/// Derive the external user id from the profile menu link: the last path
/// segment up to its first hyphen (`.../user/show/12345-jane-doe` -> `12345`).
pub fn extract_external_id(href: &str) -> Option<String> {
    let segment = href.trim_end_matches('/').rsplit('/').next()?;
    let id = segment.split('-').next()?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_before_first_hyphen() {
        assert_eq!(
            extract_external_id("https://www.goodreads.com/user/show/12345-jane-doe"),
            Some("12345".to_string())
        );
        assert_eq!(
            extract_external_id("https://www.goodreads.com/user/show/9"),
            Some("9".to_string())
        );
        // Hyphenless trailing slash still resolves the last real segment.
        assert_eq!(
            extract_external_id("https://www.goodreads.com/user/show/42-a-b-c/"),
            Some("42".to_string())
        );
        assert_eq!(extract_external_id(""), None);
    }
}
