//! Browser driver traits and shared types.
//!
//! The surface is deliberately small: the sync engine only navigates, clicks,
//! fills form fields, reads element attributes, and collects cookies.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// User agent presented to the third-party site during automation.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/44.0.2403.157 Safari/537.36";

/// Default viewport, matching what the site renders its full sign-in UI at.
pub const DEFAULT_VIEWPORT: (u32, u32) = (1080, 1024);

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Options for launching a browser instance.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// User data directory persisting cookies and local storage.
    pub profile_dir: PathBuf,
    pub headless: bool,
    pub user_agent: String,
    pub viewport: (u32, u32),
}

impl LaunchOptions {
    pub fn new(profile_dir: PathBuf, headless: bool) -> Self {
        Self {
            profile_dir,
            headless,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport: DEFAULT_VIEWPORT,
        }
    }
}

/// A browser cookie, reduced to what the write endpoint needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Join cookies into a `Cookie` request header value.
pub fn cookie_header(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Launches browser instances against a profile directory.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn launch(
        &self,
        options: LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// One live browser instance with a single active page.
///
/// Instances are heavyweight OS resources; callers must `close` on every
/// exit path.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate the page to the given URL.
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// Click the element matching the CSS selector, waiting for it to appear.
    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    /// Fill a form field, waiting for it to appear.
    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError>;

    /// Read an attribute of the element matching the selector, waiting for
    /// the element to appear. Fails if the attribute is absent.
    async fn attribute(&self, selector: &str, name: &str) -> Result<String, BrowserError>;

    /// Collect the page's current cookies.
    async fn cookies(&self) -> Result<Vec<Cookie>, BrowserError>;

    /// Close the browser and release its profile directory.
    async fn close(&self) -> Result<(), BrowserError>;
}
