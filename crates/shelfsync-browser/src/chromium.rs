//! Chromium-backed driver using chromiumoxide.
//!
//! Each `launch` spawns a Chrome process bound to the caller's profile
//! directory and a background task draining CDP events. Element lookups
//! poll until the selector appears, since the site renders its sign-in UI
//! asynchronously.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::driver::{BrowserDriver, BrowserError, BrowserSession, Cookie, LaunchOptions};

/// How long element lookups poll before giving up.
const ELEMENT_WAIT: Duration = Duration::from_secs(10);
const ELEMENT_POLL: Duration = Duration::from_millis(250);

/// Production driver launching real Chrome/Chromium instances.
#[derive(Debug, Default)]
pub struct ChromiumDriver;

impl ChromiumDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn launch(
        &self,
        options: LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let session = ChromiumSession::launch(options).await?;
        Ok(Box::new(session))
    }
}

/// One Chrome process with a single active page.
pub struct ChromiumSession {
    page: Mutex<chromiumoxide::Page>,
    browser: Mutex<chromiumoxide::Browser>,
    handler: tokio::task::JoinHandle<()>,
}

impl ChromiumSession {
    async fn launch(options: LaunchOptions) -> Result<Self, BrowserError> {
        let mut builder = chromiumoxide::BrowserConfig::builder()
            .user_data_dir(&options.profile_dir)
            .window_size(options.viewport.0, options.viewport.1)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-dev-shm-usage");

        if options.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(|e| BrowserError::Launch(format!("config: {}", e)))?;

        let (browser, mut handler) = chromiumoxide::Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // Drain CDP events for the lifetime of the browser.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(format!("new page: {}", e)))?;

        page.set_user_agent(options.user_agent.as_str())
            .await
            .map_err(|e| BrowserError::Protocol(format!("set user agent: {}", e)))?;

        Ok(Self {
            page: Mutex::new(page),
            browser: Mutex::new(browser),
            handler: handler_task,
        })
    }

    /// Poll for an element until it appears or the wait budget is spent.
    async fn find_element(
        page: &chromiumoxide::Page,
        selector: &str,
    ) -> Result<chromiumoxide::Element, BrowserError> {
        let deadline = Instant::now() + ELEMENT_WAIT;
        loop {
            match page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(_) if Instant::now() < deadline => {
                    tokio::time::sleep(ELEMENT_POLL).await;
                }
                Err(_) => {
                    return Err(BrowserError::ElementNotFound {
                        selector: selector.to_string(),
                    })
                }
            }
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let page = self.page.lock().await;
        page.goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let page = self.page.lock().await;
        let element = Self::find_element(&page, selector).await?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::Protocol(format!("click {}: {}", selector, e)))?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let page = self.page.lock().await;
        let element = Self::find_element(&page, selector).await?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::Protocol(format!("focus {}: {}", selector, e)))?;
        element
            .type_str(value)
            .await
            .map_err(|e| BrowserError::Protocol(format!("type into {}: {}", selector, e)))?;
        Ok(())
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<String, BrowserError> {
        let page = self.page.lock().await;
        let element = Self::find_element(&page, selector).await?;
        element
            .attribute(name)
            .await
            .map_err(|e| BrowserError::Protocol(format!("attribute {}: {}", name, e)))?
            .ok_or_else(|| BrowserError::Protocol(format!("{} has no {} attribute", selector, name)))
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, BrowserError> {
        let page = self.page.lock().await;
        let cookies = page
            .get_cookies()
            .await
            .map_err(|e| BrowserError::Protocol(format!("get cookies: {}", e)))?;
        Ok(cookies
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
            })
            .collect())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("Browser close reported: {}", e);
        }
        self.handler.abort();
        Ok(())
    }
}
