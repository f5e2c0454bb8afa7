//! Scripted driver for tests. Records every call and returns configurable
//! results, so protocol logic can be exercised without a real Chrome.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::driver::{BrowserDriver, BrowserError, BrowserSession, Cookie, LaunchOptions};

/// Shared state inspected by tests after the session under test has closed.
#[derive(Default)]
pub struct ScriptedState {
    /// Options of every launch, in order.
    pub launches: Mutex<Vec<LaunchOptions>>,
    /// Record of all session calls: (method, args).
    pub call_log: Mutex<Vec<(String, Vec<String>)>>,
    /// Attribute values keyed by (selector, attribute name).
    pub attributes: Mutex<HashMap<(String, String), String>>,
    /// Cookies returned by `cookies()`.
    pub cookies: Mutex<Vec<Cookie>>,
    /// If set, `launch` fails with this message.
    pub launch_error: Mutex<Option<String>>,
    /// If set, `navigate` fails with this message.
    pub navigate_error: Mutex<Option<String>>,
    /// If set, `click` fails with this message.
    pub click_error: Mutex<Option<String>>,
    /// Selectors for which `attribute` reports the element missing.
    pub missing_selectors: Mutex<Vec<String>>,
    /// If set, `close` fails with this message (once; cleared on first use).
    pub close_error: Mutex<Option<String>>,
    /// Whether `close` was called.
    pub closed: Mutex<bool>,
}

impl ScriptedState {
    pub fn set_attribute(
        &self,
        selector: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.attributes
            .lock()
            .unwrap()
            .insert((selector.into(), name.into()), value.into());
    }

    pub fn set_cookies(&self, cookies: Vec<Cookie>) {
        *self.cookies.lock().unwrap() = cookies;
    }

    pub fn fail_attribute_for(&self, selector: impl Into<String>) {
        self.missing_selectors.lock().unwrap().push(selector.into());
    }

    pub fn launch_count(&self) -> usize {
        self.launches.lock().unwrap().len()
    }

    pub fn closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }

    pub fn calls(&self, method: &str) -> Vec<Vec<String>> {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, args)| args.clone())
            .collect()
    }

    fn log(&self, method: &str, args: &[&str]) {
        self.call_log.lock().unwrap().push((
            method.to_string(),
            args.iter().map(|s| s.to_string()).collect(),
        ));
    }
}

/// Driver whose sessions replay the scripted state.
#[derive(Clone, Default)]
pub struct ScriptedDriver {
    pub state: Arc<ScriptedState>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn launch(
        &self,
        options: LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        if let Some(message) = self.state.launch_error.lock().unwrap().clone() {
            return Err(BrowserError::Launch(message));
        }
        self.state.launches.lock().unwrap().push(options);
        Ok(Box::new(ScriptedSession {
            state: self.state.clone(),
        }))
    }
}

pub struct ScriptedSession {
    state: Arc<ScriptedState>,
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.state.log("navigate", &[url]);
        if let Some(message) = self.state.navigate_error.lock().unwrap().clone() {
            return Err(BrowserError::Navigation(message));
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.state.log("click", &[selector]);
        if let Some(message) = self.state.click_error.lock().unwrap().clone() {
            return Err(BrowserError::Protocol(message));
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        self.state.log("fill", &[selector, value]);
        Ok(())
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<String, BrowserError> {
        self.state.log("attribute", &[selector, name]);
        if self
            .state
            .missing_selectors
            .lock()
            .unwrap()
            .iter()
            .any(|s| s == selector)
        {
            return Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        self.state
            .attributes
            .lock()
            .unwrap()
            .get(&(selector.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, BrowserError> {
        self.state.log("cookies", &[]);
        Ok(self.state.cookies.lock().unwrap().clone())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.state.log("close", &[]);
        if let Some(message) = self.state.close_error.lock().unwrap().take() {
            return Err(BrowserError::Protocol(message));
        }
        *self.state.closed.lock().unwrap() = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_and_replays_attributes() {
        let driver = ScriptedDriver::new();
        driver
            .state
            .set_attribute(".profile", "href", "https://example.com/user/show/42-jane");

        let session = driver
            .launch(LaunchOptions::new("/tmp/p".into(), true))
            .await
            .unwrap();
        session.navigate("https://example.com").await.unwrap();
        let href = session.attribute(".profile", "href").await.unwrap();
        session.close().await.unwrap();

        assert_eq!(href, "https://example.com/user/show/42-jane");
        assert_eq!(driver.state.launch_count(), 1);
        assert!(driver.state.closed());
        assert_eq!(
            driver.state.calls("navigate"),
            vec![vec!["https://example.com".to_string()]]
        );
    }

    #[tokio::test]
    async fn missing_attribute_reports_element_not_found() {
        let driver = ScriptedDriver::new();
        let session = driver
            .launch(LaunchOptions::new("/tmp/p".into(), true))
            .await
            .unwrap();
        let err = session.attribute(".absent", "href").await.unwrap_err();
        assert!(matches!(err, BrowserError::ElementNotFound { .. }));
    }
}
