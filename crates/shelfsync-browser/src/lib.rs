//! Browser automation capability for ShelfSync.
//!
//! The sync engine drives a browser through the [`BrowserDriver`] /
//! [`BrowserSession`] traits; production backs them with Chrome over the
//! DevTools Protocol (chromiumoxide), tests back them with a scripted fake.

pub mod chromium;
pub mod driver;
pub mod scripted;

pub use chromium::ChromiumDriver;
pub use driver::{BrowserDriver, BrowserError, BrowserSession, Cookie, LaunchOptions};
pub use scripted::{ScriptedDriver, ScriptedState};
