//! Headless browser collaborator used by the render orchestrator.
//!
//! The orchestrator only sees the [`BrowserEngine`] and [`BrowserPage`] traits;
//! the Chromium implementation lives behind the `chromium` feature.
//!
//! # Module Structure
//!
//! - [`scroll`] - scroll-trigger protocol run against any [`BrowserPage`]
//! - `chromium` - DevTools-protocol engine backed by chromiumoxide

#[cfg(feature = "chromium")]
mod chromium;
pub mod scroll;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumEngine;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::options::{GotoOptions, NavigationTarget, PdfOptions, ViewportOptions};
use crate::Result;

/// CSS media type used when selecting stylesheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Screen,
    Print,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Screen => "screen",
            MediaType::Print => "print",
        }
    }
}

/// Per-session settings fixed when the page is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub ignore_https_errors: bool,
}

/// A launched browser able to hand out isolated pages.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Opens a fresh, isolated page. The caller must [`BrowserPage::close`] it.
    async fn new_page(&self, session: SessionOptions) -> Result<Box<dyn BrowserPage>>;
}

/// One browser page driven through a single render call.
#[async_trait]
pub trait BrowserPage: Send {
    async fn set_viewport(&mut self, viewport: &ViewportOptions) -> Result<()>;

    async fn emulate_media(&mut self, media: MediaType) -> Result<()>;

    /// Loads the target and waits according to the navigation policy.
    async fn goto(&mut self, target: NavigationTarget<'_>, policy: &GotoOptions) -> Result<()>;

    /// Waits until `selector` matches an element or `limit` elapses; `None`
    /// waits indefinitely.
    async fn wait_for_selector(&mut self, selector: &str, limit: Option<Duration>) -> Result<()>;

    /// Evaluates a JavaScript expression in the page, awaiting returned promises.
    async fn evaluate(&mut self, script: &str) -> Result<Value>;

    async fn pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>>;

    /// Releases the page. Called exactly once per page.
    async fn close(self: Box<Self>) -> Result<()>;
}
