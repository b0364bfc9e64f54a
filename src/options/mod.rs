//! Render options: the canonical configuration for one render call.
//!
//! - [`RenderOptions`] - fully populated record consumed by the orchestrator
//! - [`PartialRenderOptions`] - caller input where every leaf may be missing
//! - [`normalize`] - structural merge of partial input over the defaults
//! - [`unflatten`] - dotted query keys (`pdf.margin.top`) to a nested tree

mod flatten;
mod normalize;
mod partial;
mod units;

pub use flatten::unflatten;
pub use normalize::normalize;
pub use partial::{
    PartialGotoOptions, PartialMargin, PartialPdfOptions, PartialRenderOptions,
    PartialViewportOptions,
};
pub use units::{paper_size, Dimension};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::{RenderError, Result as RenderResult};

pub use crate::viewport::ViewportOptions;

/// Fully normalized configuration driving one render call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub url: Option<String>,
    pub html: Option<String>,
    pub attachment_name: Option<String>,
    pub scroll_page: bool,
    pub emulate_screen_media: bool,
    pub ignore_https_errors: bool,
    pub wait_for: Option<WaitFor>,
    pub viewport: ViewportOptions,
    pub goto: GotoOptions,
    pub pdf: PdfOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            url: None,
            html: None,
            attachment_name: None,
            scroll_page: false,
            emulate_screen_media: false,
            ignore_https_errors: false,
            wait_for: None,
            viewport: ViewportOptions::default(),
            goto: GotoOptions::default(),
            pdf: PdfOptions::default(),
        }
    }
}

impl RenderOptions {
    /// What the browser should load: inline markup wins over a URL.
    pub fn target(&self) -> Option<NavigationTarget<'_>> {
        match (&self.html, &self.url) {
            (Some(html), _) => Some(NavigationTarget::Html(html)),
            (None, Some(url)) => Some(NavigationTarget::Url(url)),
            (None, None) => None,
        }
    }
}

/// Parses a render target URL; only absolute `http`/`https` URLs are accepted.
pub fn validate_url(raw: &str) -> RenderResult<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RenderError::validation(format!(
            "url must use http or https, got '{other}'"
        ))),
    }
}

/// Page content handed to the browser's navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTarget<'a> {
    Url(&'a str),
    Html(&'a str),
}

impl fmt::Display for NavigationTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationTarget::Url(url) => write!(f, "{url}"),
            NavigationTarget::Html(html) => write!(f, "inline html ({} bytes)", html.len()),
        }
    }
}

/// Either a fixed delay or a selector the page must contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WaitFor {
    Delay(u64),
    Selector(String),
}

impl<'de> Deserialize<'de> for WaitFor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Millis(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => Ok(WaitFor::Delay(ms)),
            Raw::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(serde::de::Error::custom("waitFor must not be empty"));
                }
                match trimmed.parse::<u64>() {
                    Ok(ms) => Ok(WaitFor::Delay(ms)),
                    Err(_) => Ok(WaitFor::Selector(text)),
                }
            }
        }
    }
}

/// Lifecycle point at which navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitUntil {
    #[serde(rename = "load")]
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[serde(rename = "networkidle", alias = "networkidle0", alias = "networkidle2")]
    NetworkIdle,
}

/// Navigation completion policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GotoOptions {
    /// Milliseconds.
    pub timeout: u64,
    pub wait_until: WaitUntil,
    pub network_idle_inflight: u32,
    /// Milliseconds.
    pub network_idle_timeout: u64,
}

impl GotoOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Navigation and selector time limit; a zero timeout means no limit.
    pub fn time_limit(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| self.timeout())
    }

    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.network_idle_timeout)
    }
}

impl Default for GotoOptions {
    fn default() -> Self {
        Self {
            timeout: 30_000,
            wait_until: WaitUntil::NetworkIdle,
            network_idle_inflight: 2,
            network_idle_timeout: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub top: Dimension,
    pub right: Dimension,
    pub bottom: Dimension,
    pub left: Dimension,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: Dimension::zero(),
            right: Dimension::zero(),
            bottom: Dimension::zero(),
            left: Dimension::zero(),
        }
    }
}

/// PDF export policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOptions {
    pub scale: f64,
    pub display_header_footer: bool,
    pub landscape: bool,
    /// Empty means all pages.
    pub page_ranges: String,
    pub format: String,
    /// Overrides `format` only when `height` is set too.
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub margin: Margin,
    pub print_background: bool,
}

impl PdfOptions {
    /// Paper size in inches: explicit width/height win over the named format.
    pub fn paper_size_inches(&self) -> Result<(f64, f64), String> {
        if let (Some(width), Some(height)) = (&self.width, &self.height) {
            return Ok((width.to_inches()?, height.to_inches()?));
        }
        paper_size(&self.format).ok_or_else(|| format!("unknown paper format '{}'", self.format))
    }
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            display_header_footer: false,
            landscape: false,
            page_ranges: String::new(),
            format: "A4".to_string(),
            width: None,
            height: None,
            margin: Margin::default(),
            print_background: true,
        }
    }
}
