//! url2pdf Library
//!
//! Renders web pages and inline HTML to PDF with a headless browser, and
//! short-circuits URLs that already point at a PDF.
//!
//! # Module Overview
//!
//! - [`options`] - render options, dotted-key un-flattening and default merging
//! - [`resolver`] - existing-PDF detection (extension, site rules, content-type probe)
//! - [`render`] - the render orchestrator with guaranteed page teardown
//! - [`browser`] - browser engine traits, scroll trigger and the Chromium backend
//! - [`server`] - axum HTTP surface (`/render`, `/healthz`)
//! - [`config`] - TOML service configuration
//! - [`telemetry`] - tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use url2pdf_lib::{normalize, PartialRenderOptions, RenderOptions, Renderer, ScrollPolicy};
//! use url2pdf_lib::{BrowserSettings, ChromiumEngine};
//!
//! # async fn example() -> url2pdf_lib::Result<()> {
//! let engine = ChromiumEngine::launch(&BrowserSettings::default()).await?;
//! let renderer = Renderer::new(Arc::new(engine), ScrollPolicy::default());
//!
//! let partial = PartialRenderOptions::from_pairs([
//!     ("url", "https://example.com"),
//!     ("pdf.format", "Letter"),
//! ])?;
//! let opts = normalize(partial, &RenderOptions::default());
//! let pdf = renderer.render(&opts).await?;
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod options;
pub mod render;
pub mod resolver;
pub mod server;
pub mod telemetry;
pub mod viewport;

pub use browser::scroll::{trigger_scroll, ScrollOutcome, ScrollPolicy};
pub use browser::{BrowserEngine, BrowserPage, MediaType, SessionOptions};
#[cfg(feature = "chromium")]
pub use browser::ChromiumEngine;
pub use config::{BrowserSettings, LogFormat, LoggingSettings, ProbeSettings, ServiceConfig};
pub use error::{ErrorCategory, ErrorPayload, RenderError, Result};
pub use options::{
    normalize, unflatten, validate_url, GotoOptions, NavigationTarget, PartialRenderOptions,
    PdfOptions, RenderOptions, WaitFor, WaitUntil,
};
pub use render::Renderer;
pub use resolver::{ContentTypeProbe, ExistingPdfResolver, HttpProbe, SiteRule, SiteRules};
pub use viewport::ViewportOptions;
