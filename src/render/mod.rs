//! Render orchestration: drives one browser page from options to PDF bytes.
//!
//! Steps run strictly in order: viewport, media emulation, delay, navigation,
//! selector wait, scroll trigger, export. The page is closed exactly once on
//! every path, including failures in any step.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::browser::scroll::{trigger_scroll, ScrollPolicy};
use crate::browser::{BrowserEngine, BrowserPage, MediaType, SessionOptions};
use crate::options::{RenderOptions, WaitFor};
use crate::{RenderError, Result};

/// Runs render calls against a shared [`BrowserEngine`].
#[derive(Clone)]
pub struct Renderer {
    engine: Arc<dyn BrowserEngine>,
    scroll: ScrollPolicy,
}

impl Renderer {
    pub fn new(engine: Arc<dyn BrowserEngine>, scroll: ScrollPolicy) -> Self {
        Self { engine, scroll }
    }

    pub fn scroll_policy(&self) -> &ScrollPolicy {
        &self.scroll
    }

    /// Renders `opts` to PDF bytes.
    ///
    /// A step failure is returned even if closing the page fails as well; a
    /// close failure after a successful export is only logged.
    pub async fn render(&self, opts: &RenderOptions) -> Result<Vec<u8>> {
        if opts.target().is_none() {
            return Err(RenderError::validation("Render options must contain url or html"));
        }

        let started = Instant::now();
        let session = SessionOptions {
            ignore_https_errors: opts.ignore_https_errors,
        };
        let mut page = self.engine.new_page(session).await?;

        let outcome = self.run_steps(page.as_mut(), opts).await;

        if let Err(close_err) = page.close().await {
            warn!(error = %close_err, "failed to close browser page");
        }

        match &outcome {
            Ok(pdf) => info!(
                bytes = pdf.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "render completed"
            ),
            Err(err) => debug!(error = %err, "render failed"),
        }
        outcome
    }

    async fn run_steps(&self, page: &mut dyn BrowserPage, opts: &RenderOptions) -> Result<Vec<u8>> {
        // checked by the caller
        let target = opts
            .target()
            .ok_or_else(|| RenderError::validation("Render options must contain url or html"))?;

        debug!(viewport = %opts.viewport, "setting viewport");
        page.set_viewport(&opts.viewport).await?;

        if opts.emulate_screen_media {
            debug!("emulating screen media");
            page.emulate_media(MediaType::Screen).await?;
        }

        if let Some(WaitFor::Delay(ms)) = &opts.wait_for {
            debug!(ms, "waiting before navigation");
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }

        debug!(%target, wait_until = ?opts.goto.wait_until, "navigating");
        page.goto(target, &opts.goto).await?;

        if let Some(WaitFor::Selector(selector)) = &opts.wait_for {
            debug!(selector = %selector, "waiting for selector");
            page.wait_for_selector(selector, opts.goto.time_limit()).await?;
        }

        if opts.scroll_page {
            let steps = trigger_scroll(page, &self.scroll)
                .await?
                .into_result(&self.scroll)?;
            debug!(steps, "scroll trigger finished");
        }

        debug!("exporting pdf");
        page.pdf(&opts.pdf).await
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("scroll", &self.scroll)
            .finish_non_exhaustive()
    }
}
