//! Scroll-trigger protocol.
//!
//! Scrolls the page down in fixed steps until the bottom is near, so that
//! lazy-loaded and on-scroll content materializes before the PDF is captured,
//! then returns to the top and lets the page settle. The whole protocol is
//! bounded by a ceiling; running past it yields [`ScrollOutcome::TimedOut`].

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{sleep_until, timeout_at, Instant};

use super::BrowserPage;
use crate::{RenderError, Result};

/// Script that puts the page back at the top.
pub(crate) const RESET_SCROLL_SCRIPT: &str = "window.scrollTo(0, 0); true";

/// Timing and distance constants of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrollPolicy {
    /// Each step scrolls by viewport height minus this many pixels.
    pub step_margin_px: u32,
    /// Scrolling stops once less than this many pixels remain below the viewport.
    pub bottom_threshold_px: u32,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    #[serde(with = "humantime_serde")]
    pub settle: Duration,
    #[serde(with = "humantime_serde")]
    pub ceiling: Duration,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            step_margin_px: 400,
            bottom_threshold_px: 400,
            interval: Duration::from_millis(200),
            settle: Duration::from_millis(500),
            ceiling: Duration::from_secs(30),
        }
    }
}

/// How the protocol ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    Completed { steps: u32 },
    TimedOut { steps: u32 },
}

impl ScrollOutcome {
    /// Converts a timeout into [`RenderError::ScrollTimeout`].
    pub fn into_result(self, policy: &ScrollPolicy) -> Result<u32> {
        match self {
            ScrollOutcome::Completed { steps } => Ok(steps),
            ScrollOutcome::TimedOut { .. } => Err(RenderError::ScrollTimeout(policy.ceiling)),
        }
    }
}

/// Page geometry reported after each step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub scroll_y: f64,
    pub inner_height: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    /// Pixels between the bottom of the viewport and the end of the document.
    pub fn remaining(&self) -> f64 {
        self.scroll_height - (self.scroll_y + self.inner_height)
    }
}

/// Script scrolling one step down and reporting the resulting geometry.
pub(crate) fn scroll_step_script(step_margin_px: u32) -> String {
    format!(
        "(() => {{ \
           const step = Math.max(window.innerHeight - {step_margin_px}, 1); \
           window.scrollBy(0, step); \
           const doc = document.scrollingElement || document.documentElement; \
           return {{ scrollY: window.scrollY, innerHeight: window.innerHeight, \
                     scrollHeight: Math.max(doc.scrollHeight, document.body ? document.body.scrollHeight : 0) }}; \
         }})()"
    )
}

/// Runs the protocol on `page`.
///
/// Script failures are returned as errors; running out of time is reported as
/// [`ScrollOutcome::TimedOut`].
pub async fn trigger_scroll(page: &mut dyn BrowserPage, policy: &ScrollPolicy) -> Result<ScrollOutcome> {
    let deadline = Instant::now() + policy.ceiling;
    let step_script = scroll_step_script(policy.step_margin_px);
    let threshold = f64::from(policy.bottom_threshold_px);
    let mut steps = 0;

    loop {
        let value = match timeout_at(deadline, page.evaluate(&step_script)).await {
            Ok(value) => value?,
            Err(_) => return Ok(ScrollOutcome::TimedOut { steps }),
        };
        steps += 1;

        let metrics: ScrollMetrics = serde_json::from_value(value).map_err(|err| {
            RenderError::browser(format!("unexpected scroll metrics from page: {err}"))
        })?;
        if metrics.remaining() < threshold {
            break;
        }

        let next = Instant::now() + policy.interval;
        if next >= deadline {
            sleep_until(deadline).await;
            return Ok(ScrollOutcome::TimedOut { steps });
        }
        sleep_until(next).await;
    }

    match timeout_at(deadline, page.evaluate(RESET_SCROLL_SCRIPT)).await {
        Ok(result) => {
            result?;
        }
        Err(_) => return Ok(ScrollOutcome::TimedOut { steps }),
    }

    let settled = Instant::now() + policy.settle;
    if settled > deadline {
        sleep_until(deadline).await;
        return Ok(ScrollOutcome::TimedOut { steps });
    }
    sleep_until(settled).await;

    Ok(ScrollOutcome::Completed { steps })
}
