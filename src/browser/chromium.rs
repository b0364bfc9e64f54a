//! Chromium engine driven over the DevTools protocol with chromiumoxide.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    ScreenOrientation, ScreenOrientationType, SetDeviceMetricsOverrideParams,
    SetEmulatedMediaParams, SetTouchEmulationEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::browser_protocol::security::SetIgnoreCertificateErrorsParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, timeout_at, Instant};
use tracing::{debug, warn};

use super::{BrowserEngine, BrowserPage, MediaType, SessionOptions};
use crate::config::BrowserSettings;
use crate::options::{Dimension, GotoOptions, NavigationTarget, PdfOptions, ViewportOptions, WaitUntil};
use crate::{RenderError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A launched Chromium process shared by all renders.
pub struct ChromiumEngine {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumEngine {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder().request_timeout(settings.request_timeout);
        if !settings.headless {
            builder = builder.with_head();
        }
        if settings.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &settings.executable {
            builder = builder.chrome_executable(path);
        }
        for arg in &settings.args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder
            .build()
            .map_err(|err| RenderError::browser(format!("invalid browser launch config: {err}")))?;

        let (browser, mut handler) = timeout(settings.launch_timeout, Browser::launch(config))
            .await
            .map_err(|_| {
                RenderError::browser(format!(
                    "browser did not launch within {:?}",
                    settings.launch_timeout
                ))
            })?
            .map_err(|err| RenderError::browser(format!("failed to launch browser: {err}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "browser handler event failed");
                }
            }
        });

        debug!(executable = ?settings.executable, headless = settings.headless, "browser launched");
        Ok(Self { browser, handler })
    }
}

impl Drop for ChromiumEngine {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    async fn new_page(&self, session: SessionOptions) -> Result<Box<dyn BrowserPage>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|err| RenderError::browser(format!("failed to open page: {err}")))?;

        let mut chromium_page = ChromiumPage {
            page,
            activity: Arc::new(Mutex::new(NetworkActivity::default())),
            tracker: None,
        };

        // From here on the page is owned by the caller's close(); release it on setup failure.
        if let Err(err) = chromium_page.prepare(session).await {
            if let Err(close_err) = Box::new(chromium_page).close().await {
                warn!(error = %close_err, "failed to close page after setup error");
            }
            return Err(err);
        }
        Ok(Box::new(chromium_page))
    }
}

struct ChromiumPage {
    page: Page,
    activity: Arc<Mutex<NetworkActivity>>,
    tracker: Option<JoinHandle<()>>,
}

impl ChromiumPage {
    async fn prepare(&mut self, session: SessionOptions) -> Result<()> {
        if session.ignore_https_errors {
            let params = SetIgnoreCertificateErrorsParams::builder()
                .ignore(true)
                .build()
                .map_err(RenderError::browser)?;
            self.page.execute(params).await.map_err(cdp_error)?;
        }
        self.tracker = Some(self.track_network().await?);
        Ok(())
    }

    /// Keeps the in-flight request set current for the `networkidle` policy.
    async fn track_network(&self) -> Result<JoinHandle<()>> {
        let mut started = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(cdp_error)?;
        let mut finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(cdp_error)?;
        let mut failed = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(cdp_error)?;

        let activity = Arc::clone(&self.activity);
        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = started.next() => {
                        record(&activity, |state| state.started(event.request_id.inner()));
                    }
                    Some(event) = finished.next() => {
                        record(&activity, |state| state.finished(event.request_id.inner()));
                    }
                    Some(event) = failed.next() => {
                        record(&activity, |state| state.finished(event.request_id.inner()));
                    }
                    else => break,
                }
            }
        }))
    }

    fn inflight(&self) -> usize {
        self.activity
            .lock()
            .map(|state| state.inflight())
            .unwrap_or(0)
    }

    /// Resolves once at most `max_inflight` requests have been pending for `quiet`.
    async fn network_idle(&self, max_inflight: usize, quiet: Duration) {
        let mut idle_since: Option<Instant> = None;
        loop {
            let now = Instant::now();
            if self.inflight() <= max_inflight {
                let since = *idle_since.get_or_insert(now);
                if now.duration_since(since) >= quiet {
                    return;
                }
            } else {
                idle_since = None;
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn selector_present(&mut self, selector: &str) -> Result<bool> {
        let script = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        Ok(self.evaluate(&script).await?.as_bool().unwrap_or(false))
    }
}

fn record(activity: &Mutex<NetworkActivity>, update: impl FnOnce(&mut NetworkActivity)) {
    if let Ok(mut state) = activity.lock() {
        update(&mut state);
    }
}

fn cdp_error(err: chromiumoxide::error::CdpError) -> RenderError {
    RenderError::browser(err.to_string())
}

/// Whether another poll would overrun `deadline`; never true without one.
fn poll_expired(deadline: Option<Instant>, now: Instant) -> bool {
    deadline.is_some_and(|deadline| now + POLL_INTERVAL > deadline)
}

/// Runs `fut` to completion or until `deadline`; `None` means it timed out.
async fn until<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn set_viewport(&mut self, viewport: &ViewportOptions) -> Result<()> {
        let mut builder = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(viewport.device_scale_factor)
            .mobile(viewport.is_mobile);
        if viewport.is_landscape {
            builder = builder.screen_orientation(ScreenOrientation {
                r#type: ScreenOrientationType::LandscapePrimary,
                angle: 90,
            });
        }
        let params = builder.build().map_err(RenderError::browser)?;
        self.page.execute(params).await.map_err(cdp_error)?;

        if viewport.has_touch {
            let touch = SetTouchEmulationEnabledParams::builder()
                .enabled(true)
                .build()
                .map_err(RenderError::browser)?;
            self.page.execute(touch).await.map_err(cdp_error)?;
        }
        Ok(())
    }

    async fn emulate_media(&mut self, media: MediaType) -> Result<()> {
        let params = SetEmulatedMediaParams::builder().media(media.as_str()).build();
        self.page.execute(params).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn goto(&mut self, target: NavigationTarget<'_>, policy: &GotoOptions) -> Result<()> {
        let deadline = policy.time_limit().map(|limit| Instant::now() + limit);
        let label = target.to_string();

        let load = async {
            match target {
                NavigationTarget::Url(url) => self.page.goto(url).await.map(|_| ()),
                NavigationTarget::Html(html) => self.page.set_content(html).await.map(|_| ()),
            }
        };
        match until(deadline, load).await {
            Some(Ok(())) => {}
            Some(Err(err)) => return Err(RenderError::navigation(label, err.to_string())),
            None => {
                return Err(RenderError::navigation(
                    label,
                    format!("timed out after {}ms", policy.timeout),
                ))
            }
        }

        if policy.wait_until == WaitUntil::NetworkIdle {
            let max_inflight = policy.network_idle_inflight as usize;
            let idle = self.network_idle(max_inflight, policy.network_idle_timeout());
            if until(deadline, idle).await.is_none() {
                return Err(RenderError::navigation(
                    label,
                    format!(
                        "timed out after {}ms waiting for network idle ({} requests in flight)",
                        policy.timeout,
                        self.inflight()
                    ),
                ));
            }
        }
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, limit: Option<Duration>) -> Result<()> {
        let deadline = limit.map(|limit| Instant::now() + limit);
        loop {
            if self.selector_present(selector).await? {
                return Ok(());
            }
            if poll_expired(deadline, Instant::now()) {
                let waited = limit.unwrap_or_default().as_millis();
                return Err(RenderError::navigation(
                    format!("selector '{selector}'"),
                    format!("not found within {waited}ms"),
                ));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(RenderError::browser)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|err| RenderError::browser(format!("script evaluation failed: {err}")))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>> {
        let params = print_params(options)?;
        self.page
            .pdf(params)
            .await
            .map_err(|err| RenderError::export(err.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumPage { page, tracker, .. } = *self;
        if let Some(tracker) = tracker {
            tracker.abort();
        }
        page.close()
            .await
            .map_err(|err| RenderError::browser(format!("failed to close page: {err}")))
    }
}

/// Maps export options onto `Page.printToPDF`; sizes are in inches.
fn print_params(options: &PdfOptions) -> Result<PrintToPdfParams> {
    let (paper_width, paper_height) = options.paper_size_inches().map_err(RenderError::export)?;
    let inches = |dimension: &Dimension| dimension.to_inches().map_err(RenderError::export);

    let mut builder = PrintToPdfParams::builder()
        .landscape(options.landscape)
        .display_header_footer(options.display_header_footer)
        .print_background(options.print_background)
        .scale(options.scale)
        .paper_width(paper_width)
        .paper_height(paper_height)
        .margin_top(inches(&options.margin.top)?)
        .margin_right(inches(&options.margin.right)?)
        .margin_bottom(inches(&options.margin.bottom)?)
        .margin_left(inches(&options.margin.left)?);
    if !options.page_ranges.is_empty() {
        builder = builder.page_ranges(options.page_ranges.clone());
    }
    Ok(builder.build())
}

/// Requests that have started but neither finished nor failed.
#[derive(Debug, Default)]
struct NetworkActivity {
    pending: HashSet<String>,
}

impl NetworkActivity {
    fn started(&mut self, request_id: &str) {
        self.pending.insert(request_id.to_string());
    }

    fn finished(&mut self, request_id: &str) {
        self.pending.remove(request_id);
    }

    fn inflight(&self) -> usize {
        self.pending.len()
    }
}
