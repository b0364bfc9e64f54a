use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use url2pdf_lib::options::NavigationTarget;
use url2pdf_lib::server::{build_router, AppState};
use url2pdf_lib::{
    BrowserEngine, BrowserPage, ContentTypeProbe, ExistingPdfResolver, GotoOptions, MediaType,
    PdfOptions, RenderError, RenderOptions, Renderer, Result, ScrollPolicy, SessionOptions,
    ViewportOptions,
};

const FAKE_PDF: &[u8] = b"%PDF-1.7 fake";

/// What the mock browser was asked to load and export.
#[derive(Default)]
struct Recorder {
    pages: AtomicUsize,
    closes: AtomicUsize,
    targets: Mutex<Vec<String>>,
    formats: Mutex<Vec<String>>,
}

struct MockEngine {
    recorder: Arc<Recorder>,
    fail_goto: bool,
}

#[async_trait]
impl BrowserEngine for MockEngine {
    async fn new_page(&self, _session: SessionOptions) -> Result<Box<dyn BrowserPage>> {
        self.recorder.pages.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPage {
            recorder: self.recorder.clone(),
            fail_goto: self.fail_goto,
        }))
    }
}

struct MockPage {
    recorder: Arc<Recorder>,
    fail_goto: bool,
}

#[async_trait]
impl BrowserPage for MockPage {
    async fn set_viewport(&mut self, _viewport: &ViewportOptions) -> Result<()> {
        Ok(())
    }

    async fn emulate_media(&mut self, _media: MediaType) -> Result<()> {
        Ok(())
    }

    async fn goto(&mut self, target: NavigationTarget<'_>, _policy: &GotoOptions) -> Result<()> {
        let label = match target {
            NavigationTarget::Url(url) => format!("url:{url}"),
            NavigationTarget::Html(html) => format!("html:{html}"),
        };
        self.recorder.targets.lock().unwrap().push(label.clone());
        if self.fail_goto {
            return Err(RenderError::navigation(label, "net::ERR_CONNECTION_REFUSED"));
        }
        Ok(())
    }

    async fn wait_for_selector(&mut self, _selector: &str, _limit: Option<Duration>) -> Result<()> {
        Ok(())
    }

    async fn evaluate(&mut self, _script: &str) -> Result<Value> {
        Ok(json!({ "scrollY": 0, "innerHeight": 1200, "scrollHeight": 1200 }))
    }

    async fn pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>> {
        self.recorder.formats.lock().unwrap().push(options.format.clone());
        Ok(FAKE_PDF.to_vec())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.recorder.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockProbe {
    content_type: Option<&'static str>,
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl ContentTypeProbe for MockProbe {
    async fn content_type(&self, url: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RenderError::probe(url, "dns error"));
        }
        Ok(self.content_type.map(str::to_string))
    }
}

struct Harness {
    app: Router,
    recorder: Arc<Recorder>,
    probe: Arc<MockProbe>,
}

fn harness_with(content_type: Option<&'static str>, fail_probe: bool, fail_goto: bool) -> Harness {
    let recorder = Arc::new(Recorder::default());
    let probe = Arc::new(MockProbe {
        content_type,
        fail: fail_probe,
        calls: AtomicUsize::new(0),
    });
    let engine = Arc::new(MockEngine {
        recorder: recorder.clone(),
        fail_goto,
    });
    let state = AppState::new(
        RenderOptions::default(),
        ExistingPdfResolver::with_probe(probe.clone()),
        Renderer::new(engine, ScrollPolicy::default()),
    );
    Harness {
        app: build_router(state),
        recorder,
        probe,
    }
}

fn harness() -> Harness {
    harness_with(Some("text/html; charset=utf-8"), false, false)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec();
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

fn post(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .expect("request should build")
}

fn error_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("error body should be json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let h = harness();
    let (status, _, body) = send(&h.app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn post_empty_json_body_is_rejected() {
    let h = harness();
    let (status, _, body) = send(&h.app, post("/render", "application/json", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json = error_json(&body);
    assert_eq!(json["message"], "Body must contain url or html");
    assert_eq!(json["category"], "validation");
    assert_eq!(h.recorder.pages.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_html_body_with_url_query_is_rejected() {
    let h = harness();
    let (status, _, body) = send(
        &h.app,
        post("/render?url=https://x.test", "text/html", "<h1>hi</h1>"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_json(&body)["message"],
        "url query parameter is not allowed when body is HTML"
    );
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn get_pdf_url_redirects_without_rendering() {
    let h = harness();
    let (status, headers, _) = send(&h.app, get("/render?url=https://example.com/doc.pdf")).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "https://example.com/doc.pdf");
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.recorder.pages.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn get_arxiv_abstract_redirects_to_pdf() {
    let h = harness();
    let (status, headers, _) =
        send(&h.app, get("/render?url=https%3A%2F%2Farxiv.org%2Fabs%2F2101.00001")).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "https://arxiv.org/pdf/2101.00001");
}

#[tokio::test]
async fn probed_pdf_content_type_redirects() {
    let h = harness_with(Some("application/pdf"), false, false);
    let (status, headers, _) = send(&h.app, get("/render?url=https://example.com/download")).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "https://example.com/download");
    assert_eq!(h.recorder.pages.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn get_renders_html_page_with_query_options() {
    let h = harness();
    let (status, headers, body) = send(
        &h.app,
        get("/render?url=https://example.com/page&pdf.format=Letter&attachmentName=page.pdf"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"page.pdf\""
    );
    assert_eq!(body, FAKE_PDF);
    assert_eq!(
        *h.recorder.targets.lock().unwrap(),
        vec!["url:https://example.com/page".to_string()]
    );
    assert_eq!(*h.recorder.formats.lock().unwrap(), vec!["Letter".to_string()]);
    assert_eq!(h.recorder.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn post_raw_html_renders_without_probe() {
    let h = harness();
    let (status, headers, body) = send(
        &h.app,
        post("/render?pdf.landscape=true", "text/html", "<h1>hi</h1>"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert!(headers.get(header::CONTENT_DISPOSITION).is_none());
    assert_eq!(body, FAKE_PDF);
    assert_eq!(
        *h.recorder.targets.lock().unwrap(),
        vec!["html:<h1>hi</h1>".to_string()]
    );
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_json_body_uses_nested_options() {
    let h = harness();
    let body = json!({
        "html": "<p>nested</p>",
        "attachmentName": "say \"hi\".pdf",
        "pdf": { "format": "A3", "margin": { "top": "1cm" } }
    });
    let (status, headers, _) = send(
        &h.app,
        post("/render", "application/json", body.to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"say hi.pdf\""
    );
    assert_eq!(*h.recorder.formats.lock().unwrap(), vec!["A3".to_string()]);
}

#[tokio::test]
async fn get_without_url_is_rejected() {
    let h = harness();
    let (status, _, body) = send(&h.app, get("/render?pdf.format=A4")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_json(&body)["message"], "Query must contain url");
}

#[tokio::test]
async fn non_http_url_is_rejected() {
    let h = harness();
    let (status, _, _) = send(&h.app, get("/render?url=file:///etc/passwd")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_option_value_is_rejected() {
    let h = harness();
    let (status, _, body) = send(
        &h.app,
        get("/render?url=https://example.com&viewport.width=wide"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_json(&body)["category"], "validation");
}

#[tokio::test]
async fn probe_failure_fails_the_request() {
    let h = harness_with(None, true, false);
    let (status, _, body) = send(&h.app, get("/render?url=https://example.com/page")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_json(&body)["category"], "probe");
    assert_eq!(h.recorder.pages.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn navigation_failure_is_a_server_error_and_closes_the_page() {
    let h = harness_with(Some("text/html"), false, true);
    let (status, _, body) = send(&h.app, get("/render?url=https://example.com/page")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_json(&body)["category"], "navigation");
    assert_eq!(h.recorder.pages.load(Ordering::SeqCst), 1);
    assert_eq!(h.recorder.closes.load(Ordering::SeqCst), 1);
}
