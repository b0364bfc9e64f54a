use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::fmt::Write as _;
use tracing::info;

use super::error::ApiError;
use super::AppState;
use crate::options::{normalize, validate_url, PartialRenderOptions, RenderOptions};
use crate::RenderError;

type ApiResult<T> = std::result::Result<T, ApiError>;

pub async fn healthz() -> &'static str {
    "ok"
}

/// `GET /render?<dotted options>`
pub async fn render_get(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let partial = PartialRenderOptions::from_pairs(query_pairs(query.as_deref()))?;
    match (&partial.url, &partial.html) {
        (None, _) => return Err(RenderError::validation("Query must contain url").into()),
        (Some(_), Some(_)) => {
            return Err(RenderError::validation("Query must contain either url or html, not both").into())
        }
        (Some(_), None) => {}
    }
    let opts = normalize(partial, &state.defaults);
    dispatch(&state, opts).await
}

/// `POST /render` with either a JSON options body or a raw HTML body.
pub async fn render_post(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let partial = if is_json(&headers) {
        options_from_json_body(&body)?
    } else {
        options_from_html_body(query.as_deref(), &body)?
    };
    let opts = normalize(partial, &state.defaults);
    dispatch(&state, opts).await
}

fn options_from_json_body(body: &[u8]) -> crate::Result<PartialRenderOptions> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| RenderError::validation(format!("Invalid JSON body: {err}")))?;

    let has_string = |field: &str| value.get(field).is_some_and(Value::is_string);
    match (has_string("url"), has_string("html")) {
        (false, false) => Err(RenderError::validation("Body must contain url or html")),
        (true, true) => Err(RenderError::validation(
            "Body must contain either url or html, not both",
        )),
        _ => PartialRenderOptions::from_json(value),
    }
}

fn options_from_html_body(query: Option<&str>, body: &[u8]) -> crate::Result<PartialRenderOptions> {
    let mut partial = PartialRenderOptions::from_pairs(query_pairs(query))?;
    if partial.url.is_some() {
        return Err(RenderError::validation(
            "url query parameter is not allowed when body is HTML",
        ));
    }
    let html = std::str::from_utf8(body)
        .map_err(|_| RenderError::validation("HTML body must be valid UTF-8"))?;
    partial.html = Some(html.to_string());
    Ok(partial)
}

/// Redirects to an existing PDF or renders the target.
async fn dispatch(state: &AppState, opts: RenderOptions) -> ApiResult<Response> {
    if let Some(url) = opts.url.as_deref() {
        validate_url(url)?;
        if let Some(pdf_url) = state.resolver.resolve(url).await? {
            info!(url, location = %pdf_url, "redirecting to existing pdf");
            return Ok((StatusCode::FOUND, [(LOCATION, pdf_url)]).into_response());
        }
    }

    let pdf = state.renderer.render(&opts).await?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    if let Some(name) = opts.attachment_name.as_deref() {
        headers.insert(CONTENT_DISPOSITION, attachment_header(name)?);
    }
    Ok((StatusCode::OK, headers, pdf).into_response())
}

fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.unwrap_or("").as_bytes())
        .into_owned()
        .collect()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|media| {
            let media = media.trim().to_ascii_lowercase();
            media == "application/json" || media.ends_with("+json")
        })
        .unwrap_or(false)
}

/// `attachment; filename="..."`, with `filename*` added for non-ASCII names.
fn attachment_header(name: &str) -> crate::Result<HeaderValue> {
    let cleaned: String = name
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect();
    let fallback: String = cleaned
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();

    let mut value = format!("attachment; filename=\"{fallback}\"");
    if fallback != cleaned {
        value.push_str("; filename*=UTF-8''");
        for byte in cleaned.bytes() {
            if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
                value.push(char::from(byte));
            } else {
                let _ = write!(value, "%{byte:02X}");
            }
        }
    }
    HeaderValue::from_str(&value)
        .map_err(|err| RenderError::validation(format!("Invalid attachmentName: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_header_strips_quotes() {
        let value = attachment_header("report \"final\".pdf").unwrap();
        assert_eq!(value, "attachment; filename=\"report final.pdf\"");
    }

    #[test]
    fn attachment_header_encodes_non_ascii_names() {
        let value = attachment_header("résumé.pdf").unwrap();
        assert_eq!(
            value,
            "attachment; filename=\"r_sum_.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
        );
    }

    #[test]
    fn json_detection_ignores_parameters() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(is_json(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        assert!(!is_json(&headers));
    }

    #[test]
    fn json_body_requires_exactly_one_target() {
        let err = options_from_json_body(b"{}").unwrap_err();
        assert_eq!(err.to_string(), "Body must contain url or html");

        let err = options_from_json_body(br#"{"url": 5}"#).unwrap_err();
        assert_eq!(err.to_string(), "Body must contain url or html");

        assert!(options_from_json_body(br#"{"url": "a", "html": "b"}"#).is_err());

        let partial = options_from_json_body(br#"{"html": "<p>", "pdf": {"landscape": true}}"#).unwrap();
        assert_eq!(partial.html.as_deref(), Some("<p>"));
    }

    #[test]
    fn html_body_takes_options_from_query() {
        let partial =
            options_from_html_body(Some("pdf.format=Letter&scrollPage=true"), b"<h1>x</h1>").unwrap();
        assert_eq!(partial.html.as_deref(), Some("<h1>x</h1>"));
        assert_eq!(partial.scroll_page, Some(true));

        let err = options_from_html_body(Some("url=https://x.test"), b"<p>").unwrap_err();
        assert_eq!(err.to_string(), "url query parameter is not allowed when body is HTML");
    }
}
