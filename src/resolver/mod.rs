//! Detection of URLs that already point at a PDF.
//!
//! Checks run in order and the first hit wins:
//! 1. the URL path ends with `.pdf`
//! 2. a [`SiteRule`] rewrites a known landing page to its PDF
//! 3. a `HEAD` probe reports a content type ending in `pdf`

mod probe;
mod rules;

pub use probe::{ContentTypeProbe, HttpProbe, DEFAULT_PROBE_TIMEOUT};
pub use rules::{ArxivRule, OpenReviewRule, SiteRule, SiteRules};

use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::Result;

/// Decides whether a URL can be served by redirect instead of rendering.
#[derive(Clone)]
pub struct ExistingPdfResolver {
    rules: Arc<SiteRules>,
    probe: Arc<dyn ContentTypeProbe>,
}

impl ExistingPdfResolver {
    pub fn new(rules: SiteRules, probe: Arc<dyn ContentTypeProbe>) -> Self {
        Self {
            rules: Arc::new(rules),
            probe,
        }
    }

    /// Built-in site rules with the given probe.
    pub fn with_probe(probe: Arc<dyn ContentTypeProbe>) -> Self {
        Self::new(SiteRules::builtin(), probe)
    }

    /// Returns the PDF URL to redirect to, or `None` when the page must be rendered.
    ///
    /// Probe failures are returned as errors rather than treated as a miss.
    pub async fn resolve(&self, url: &str) -> Result<Option<String>> {
        let parsed = Url::parse(url)?;

        if parsed.path().ends_with(".pdf") {
            debug!(url, reason = "extension", "existing pdf");
            return Ok(Some(url.to_string()));
        }

        if let Some((rule, pdf_url)) = self.rules.rewrite(&parsed) {
            debug!(url, pdf_url = %pdf_url, reason = "site-rule", rule, "existing pdf");
            return Ok(Some(pdf_url));
        }

        let content_type = self.probe.content_type(url).await?;
        if content_type.as_deref().is_some_and(is_pdf_content_type) {
            debug!(url, reason = "content-type", "existing pdf");
            return Ok(Some(url.to_string()));
        }

        debug!(url, content_type = content_type.as_deref().unwrap_or(""), "not a pdf");
        Ok(None)
    }
}

impl std::fmt::Debug for ExistingPdfResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExistingPdfResolver")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

/// Media type (parameters stripped) ends with `pdf`, ignoring case.
fn is_pdf_content_type(value: &str) -> bool {
    let media_type = value.split(';').next().unwrap_or("").trim();
    media_type.to_ascii_lowercase().ends_with("pdf")
}
