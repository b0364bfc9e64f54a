//! Site-specific rewrites from landing pages to the PDF they front.

use url::Url;

/// Rewrites URLs of one host to the canonical PDF location.
pub trait SiteRule: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Host this rule applies to, compared exactly.
    fn host(&self) -> &str;

    /// Returns the PDF URL when `url` matches the rule's path pattern.
    fn rewrite(&self, url: &Url) -> Option<String>;
}

/// Ordered registry of [`SiteRule`]s; the first matching rule wins.
pub struct SiteRules {
    rules: Vec<Box<dyn SiteRule>>,
}

impl SiteRules {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Registry with the arXiv and OpenReview rules.
    pub fn builtin() -> Self {
        Self::empty().with(ArxivRule).with(OpenReviewRule)
    }

    pub fn with(mut self, rule: impl SiteRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the matching rule's name and the rewritten URL.
    pub fn rewrite(&self, url: &Url) -> Option<(&str, String)> {
        let host = url.host_str()?;
        self.rules
            .iter()
            .filter(|rule| rule.host() == host)
            .find_map(|rule| rule.rewrite(url).map(|pdf| (rule.name(), pdf)))
    }
}

impl Default for SiteRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for SiteRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.name()))
            .finish()
    }
}

/// `arxiv.org/abs/<id>` and `arxiv.org/pdf/<id>` → `https://arxiv.org/pdf/<id>`.
#[derive(Debug, Clone, Copy)]
pub struct ArxivRule;

impl SiteRule for ArxivRule {
    fn name(&self) -> &str {
        "arxiv"
    }

    fn host(&self) -> &str {
        "arxiv.org"
    }

    fn rewrite(&self, url: &Url) -> Option<String> {
        let mut segments = url.path_segments()?;
        let kind = segments.next()?;
        let id = segments.next()?;
        if segments.next().is_some() || !matches!(kind, "abs" | "pdf") || !is_arxiv_id(id) {
            return None;
        }
        Some(format!("https://arxiv.org/pdf/{id}"))
    }
}

/// `<digits>.<digits>` with an optional `v<digits>` revision suffix.
fn is_arxiv_id(id: &str) -> bool {
    let (number, revision) = match id.split_once('v') {
        Some((number, revision)) => (number, Some(revision)),
        None => (id, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let valid_number = number
        .split_once('.')
        .is_some_and(|(major, minor)| all_digits(major) && all_digits(minor));
    valid_number && revision.map_or(true, all_digits)
}

/// `openreview.net/forum?...` and `openreview.net/pdf?...` → `/pdf` with the same query.
#[derive(Debug, Clone, Copy)]
pub struct OpenReviewRule;

impl SiteRule for OpenReviewRule {
    fn name(&self) -> &str {
        "openreview"
    }

    fn host(&self) -> &str {
        "openreview.net"
    }

    fn rewrite(&self, url: &Url) -> Option<String> {
        if !matches!(url.path(), "/forum" | "/pdf") {
            return None;
        }
        let mut pdf = url.clone();
        pdf.set_path("/pdf");
        pdf.set_fragment(None);
        Some(pdf.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(raw: &str) -> Option<String> {
        let url = Url::parse(raw).unwrap();
        SiteRules::builtin()
            .rewrite(&url)
            .map(|(_, pdf)| pdf)
    }

    #[test]
    fn arxiv_abstract_pages_map_to_pdf() {
        assert_eq!(
            rewrite("https://arxiv.org/abs/2101.00001").as_deref(),
            Some("https://arxiv.org/pdf/2101.00001")
        );
        assert_eq!(
            rewrite("http://arxiv.org/pdf/1706.03762v5").as_deref(),
            Some("https://arxiv.org/pdf/1706.03762v5")
        );
    }

    #[test]
    fn arxiv_other_paths_fall_through() {
        assert_eq!(rewrite("https://arxiv.org/list/cs.AI/recent"), None);
        assert_eq!(rewrite("https://arxiv.org/abs/hep-th"), None);
        assert_eq!(rewrite("https://arxiv.org/abs/2101"), None);
        assert_eq!(rewrite("https://arxiv.org/abs/2101.00001/extra"), None);
        assert_eq!(rewrite("https://arxiv.org/"), None);
    }

    #[test]
    fn openreview_forum_maps_to_pdf_with_query() {
        assert_eq!(
            rewrite("https://openreview.net/forum?id=abc").as_deref(),
            Some("https://openreview.net/pdf?id=abc")
        );
        assert_eq!(
            rewrite("https://openreview.net/pdf?id=xyz#top").as_deref(),
            Some("https://openreview.net/pdf?id=xyz")
        );
        assert_eq!(rewrite("https://openreview.net/group?id=ICLR.cc"), None);
    }

    #[test]
    fn other_hosts_are_not_rewritten() {
        assert_eq!(rewrite("https://www.arxiv.org/abs/2101.00001"), None);
        assert_eq!(rewrite("https://example.com/forum?id=abc"), None);
    }

    #[test]
    fn custom_rules_extend_the_registry() {
        struct Mirror;
        impl SiteRule for Mirror {
            fn name(&self) -> &str {
                "mirror"
            }
            fn host(&self) -> &str {
                "papers.test"
            }
            fn rewrite(&self, url: &Url) -> Option<String> {
                url.path()
                    .strip_prefix("/view/")
                    .map(|id| format!("https://papers.test/files/{id}.pdf"))
            }
        }

        let rules = SiteRules::builtin().with(Mirror);
        assert_eq!(rules.len(), 3);
        let url = Url::parse("https://papers.test/view/42").unwrap();
        let (name, pdf) = rules.rewrite(&url).unwrap();
        assert_eq!(name, "mirror");
        assert_eq!(pdf, "https://papers.test/files/42.pdf");
    }
}
