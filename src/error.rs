use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0}")]
    Validation(String),

    #[error("Navigation to {target} failed: {message}")]
    Navigation { target: String, message: String },

    #[error("Scroll trigger did not finish within {0:?}")]
    ScrollTimeout(Duration),

    #[error("Content-type probe for {url} failed: {message}")]
    Probe { url: String, message: String },

    #[error("PDF export failed: {0}")]
    Export(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl RenderError {
    pub fn validation(message: impl Into<String>) -> Self {
        RenderError::Validation(message.into())
    }

    pub fn navigation(target: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::Navigation {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn probe(url: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::Probe {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        RenderError::Export(message.into())
    }

    pub fn browser(message: impl Into<String>) -> Self {
        RenderError::Browser(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RenderError::Validation(_) | RenderError::InvalidUrl(_) => ErrorCategory::Validation,
            RenderError::Navigation { .. } => ErrorCategory::Navigation,
            RenderError::ScrollTimeout(_) => ErrorCategory::Scroll,
            RenderError::Probe { .. } => ErrorCategory::Probe,
            RenderError::Export(_) => ErrorCategory::Export,
            RenderError::Browser(_) => ErrorCategory::Browser,
            RenderError::Config(_) | RenderError::Io(_) | RenderError::Serialization(_) => {
                ErrorCategory::Config
            }
            RenderError::Network(_) => ErrorCategory::Network,
        }
    }

    /// Whether the failure was caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    pub fn to_payload(&self) -> ErrorPayload {
        let category = self.category();
        let remediation = match self {
            RenderError::Validation(_) => {
                "Check the request parameters; nested options use dotted keys such as viewport.width."
            }
            RenderError::InvalidUrl(_) => "Pass an absolute http(s) URL (e.g., https://example.com).",
            RenderError::Navigation { message, .. } => {
                if message.to_ascii_lowercase().contains("timeout")
                    || message.to_ascii_lowercase().contains("timed out")
                {
                    "Increase goto.timeout or relax goto.waitUntil (e.g., load instead of networkidle)."
                } else {
                    "Verify the page is reachable from the render host; set ignoreHttpsErrors for self-signed certificates."
                }
            }
            RenderError::ScrollTimeout(_) => {
                "The page keeps growing while scrolling; disable scrollPage for infinite-scroll pages."
            }
            RenderError::Probe { .. } => {
                "The target host did not answer a HEAD request; check connectivity or probe.timeout."
            }
            RenderError::Export(_) => {
                "Check pdf options (format, scale, pageRanges, width/height units)."
            }
            RenderError::Browser(message) => {
                if message.to_ascii_lowercase().contains("launch") {
                    "Install Chromium or set browser.executable / --chrome to its path."
                } else {
                    "Retry the request; restart the service if the browser process died."
                }
            }
            RenderError::Config(_) => "Check the config file keys and CLI flags.",
            RenderError::Io(_) => "Check file paths/permissions.",
            RenderError::Serialization(_) => {
                "Check JSON inputs; run with --verbose for details."
            }
            RenderError::Network(_) => "Check connectivity/proxy/VPN and retry.",
        };
        ErrorPayload::new(category, self.to_string(), remediation)
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Validation,
    Navigation,
    Scroll,
    Probe,
    Export,
    Browser,
    Config,
    Network,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
