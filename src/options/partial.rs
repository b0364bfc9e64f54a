use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{unflatten, Dimension, WaitFor, WaitUntil};
use crate::{RenderError, Result};

/// Caller-supplied options; any leaf may be missing.
///
/// Built from a JSON body as-is, or from query pairs after [`unflatten`].
/// Scalar leaves also accept their textual form (`"true"`, `"800"`) since query
/// strings carry nothing else.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRenderOptions {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub attachment_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub scroll_page: Option<bool>,
    #[serde(default, alias = "emulateMedia", deserialize_with = "lenient")]
    pub emulate_screen_media: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub ignore_https_errors: Option<bool>,
    #[serde(default)]
    pub wait_for: Option<WaitFor>,
    #[serde(default)]
    pub viewport: Option<PartialViewportOptions>,
    #[serde(default)]
    pub goto: Option<PartialGotoOptions>,
    #[serde(default)]
    pub pdf: Option<PartialPdfOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialViewportOptions {
    #[serde(default, deserialize_with = "lenient")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub device_scale_factor: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_mobile: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub has_touch: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_landscape: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialGotoOptions {
    #[serde(default, deserialize_with = "lenient")]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub wait_until: Option<WaitUntil>,
    #[serde(default, deserialize_with = "lenient")]
    pub network_idle_inflight: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub network_idle_timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialPdfOptions {
    #[serde(default, deserialize_with = "lenient")]
    pub scale: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub display_header_footer: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub landscape: Option<bool>,
    #[serde(default)]
    pub page_ranges: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub width: Option<Dimension>,
    #[serde(default)]
    pub height: Option<Dimension>,
    #[serde(default)]
    pub margin: Option<PartialMargin>,
    #[serde(default, deserialize_with = "lenient")]
    pub print_background: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PartialMargin {
    #[serde(default)]
    pub top: Option<Dimension>,
    #[serde(default)]
    pub right: Option<Dimension>,
    #[serde(default)]
    pub bottom: Option<Dimension>,
    #[serde(default)]
    pub left: Option<Dimension>,
}

impl PartialRenderOptions {
    /// Parses an already nested JSON value (request body case).
    pub fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|err| RenderError::validation(format!("Invalid render options: {err}")))
    }

    /// Parses flat `key=value` pairs whose keys may be dotted paths.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::from_json(unflatten(pairs)?)
    }
}

/// Scalars that can also be spelled as text.
trait FromText: Sized {
    fn from_text(text: &str) -> Option<Self>;
}

impl FromText for bool {
    fn from_text(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

macro_rules! numeric_from_text {
    ($($ty:ty),*) => {
        $(impl FromText for $ty {
            fn from_text(text: &str) -> Option<Self> {
                text.trim().parse().ok()
            }
        })*
    };
}

numeric_from_text!(u32, u64, f64);

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + FromText,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Native(T),
        Text(String),
    }

    match Option::<Raw<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Native(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) => T::from_text(&text)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid value '{text}'"))),
    }
}
