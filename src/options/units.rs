//! CSS length and paper-size handling for the `pdf` option group.

use serde::{Deserialize, Serialize};
use std::fmt;

const PX_PER_INCH: f64 = 96.0;
const CM_PER_INCH: f64 = 2.54;
const MM_PER_INCH: f64 = 25.4;

/// A length given either as a bare number (CSS pixels) or a CSS length string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Px(f64),
    Css(String),
}

impl Dimension {
    pub fn zero() -> Self {
        Dimension::Px(0.0)
    }

    /// Converts the length to inches, the unit the print backend expects.
    pub fn to_inches(&self) -> Result<f64, String> {
        match self {
            Dimension::Px(px) => Ok(px / PX_PER_INCH),
            Dimension::Css(raw) => parse_css_length(raw),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Px(px) => write!(f, "{px}px"),
            Dimension::Css(raw) => write!(f, "{raw}"),
        }
    }
}

fn parse_css_length(raw: &str) -> Result<f64, String> {
    let text = raw.trim().to_ascii_lowercase();
    let split = text
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid length '{raw}'"))?;
    if value < 0.0 {
        return Err(format!("negative length '{raw}'"));
    }
    match unit.trim() {
        "" | "px" => Ok(value / PX_PER_INCH),
        "in" => Ok(value),
        "cm" => Ok(value / CM_PER_INCH),
        "mm" => Ok(value / MM_PER_INCH),
        other => Err(format!("unsupported unit '{other}' in '{raw}'")),
    }
}

/// Named paper sizes, in inches (width, height), portrait orientation.
const PAPER_FORMATS: &[(&str, f64, f64)] = &[
    ("letter", 8.5, 11.0),
    ("legal", 8.5, 14.0),
    ("tabloid", 11.0, 17.0),
    ("ledger", 17.0, 11.0),
    ("a0", 33.1, 46.8),
    ("a1", 23.4, 33.1),
    ("a2", 16.54, 23.4),
    ("a3", 11.7, 16.54),
    ("a4", 8.27, 11.7),
    ("a5", 5.83, 8.27),
    ("a6", 4.13, 5.83),
];

/// Looks up a paper format by name, case-insensitively.
pub fn paper_size(format: &str) -> Option<(f64, f64)> {
    let wanted = format.trim().to_ascii_lowercase();
    PAPER_FORMATS
        .iter()
        .find(|(name, _, _)| *name == wanted)
        .map(|(_, width, height)| (*width, *height))
}
