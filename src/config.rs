//! Service configuration loaded from TOML.
//!
//! Every section is optional; missing keys fall back to [`Default`]. Durations
//! use humantime notation (`"30s"`, `"250ms"`).

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::level_filters::LevelFilter;

use crate::browser::scroll::ScrollPolicy;
use crate::resolver::DEFAULT_PROBE_TIMEOUT;
use crate::{RenderError, Result};

pub const DEFAULT_BIND: &str = "0.0.0.0:9000";

/// Default timeout for launching the browser process.
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for a single DevTools command.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub server: ServerSettings,
    pub browser: BrowserSettings,
    pub probe: ProbeSettings,
    pub scroll: ScrollPolicy,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Chromium process settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserSettings {
    /// Browser binary; auto-detected when unset.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub no_sandbox: bool,
    #[serde(with = "humantime_serde")]
    pub launch_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Extra command-line switches passed to the browser.
    pub args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            no_sandbox: true,
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeSettings {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    #[serde(with = "level_filter")]
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
        }
    }
}

mod level_filter {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use tracing::level_filters::LevelFilter;

    pub fn serialize<S: Serializer>(level: &LevelFilter, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.to_string().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LevelFilter, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| D::Error::custom(format!("invalid log level '{raw}'")))
    }
}

impl ServiceConfig {
    /// Reads and validates the config at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            RenderError::Config(format!("Failed to read config {}: {err}", path.display()))
        })?;
        Self::from_toml(&raw).map_err(|err| match err {
            RenderError::Config(message) => {
                RenderError::Config(format!("{message} ({})", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|err| RenderError::Config(format!("Invalid config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|_| {
            RenderError::Config(format!(
                "server.bind must be HOST:PORT, got '{}'",
                self.server.bind
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        let durations = [
            ("browser.launch_timeout", self.browser.launch_timeout),
            ("browser.request_timeout", self.browser.request_timeout),
            ("probe.timeout", self.probe.timeout),
            ("scroll.interval", self.scroll.interval),
            ("scroll.ceiling", self.scroll.ceiling),
        ];
        if let Some((key, _)) = durations.iter().find(|(_, value)| value.is_zero()) {
            return Err(RenderError::Config(format!("{key} must be greater than zero")));
        }
        if self.scroll.settle > self.scroll.ceiling {
            return Err(RenderError::Config(
                "scroll.settle must not exceed scroll.ceiling".to_string(),
            ));
        }
        Ok(())
    }
}
