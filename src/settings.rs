use std::path::{Path, PathBuf};

use tracing::debug;
use tracing::level_filters::LevelFilter;
use url2pdf_lib::{RenderError, ServiceConfig};

/// Values given on the command line that override the config file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub chrome: Option<PathBuf>,
    pub log_level: Option<LevelFilter>,
    pub verbose: bool,
}

/// Load config from a TOML file, or return defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, RenderError> {
    match path {
        Some(path) => ServiceConfig::load(path),
        None => Ok(ServiceConfig::default()),
    }
}

/// Merge CLI overrides into the loaded config, preferring the CLI when a flag was given.
///
/// `--log-level` wins over `--verbose`, which only raises the level to debug.
pub fn resolve_service_settings(
    mut config: ServiceConfig,
    overrides: &CliOverrides,
) -> Result<ServiceConfig, RenderError> {
    if let Some(bind) = &overrides.bind {
        config.server.bind = bind.clone();
    }
    if let Some(chrome) = &overrides.chrome {
        config.browser.executable = Some(chrome.clone());
    }
    match overrides.log_level {
        Some(level) => config.logging.level = level,
        None if overrides.verbose => config.logging.level = LevelFilter::DEBUG,
        None => {}
    }
    config.validate()?;
    Ok(config)
}

/// Log the effective configuration (debug level).
pub fn log_effective_config(config_path: Option<&Path>, config: &ServiceConfig) {
    let source = config_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults/built-in".to_string());
    debug!(
        source = %source,
        bind = %config.server.bind,
        executable = ?config.browser.executable,
        headless = config.browser.headless,
        probe_timeout = ?config.probe.timeout,
        scroll_ceiling = ?config.scroll.ceiling,
        "effective config"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), ServiceConfig::default());
    }

    #[test]
    fn cli_flags_override_config() {
        let overrides = CliOverrides {
            bind: Some("127.0.0.1:7000".to_string()),
            chrome: Some(PathBuf::from("/opt/chrome")),
            log_level: Some(LevelFilter::TRACE),
            verbose: true,
        };
        let resolved = resolve_service_settings(ServiceConfig::default(), &overrides).unwrap();

        assert_eq!(resolved.server.bind, "127.0.0.1:7000");
        assert_eq!(resolved.browser.executable, Some(PathBuf::from("/opt/chrome")));
        assert_eq!(resolved.logging.level, LevelFilter::TRACE);
    }

    #[test]
    fn verbose_raises_level_to_debug() {
        let overrides = CliOverrides {
            verbose: true,
            ..CliOverrides::default()
        };
        let resolved = resolve_service_settings(ServiceConfig::default(), &overrides).unwrap();
        assert_eq!(resolved.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn config_values_survive_without_flags() {
        let mut config = ServiceConfig::default();
        config.server.bind = "10.0.0.1:9100".to_string();

        let resolved = resolve_service_settings(config, &CliOverrides::default()).unwrap();
        assert_eq!(resolved.server.bind, "10.0.0.1:9100");
        assert_eq!(resolved.logging.level, LevelFilter::INFO);
    }

    #[test]
    fn invalid_bind_override_is_a_config_error() {
        let overrides = CliOverrides {
            bind: Some("nope".to_string()),
            ..CliOverrides::default()
        };
        let err = resolve_service_settings(ServiceConfig::default(), &overrides).unwrap_err();
        assert!(matches!(err, RenderError::Config(_)));
    }
}
