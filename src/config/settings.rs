//! Gateway settings: transport, logging and crash reporting

use crate::utils::errors::McpResult;
use clap::ValueEnum;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Prefix for settings taken from the environment, e.g. `MCP_SERVER_HTTP__ADDR`.
pub const ENV_PREFIX: &str = "MCP_SERVER_";
/// Crash reporting key, read verbatim.
pub const CRASH_REPORTING_KEY_VAR: &str = "MCP_SERVER_BUGSNAG_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub http: HttpSettings,
    pub log: LogSettings,
    pub crash_reporting: CrashReportingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Address for the streamable HTTP transport. Unset means stdio only.
    pub addr: Option<SocketAddr>,
    /// Path the MCP endpoint is mounted on
    pub path: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            addr: None,
            path: "/mcp".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashReportingSettings {
    pub api_key: Option<String>,
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub http_addr: Option<SocketAddr>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl Settings {
    /// Defaults, then the optional TOML file, then the environment, then
    /// command-line overrides.
    pub fn figment(config_path: Option<&str>, overrides: &SettingsOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        if let Some(path) = config_path {
            let expanded = shellexpand::tilde(path).to_string();
            figment = figment.merge(Toml::file(expanded));
        }

        figment = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&[CRASH_REPORTING_KEY_VAR])
                    .map(|_| "crash_reporting.api_key".into()),
            );

        if let Some(addr) = overrides.http_addr {
            figment = figment.merge(Serialized::default("http.addr", addr));
        }
        if let Some(level) = &overrides.log_level {
            figment = figment.merge(Serialized::default("log.level", level));
        }
        if let Some(format) = overrides.log_format {
            figment = figment.merge(Serialized::default("log.format", format));
        }

        figment
    }

    pub fn load(config_path: Option<&str>, overrides: &SettingsOverrides) -> McpResult<Self> {
        Ok(Self::figment(config_path, overrides).extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.http.addr, None);
        assert_eq!(settings.http.path, "/mcp");
        assert_eq!(settings.log.level, "info");
        assert_eq!(settings.log.format, LogFormat::Text);
        assert_eq!(settings.crash_reporting.api_key, None);
    }

    #[test]
    fn test_overrides_win() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MCP_SERVER_LOG__LEVEL", "warn");
            let overrides = SettingsOverrides {
                http_addr: Some("127.0.0.1:9100".parse().unwrap()),
                log_level: Some("debug".to_string()),
                log_format: Some(LogFormat::Json),
            };
            let settings: Settings = Settings::figment(None, &overrides).extract()?;
            assert_eq!(settings.http.addr, overrides.http_addr);
            assert_eq!(settings.log.level, "debug");
            assert_eq!(settings.log.format, LogFormat::Json);
            Ok(())
        });
    }
}
