//! Tracing subscriber setup
//!
//! Logs always go to stderr: stdout belongs to the stdio transport.

use crate::config::settings::{LogFormat, LogSettings};
use crate::utils::errors::{McpError, McpResult};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init_tracing(settings: &LogSettings) -> McpResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| McpError::ConfigError(format!("invalid log level '{}': {}", settings.level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match settings.format {
        LogFormat::Text => builder.with_ansi(false).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| McpError::ConfigError(format!("failed to set tracing subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let settings = LogSettings {
            level: "gateway=loud".to_string(),
            format: LogFormat::Text,
        };
        assert!(matches!(init_tracing(&settings), Err(McpError::ConfigError(_))));
    }
}
