//! Process-wide crash reporting to Bugsnag
//!
//! Enabled at most once per process, and only when an API key is configured.
//! Nothing in the gateway core depends on it.

use chrono::Utc;
use once_cell::sync::OnceCell;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub const NOTIFY_ENDPOINT: &str = "https://notify.bugsnag.com";

static REPORTER: OnceCell<CrashReporter> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct CrashReporter {
    api_key: String,
    endpoint: String,
}

impl CrashReporter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: NOTIFY_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Event payload in the Bugsnag error reporting format (v5).
    pub fn payload(&self, error_class: &str, message: &str, unhandled: bool) -> Value {
        json!({
            "apiKey": self.api_key,
            "payloadVersion": "5",
            "notifier": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "url": "https://github.com/SmartBear/smartbear-mcp",
            },
            "events": [{
                "exceptions": [{
                    "errorClass": error_class,
                    "message": message,
                    "stacktrace": [],
                }],
                "unhandled": unhandled,
                "severity": "error",
                "app": { "version": env!("CARGO_PKG_VERSION") },
                "device": { "time": Utc::now().to_rfc3339() },
            }],
        })
    }

    /// Deliver one event. Runs on its own thread so it is safe to call from a
    /// panic hook or from inside the async runtime.
    pub fn send(&self, error_class: &str, message: &str, unhandled: bool) {
        let payload = self.payload(error_class, message, unhandled);
        let api_key = self.api_key.clone();
        let endpoint = self.endpoint.clone();

        let delivery = std::thread::spawn(move || {
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()?;
            client
                .post(endpoint)
                .header("Bugsnag-Api-Key", api_key)
                .header("Bugsnag-Payload-Version", "5")
                .json(&payload)
                .send()?
                .error_for_status()
                .map(|_| ())
        });

        match delivery.join() {
            Ok(Ok(())) => debug!(error_class, "Crash report delivered"),
            Ok(Err(e)) => warn!(error = %e, "Failed to deliver crash report"),
            Err(_) => warn!("Crash report delivery thread panicked"),
        }
    }
}

/// Enable crash reporting if `api_key` is set. Returns whether this call
/// installed the reporter.
pub fn init(api_key: Option<&str>) -> bool {
    let Some(api_key) = api_key.filter(|key| !key.is_empty()) else {
        return false;
    };
    if REPORTER.set(CrashReporter::new(api_key)).is_err() {
        return false;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(reporter) = REPORTER.get() {
            reporter.send("panic", &info.to_string(), true);
        }
        previous(info);
    }));
    true
}

pub fn is_enabled() -> bool {
    REPORTER.get().is_some()
}

/// Report a handled fatal error. No-op when crash reporting is disabled.
pub fn notify(error: &dyn std::error::Error) {
    if let Some(reporter) = REPORTER.get() {
        reporter.send("StartupError", &error.to_string(), false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_without_key_is_noop() {
        assert!(!init(None));
        assert!(!init(Some("")));
    }

    #[test]
    fn test_payload_shape() {
        let reporter = CrashReporter::new("key-123");
        let payload = reporter.payload("StartupError", "boom", false);
        assert_eq!(payload["apiKey"], "key-123");
        assert_eq!(payload["events"][0]["exceptions"][0]["errorClass"], "StartupError");
        assert_eq!(payload["events"][0]["exceptions"][0]["message"], "boom");
        assert_eq!(payload["events"][0]["unhandled"], false);
    }
}
