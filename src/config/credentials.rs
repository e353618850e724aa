//! Credential groups read from the process environment
//!
//! Each product has one credential group. Resolution never fails: a missing
//! group just leaves the product disabled, and an incomplete group produces a
//! [`CredentialDiagnostic`] instead of an error.

use crate::core::Product;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

pub mod vars {
    pub const REFLECT_API_TOKEN: &str = "REFLECT_API_TOKEN";
    pub const BUGSNAG_AUTH_TOKEN: &str = "BUGSNAG_AUTH_TOKEN";
    pub const BUGSNAG_PROJECT_API_KEY: &str = "BUGSNAG_PROJECT_API_KEY";
    pub const BUGSNAG_ENDPOINT: &str = "BUGSNAG_ENDPOINT";
    pub const API_HUB_API_KEY: &str = "API_HUB_API_KEY";
    pub const PACT_BROKER_BASE_URL: &str = "PACT_BROKER_BASE_URL";
    pub const PACT_BROKER_TOKEN: &str = "PACT_BROKER_TOKEN";
    pub const PACT_BROKER_USERNAME: &str = "PACT_BROKER_USERNAME";
    pub const PACT_BROKER_PASSWORD: &str = "PACT_BROKER_PASSWORD";
    pub const QMETRY_API_KEY: &str = "QMETRY_API_KEY";
    pub const QMETRY_BASE_URL: &str = "QMETRY_BASE_URL";
    pub const ZEPHYR_API_TOKEN: &str = "ZEPHYR_API_TOKEN";
    pub const ZEPHYR_BASE_URL: &str = "ZEPHYR_BASE_URL";
    pub const COLLAB_BASE_URL: &str = "COLLAB_BASE_URL";
    pub const COLLAB_USERNAME: &str = "COLLAB_USERNAME";
    pub const COLLAB_LOGIN_TICKET: &str = "COLLAB_LOGIN_TICKET";
}

/// Source of environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// A secret string that never shows up in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectCredentials {
    pub api_token: Secret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugsnagCredentials {
    pub auth_token: Secret,
    pub project_api_key: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiHubCredentials {
    pub api_key: Secret,
}

/// The two mutually exclusive ways to authenticate against a Pact Broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PactAuth {
    Token(Secret),
    Basic { username: String, password: Secret },
}

/// Which flavour of broker the credentials point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PactClientType {
    Pactflow,
    PactBroker,
}

impl PactClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PactClientType::Pactflow => "pactflow",
            PactClientType::PactBroker => "pact_broker",
        }
    }

    /// URI scheme for resources published by this client.
    pub fn scheme(&self) -> &'static str {
        match self {
            PactClientType::Pactflow => "pactflow",
            PactClientType::PactBroker => "pact-broker",
        }
    }
}

impl fmt::Display for PactClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PactCredentials {
    pub base_url: String,
    pub auth: PactAuth,
}

impl PactCredentials {
    /// Token auth means PactFlow, basic auth means a self-hosted broker.
    pub fn client_type(&self) -> PactClientType {
        match self.auth {
            PactAuth::Token(_) => PactClientType::Pactflow,
            PactAuth::Basic { .. } => PactClientType::PactBroker,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QmetryCredentials {
    pub api_key: Secret,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZephyrCredentials {
    pub api_token: Secret,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorCredentials {
    pub base_url: String,
    pub username: String,
    pub login_ticket: Secret,
}

/// A credential group that is present but incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialDiagnostic {
    pub product: Product,
    pub message: String,
}

impl fmt::Display for CredentialDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.product, self.message)
    }
}

/// Every credential group, resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub reflect: Option<ReflectCredentials>,
    pub bugsnag: Option<BugsnagCredentials>,
    pub api_hub: Option<ApiHubCredentials>,
    pub pact: Option<PactCredentials>,
    pub qmetry: Option<QmetryCredentials>,
    pub zephyr: Option<ZephyrCredentials>,
    pub collaborator: Option<CollaboratorCredentials>,
    pub diagnostics: Vec<CredentialDiagnostic>,
}

impl ResolvedCredentials {
    pub fn resolve(env: &impl EnvSource) -> Self {
        let lookup = |key: &str| env.var(key).filter(|value| !value.is_empty());
        let mut diagnostics = Vec::new();

        let reflect = lookup(vars::REFLECT_API_TOKEN).map(|token| ReflectCredentials {
            api_token: Secret::new(token),
        });

        let bugsnag = lookup(vars::BUGSNAG_AUTH_TOKEN).map(|token| BugsnagCredentials {
            auth_token: Secret::new(token),
            project_api_key: lookup(vars::BUGSNAG_PROJECT_API_KEY),
            endpoint: lookup(vars::BUGSNAG_ENDPOINT),
        });

        let api_hub = lookup(vars::API_HUB_API_KEY).map(|key| ApiHubCredentials {
            api_key: Secret::new(key),
        });

        let pact = resolve_pact(&lookup, &mut diagnostics);

        let qmetry = lookup(vars::QMETRY_API_KEY).map(|key| QmetryCredentials {
            api_key: Secret::new(key),
            base_url: lookup(vars::QMETRY_BASE_URL),
        });

        let zephyr = lookup(vars::ZEPHYR_API_TOKEN).map(|token| ZephyrCredentials {
            api_token: Secret::new(token),
            base_url: lookup(vars::ZEPHYR_BASE_URL),
        });

        let collaborator = resolve_collaborator(&lookup, &mut diagnostics);

        Self {
            reflect,
            bugsnag,
            api_hub,
            pact,
            qmetry,
            zephyr,
            collaborator,
            diagnostics,
        }
    }

    pub fn is_enabled(&self, product: Product) -> bool {
        match product {
            Product::Reflect => self.reflect.is_some(),
            Product::Bugsnag => self.bugsnag.is_some(),
            Product::ApiHub => self.api_hub.is_some(),
            Product::Pact => self.pact.is_some(),
            Product::Qmetry => self.qmetry.is_some(),
            Product::Zephyr => self.zephyr.is_some(),
            Product::Collaborator => self.collaborator.is_some(),
        }
    }

    /// Products with a complete credential group, in activation order.
    pub fn enabled(&self) -> Vec<Product> {
        Product::ALL
            .into_iter()
            .filter(|product| self.is_enabled(*product))
            .collect()
    }

    pub fn log_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            warn!(product = %diagnostic.product, "{}", diagnostic.message);
        }
    }
}

fn resolve_pact(
    lookup: &impl Fn(&str) -> Option<String>,
    diagnostics: &mut Vec<CredentialDiagnostic>,
) -> Option<PactCredentials> {
    let base_url = lookup(vars::PACT_BROKER_BASE_URL)?;

    if let Some(token) = lookup(vars::PACT_BROKER_TOKEN) {
        return Some(PactCredentials {
            base_url,
            auth: PactAuth::Token(Secret::new(token)),
        });
    }

    match (
        lookup(vars::PACT_BROKER_USERNAME),
        lookup(vars::PACT_BROKER_PASSWORD),
    ) {
        (Some(username), Some(password)) => Some(PactCredentials {
            base_url,
            auth: PactAuth::Basic {
                username,
                password: Secret::new(password),
            },
        }),
        _ => {
            diagnostics.push(CredentialDiagnostic {
                product: Product::Pact,
                message: format!(
                    "If the Pact Broker base URL is specified, you must specify either (a) a PactFlow token ({}), or (b) a Pact Broker username and password pair ({} and {}).",
                    vars::PACT_BROKER_TOKEN,
                    vars::PACT_BROKER_USERNAME,
                    vars::PACT_BROKER_PASSWORD,
                ),
            });
            None
        }
    }
}

fn resolve_collaborator(
    lookup: &impl Fn(&str) -> Option<String>,
    diagnostics: &mut Vec<CredentialDiagnostic>,
) -> Option<CollaboratorCredentials> {
    let base_url = lookup(vars::COLLAB_BASE_URL);
    let username = lookup(vars::COLLAB_USERNAME);
    let login_ticket = lookup(vars::COLLAB_LOGIN_TICKET);

    match (base_url, username, login_ticket) {
        (Some(base_url), Some(username), Some(ticket)) => Some(CollaboratorCredentials {
            base_url,
            username,
            login_ticket: Secret::new(ticket),
        }),
        (None, None, None) => None,
        (base_url, username, ticket) => {
            let missing: Vec<&str> = [
                (base_url.is_none(), vars::COLLAB_BASE_URL),
                (username.is_none(), vars::COLLAB_USERNAME),
                (ticket.is_none(), vars::COLLAB_LOGIN_TICKET),
            ]
            .into_iter()
            .filter_map(|(missing, name)| missing.then_some(name))
            .collect();
            diagnostics.push(CredentialDiagnostic {
                product: Product::Collaborator,
                message: format!(
                    "Collaborator needs a base URL, username and login ticket; missing {}.",
                    missing.join(", ")
                ),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        let resolved = ResolvedCredentials::resolve(&env(&[(vars::REFLECT_API_TOKEN, "")]));
        assert!(resolved.reflect.is_none());
        assert!(resolved.diagnostics.is_empty());
    }

    #[test]
    fn test_bugsnag_optional_fields() {
        let resolved = ResolvedCredentials::resolve(&env(&[
            (vars::BUGSNAG_AUTH_TOKEN, "tok"),
            (vars::BUGSNAG_ENDPOINT, "https://bugsnag.example.com"),
        ]));
        let bugsnag = resolved.bugsnag.unwrap();
        assert_eq!(bugsnag.auth_token.expose(), "tok");
        assert_eq!(bugsnag.project_api_key, None);
        assert_eq!(bugsnag.endpoint.as_deref(), Some("https://bugsnag.example.com"));
    }

    #[test]
    fn test_collaborator_partial_names_missing_variables() {
        let resolved = ResolvedCredentials::resolve(&env(&[
            (vars::COLLAB_BASE_URL, "https://collab.example.com"),
            (vars::COLLAB_USERNAME, "alice"),
        ]));
        assert!(resolved.collaborator.is_none());
        assert_eq!(resolved.diagnostics.len(), 1);
        assert!(resolved.diagnostics[0].message.contains(vars::COLLAB_LOGIN_TICKET));
        assert!(!resolved.diagnostics[0].message.contains(vars::COLLAB_USERNAME));
    }

    #[test]
    fn test_optional_only_variables_are_silent() {
        let resolved = ResolvedCredentials::resolve(&env(&[
            (vars::QMETRY_BASE_URL, "https://qmetry.example.com"),
            (vars::ZEPHYR_BASE_URL, "https://zephyr.example.com"),
            (vars::BUGSNAG_PROJECT_API_KEY, "abc"),
        ]));
        assert!(resolved.enabled().is_empty());
        assert!(resolved.diagnostics.is_empty());
    }
}
