//! QMetry Test Management

use crate::config::credentials::QmetryCredentials;
use crate::core::{Integration, NoArguments, Product, Registrar};
use crate::integrations::http::{ApiClient, AuthScheme};
use crate::utils::errors::McpResult;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://testmanagement.qmetry.com";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TestCasesArgs {
    /// QMetry project key
    pub project_key: String,
    /// Page size
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Zero-based offset
    #[serde(default)]
    pub start: u32,
}

fn default_limit() -> u32 {
    50
}

pub struct QmetryIntegration {
    client: ApiClient,
}

impl QmetryIntegration {
    pub fn new(credentials: &QmetryCredentials) -> McpResult<Self> {
        let base_url = credentials.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let client = ApiClient::new(
            base_url,
            AuthScheme::Header {
                name: "apikey",
                value: credentials.api_key.clone(),
            },
        )?;
        Ok(Self { client })
    }
}

impl Integration for QmetryIntegration {
    fn product(&self) -> Product {
        Product::Qmetry
    }

    fn register(&self, registrar: &mut Registrar) -> McpResult<()> {
        let client = self.client.clone();
        registrar.tool(
            "list_qmetry_projects",
            "List QMetry projects",
            move |_: NoArguments| {
                let client = client.clone();
                async move {
                    client
                        .post(&["rest", "admin", "project", "list"], &json!({}))
                        .await
                }
            },
        );

        let client = self.client.clone();
        registrar.tool(
            "list_qmetry_test_cases",
            "List the test cases of a QMetry project",
            move |args: TestCasesArgs| {
                let client = client.clone();
                async move {
                    let body = json!({
                        "projectKey": args.project_key,
                        "limit": args.limit,
                        "start": args.start,
                    });
                    client
                        .post(&["rest", "testcases", "list"], &body)
                        .await
                }
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::credentials::Secret;

    #[test]
    fn test_default_base_url() {
        let qmetry = QmetryIntegration::new(&QmetryCredentials {
            api_key: Secret::new("key"),
            base_url: None,
        })
        .unwrap();
        assert_eq!(
            qmetry.client.base_url().host_str(),
            Some("testmanagement.qmetry.com")
        );
    }
}
