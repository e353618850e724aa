//! Reflect: no-code web test automation

use crate::config::credentials::ReflectCredentials;
use crate::core::{Integration, NoArguments, Product, Registrar};
use crate::integrations::http::{ApiClient, AuthScheme};
use crate::utils::errors::McpResult;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://api.reflect.run/v1";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SuiteArgs {
    /// Reflect suite ID
    pub suite_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TestArgs {
    /// Reflect test ID
    pub test_id: String,
}

pub struct ReflectIntegration {
    client: ApiClient,
}

impl ReflectIntegration {
    pub fn new(credentials: &ReflectCredentials) -> McpResult<Self> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(credentials: &ReflectCredentials, base_url: &str) -> McpResult<Self> {
        let client = ApiClient::new(
            base_url,
            AuthScheme::Header {
                name: "X-API-KEY",
                value: credentials.api_token.clone(),
            },
        )?;
        Ok(Self { client })
    }
}

impl Integration for ReflectIntegration {
    fn product(&self) -> Product {
        Product::Reflect
    }

    fn register(&self, registrar: &mut Registrar) -> McpResult<()> {
        let client = self.client.clone();
        registrar.tool(
            "list_reflect_suites",
            "List all Reflect test suites",
            move |_: NoArguments| {
                let client = client.clone();
                async move { client.get(&["suites"], &[]).await }
            },
        );

        let client = self.client.clone();
        registrar.tool(
            "list_reflect_suite_executions",
            "List past executions of a Reflect suite",
            move |args: SuiteArgs| {
                let client = client.clone();
                async move {
                    client
                        .get(&["suites", &args.suite_id, "executions"], &[])
                        .await
                }
            },
        );

        let client = self.client.clone();
        registrar.tool(
            "reflect_run_suite",
            "Start an execution of a Reflect suite",
            move |args: SuiteArgs| {
                let client = client.clone();
                async move {
                    client
                        .post(&["suites", &args.suite_id, "executions"], &json!({}))
                        .await
                }
            },
        );

        let client = self.client.clone();
        registrar.tool(
            "list_reflect_tests",
            "List all Reflect tests",
            move |_: NoArguments| {
                let client = client.clone();
                async move { client.get(&["tests"], &[]).await }
            },
        );

        let client = self.client.clone();
        registrar.tool(
            "reflect_run_test",
            "Start an execution of a single Reflect test",
            move |args: TestArgs| {
                let client = client.clone();
                async move {
                    client
                        .post(&["tests", &args.test_id, "executions"], &json!({}))
                        .await
                }
            },
        );

        Ok(())
    }
}
