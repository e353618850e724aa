//! Zephyr Scale test management

use crate::config::credentials::ZephyrCredentials;
use crate::core::{Integration, Product, Registrar};
use crate::integrations::http::{ApiClient, AuthScheme};
use crate::utils::errors::McpResult;
use schemars::JsonSchema;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.zephyrscale.smartbear.com/v2";

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct PageArgs {
    /// Maximum number of results
    #[serde(default)]
    pub max_results: Option<u32>,
    /// Zero-based offset
    #[serde(default)]
    pub start_at: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TestCyclesArgs {
    /// Jira project key
    #[serde(default)]
    pub project_key: Option<String>,
    #[serde(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TestCaseArgs {
    /// Test case key, e.g. SA-T10
    pub test_case_key: String,
}

pub struct ZephyrIntegration {
    client: ApiClient,
}

impl ZephyrIntegration {
    pub fn new(credentials: &ZephyrCredentials) -> McpResult<Self> {
        let base_url = credentials.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let client = ApiClient::new(base_url, AuthScheme::Bearer(credentials.api_token.clone()))?;
        Ok(Self { client })
    }
}

fn page_query(page: &PageArgs) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(max_results) = page.max_results {
        query.push(("maxResults", max_results.to_string()));
    }
    if let Some(start_at) = page.start_at {
        query.push(("startAt", start_at.to_string()));
    }
    query
}

impl Integration for ZephyrIntegration {
    fn product(&self) -> Product {
        Product::Zephyr
    }

    fn register(&self, registrar: &mut Registrar) -> McpResult<()> {
        let client = self.client.clone();
        registrar.tool(
            "list_zephyr_projects",
            "List the Jira projects Zephyr Scale is enabled for",
            move |args: PageArgs| {
                let client = client.clone();
                async move { client.get(&["projects"], &page_query(&args)).await }
            },
        );

        let client = self.client.clone();
        registrar.tool(
            "list_zephyr_test_cycles",
            "List Zephyr Scale test cycles",
            move |args: TestCyclesArgs| {
                let client = client.clone();
                async move {
                    let mut query = page_query(&args.page);
                    if let Some(project_key) = args.project_key {
                        query.push(("projectKey", project_key));
                    }
                    client.get(&["testcycles"], &query).await
                }
            },
        );

        let client = self.client.clone();
        registrar.tool(
            "get_zephyr_test_case",
            "Get one Zephyr Scale test case",
            move |args: TestCaseArgs| {
                let client = client.clone();
                async move {
                    client
                        .get(&["testcases", &args.test_case_key], &[])
                        .await
                }
            },
        );

        Ok(())
    }
}
