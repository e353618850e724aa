//! API Hub for Design portals

use crate::config::credentials::ApiHubCredentials;
use crate::core::{Integration, NoArguments, Product, Registrar};
use crate::integrations::http::{ApiClient, AuthScheme};
use crate::utils::errors::McpResult;
use schemars::JsonSchema;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.portal.swaggerhub.com/v1";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PortalArgs {
    /// Portal ID or subdomain
    pub portal_id: String,
}

pub struct ApiHubIntegration {
    client: ApiClient,
}

impl ApiHubIntegration {
    pub fn new(credentials: &ApiHubCredentials) -> McpResult<Self> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(credentials: &ApiHubCredentials, base_url: &str) -> McpResult<Self> {
        let client = ApiClient::new(base_url, AuthScheme::Bearer(credentials.api_key.clone()))?;
        Ok(Self { client })
    }
}

impl Integration for ApiHubIntegration {
    fn product(&self) -> Product {
        Product::ApiHub
    }

    fn register(&self, registrar: &mut Registrar) -> McpResult<()> {
        let client = self.client.clone();
        registrar.tool(
            "list_api_hub_portals",
            "List the API Hub portals the key can access",
            move |_: NoArguments| {
                let client = client.clone();
                async move { client.get(&["portals"], &[]).await }
            },
        );

        let client = self.client.clone();
        registrar.tool(
            "get_api_hub_portal",
            "Get one API Hub portal",
            move |args: PortalArgs| {
                let client = client.clone();
                async move { client.get(&["portals", &args.portal_id], &[]).await }
            },
        );

        let client = self.client.clone();
        registrar.tool(
            "list_api_hub_portal_products",
            "List the products published in an API Hub portal",
            move |args: PortalArgs| {
                let client = client.clone();
                async move {
                    client
                        .get(&["portals", &args.portal_id, "products"], &[])
                        .await
                }
            },
        );

        Ok(())
    }
}
