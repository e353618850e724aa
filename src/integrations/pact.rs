//! PactFlow and self-hosted Pact Broker
//!
//! Token credentials mean PactFlow, username/password a plain broker. The
//! integration also publishes a resource listing every tool of the gateway,
//! which is why it is constructed with a handle to the aggregate.

use crate::config::credentials::{PactAuth, PactClientType, PactCredentials};
use crate::core::protocol::ResourceDefinition;
use crate::core::{Integration, NoArguments, Product, Registrar, ServerHandle, WeakServerHandle};
use crate::integrations::http::{ApiClient, AuthScheme};
use crate::utils::errors::{McpError, McpResult};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CanIDeployArgs {
    /// Name of the pacticipant to deploy
    pub pacticipant: String,
    /// Version of the pacticipant
    pub version: String,
    /// Target environment
    pub environment: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProviderArgs {
    /// Provider name
    pub provider: String,
}

pub struct PactIntegration {
    client: ApiClient,
    client_type: PactClientType,
    server: WeakServerHandle,
}

impl PactIntegration {
    pub fn new(credentials: &PactCredentials, server: &ServerHandle) -> McpResult<Self> {
        let auth = match &credentials.auth {
            PactAuth::Token(token) => AuthScheme::Bearer(token.clone()),
            PactAuth::Basic { username, password } => AuthScheme::Basic {
                username: username.clone(),
                password: password.clone(),
            },
        };
        let client = ApiClient::new(&credentials.base_url, auth)?
            .with_header("Accept", "application/hal+json, application/json");
        Ok(Self {
            client,
            client_type: credentials.client_type(),
            server: server.downgrade(),
        })
    }

    pub fn client_type(&self) -> PactClientType {
        self.client_type
    }

    /// URI of the resource listing the gateway's tools.
    pub fn tools_resource_uri(&self) -> String {
        format!("{}://gateway/tools", self.client_type.scheme())
    }
}

impl Integration for PactIntegration {
    fn product(&self) -> Product {
        Product::Pact
    }

    fn register(&self, registrar: &mut Registrar) -> McpResult<()> {
        let client = self.client.clone();
        registrar.tool(
            "list_pacticipants",
            "List the pacticipants known to the broker",
            move |_: NoArguments| {
                let client = client.clone();
                async move { client.get(&["pacticipants"], &[]).await }
            },
        );

        let client = self.client.clone();
        registrar.tool(
            "can_i_deploy",
            "Check whether a pacticipant version is safe to deploy to an environment",
            move |args: CanIDeployArgs| {
                let client = client.clone();
                async move {
                    let query = [
                        ("pacticipant", args.pacticipant),
                        ("version", args.version),
                        ("environment", args.environment),
                    ];
                    client.get(&["can-i-deploy"], &query).await
                }
            },
        );

        let client = self.client.clone();
        registrar.tool(
            "list_provider_states",
            "List the provider states a provider must support",
            move |args: ProviderArgs| {
                let client = client.clone();
                async move {
                    client
                        .get(&["pacts", "provider", &args.provider, "provider-states"], &[])
                        .await
                }
            },
        );

        let server = self.server.clone();
        registrar.resource(
            ResourceDefinition {
                uri: self.tools_resource_uri(),
                name: "Gateway tools".to_string(),
                description: Some("Every tool exposed by this gateway, by product".to_string()),
                mime_type: Some("application/json".to_string()),
            },
            move || {
                let server = server.upgrade();
                async move {
                    let server = server.ok_or_else(|| {
                        McpError::InternalError("gateway is shutting down".to_string())
                    })?;
                    Ok(serde_json::to_string_pretty(&server.tool_summaries())?)
                }
            },
        );

        Ok(())
    }
}
